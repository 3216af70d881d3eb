use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use ebonite_core::{
    EboniteError, EboniteResult, Entity, Image, ImageId, InstanceId, MetadataRepository, Model,
    ModelId, Project, ProjectId, RuntimeInstance, Task, TaskId,
};

use super::{Record, require_name, require_parent};

/// Rows of one entity kind, ordered by id.
#[derive(Debug)]
struct Table<E> {
    rows: BTreeMap<i64, E>,
    next_id: i64,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<E: Record> Table<E> {
    fn key(id: E::Id) -> i64 {
        id.into()
    }

    fn get(&self, id: E::Id) -> Option<E> {
        self.rows.get(&Self::key(id)).cloned()
    }

    fn contains(&self, id: E::Id) -> bool {
        self.rows.contains_key(&Self::key(id))
    }

    fn children_of(&self, parent: E::ParentId) -> Vec<E> {
        self.rows
            .values()
            .filter(|e| e.parent_id() == Some(parent))
            .cloned()
            .collect()
    }

    fn count_children(&self, parent: E::ParentId) -> usize {
        self.rows
            .values()
            .filter(|e| e.parent_id() == Some(parent))
            .count()
    }

    fn by_name(&self, parent: E::ParentId, name: &str) -> Option<E> {
        self.rows
            .values()
            .find(|e| e.parent_id() == Some(parent) && e.name() == name)
            .cloned()
    }

    fn insert(&mut self, mut record: E) -> EboniteResult<E> {
        require_name(&record)?;
        if record.id().is_some() {
            return Err(E::existing(record.name()));
        }
        let parent = require_parent(&record)?;
        if self.by_name(parent, record.name()).is_some() {
            return Err(E::existing(record.name()));
        }

        let id = self.next_id;
        self.next_id += 1;
        record.set_id(E::Id::from(id));
        self.rows.insert(id, record.clone());
        Ok(record)
    }

    fn update(&mut self, mut record: E) -> EboniteResult<E> {
        require_name(&record)?;
        let id = record.bound_id()?;
        let stored = self.get(id).ok_or_else(|| E::non_existing(id))?;
        let parent = require_parent(&record)?;

        if let Some(other) = self.by_name(parent, record.name()) {
            if other.id() != Some(id) {
                return Err(E::existing(record.name()));
            }
        }

        record.keep_stamp(&stored);
        self.rows.insert(Self::key(id), record.clone());
        Ok(record)
    }

    fn remove(&mut self, id: E::Id) -> EboniteResult<()> {
        self.rows
            .remove(&Self::key(id))
            .map(|_| ())
            .ok_or_else(|| E::non_existing(id))
    }
}

#[derive(Debug, Default)]
struct State {
    projects: Table<Project>,
    tasks: Table<Task>,
    models: Table<Model>,
    images: Table<Image>,
    instances: Table<RuntimeInstance>,
}

/// In-memory metadata repository.
///
/// Intended for tests/dev. All tables share one lock, so every operation sees
/// a consistent hierarchy.
#[derive(Debug, Default)]
pub struct InMemoryMetadataRepository {
    state: RwLock<State>,
}

impl InMemoryMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EboniteResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| EboniteError::storage("lock poisoned"))
    }

    fn write(&self) -> EboniteResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| EboniteError::storage("lock poisoned"))
    }
}

#[async_trait]
impl MetadataRepository for InMemoryMetadataRepository {
    async fn get_projects(&self) -> EboniteResult<Vec<Project>> {
        Ok(self.read()?.projects.children_of(()))
    }

    async fn get_project_by_id(&self, id: ProjectId) -> EboniteResult<Option<Project>> {
        Ok(self.read()?.projects.get(id))
    }

    async fn get_project_by_name(&self, name: &str) -> EboniteResult<Option<Project>> {
        Ok(self.read()?.projects.by_name((), name))
    }

    async fn create_project(&self, project: Project) -> EboniteResult<Project> {
        self.write()?.projects.insert(project)
    }

    async fn update_project(&self, project: Project) -> EboniteResult<Project> {
        self.write()?.projects.update(project)
    }

    async fn delete_project(&self, project: &Project) -> EboniteResult<()> {
        let id = project.bound_id()?;
        let mut state = self.write()?;
        if !state.projects.contains(id) {
            return Err(EboniteError::NonExistingProject(id));
        }
        let count = state.tasks.count_children(id);
        if count > 0 {
            return Err(EboniteError::ProjectWithTasks {
                name: project.name.clone(),
                count,
            });
        }
        state.projects.remove(id)
    }

    async fn get_tasks(&self, project_id: ProjectId) -> EboniteResult<Vec<Task>> {
        Ok(self.read()?.tasks.children_of(project_id))
    }

    async fn get_task_by_id(&self, id: TaskId) -> EboniteResult<Option<Task>> {
        Ok(self.read()?.tasks.get(id))
    }

    async fn get_task_by_name(&self, project_id: ProjectId, name: &str) -> EboniteResult<Option<Task>> {
        Ok(self.read()?.tasks.by_name(project_id, name))
    }

    async fn create_task(&self, task: Task) -> EboniteResult<Task> {
        let mut state = self.write()?;
        let project_id = require_parent(&task)?;
        if !state.projects.contains(project_id) {
            return Err(EboniteError::NonExistingProject(project_id));
        }
        state.tasks.insert(task)
    }

    async fn update_task(&self, task: Task) -> EboniteResult<Task> {
        let mut state = self.write()?;
        let project_id = require_parent(&task)?;
        let id = task.bound_id()?;
        if !state.tasks.contains(id) {
            return Err(EboniteError::NonExistingTask(id));
        }
        if !state.projects.contains(project_id) {
            return Err(EboniteError::NonExistingProject(project_id));
        }
        state.tasks.update(task)
    }

    async fn delete_task(&self, task: &Task) -> EboniteResult<()> {
        let id = task.bound_id()?;
        let mut state = self.write()?;
        if !state.tasks.contains(id) {
            return Err(EboniteError::NonExistingTask(id));
        }
        let count = state.models.count_children(id);
        if count > 0 {
            return Err(EboniteError::TaskWithModels {
                name: task.name.clone(),
                count,
            });
        }
        state.tasks.remove(id)
    }

    async fn get_models(&self, task_id: TaskId) -> EboniteResult<Vec<Model>> {
        Ok(self.read()?.models.children_of(task_id))
    }

    async fn get_model_by_id(&self, id: ModelId) -> EboniteResult<Option<Model>> {
        Ok(self.read()?.models.get(id))
    }

    async fn get_model_by_name(&self, task_id: TaskId, name: &str) -> EboniteResult<Option<Model>> {
        Ok(self.read()?.models.by_name(task_id, name))
    }

    async fn create_model(&self, model: Model) -> EboniteResult<Model> {
        let mut state = self.write()?;
        let task_id = require_parent(&model)?;
        if !state.tasks.contains(task_id) {
            return Err(EboniteError::NonExistingTask(task_id));
        }
        state.models.insert(model)
    }

    async fn update_model(&self, model: Model) -> EboniteResult<Model> {
        let mut state = self.write()?;
        let task_id = require_parent(&model)?;
        let id = model.bound_id()?;
        if !state.models.contains(id) {
            return Err(EboniteError::NonExistingModel(id));
        }
        if !state.tasks.contains(task_id) {
            return Err(EboniteError::NonExistingTask(task_id));
        }
        state.models.update(model)
    }

    async fn delete_model(&self, model: &Model) -> EboniteResult<()> {
        let id = model.bound_id()?;
        let mut state = self.write()?;
        if !state.models.contains(id) {
            return Err(EboniteError::NonExistingModel(id));
        }
        let count = state.images.count_children(id);
        if count > 0 {
            return Err(EboniteError::ModelWithImages {
                name: model.name.clone(),
                count,
            });
        }
        state.models.remove(id)
    }

    async fn get_images(&self, model_id: ModelId) -> EboniteResult<Vec<Image>> {
        Ok(self.read()?.images.children_of(model_id))
    }

    async fn get_image_by_id(&self, id: ImageId) -> EboniteResult<Option<Image>> {
        Ok(self.read()?.images.get(id))
    }

    async fn get_image_by_name(&self, model_id: ModelId, name: &str) -> EboniteResult<Option<Image>> {
        Ok(self.read()?.images.by_name(model_id, name))
    }

    async fn create_image(&self, image: Image) -> EboniteResult<Image> {
        let mut state = self.write()?;
        let model_id = require_parent(&image)?;
        if !state.models.contains(model_id) {
            return Err(EboniteError::NonExistingModel(model_id));
        }
        state.images.insert(image)
    }

    async fn update_image(&self, image: Image) -> EboniteResult<Image> {
        let mut state = self.write()?;
        let model_id = require_parent(&image)?;
        let id = image.bound_id()?;
        if !state.images.contains(id) {
            return Err(EboniteError::NonExistingImage(id));
        }
        if !state.models.contains(model_id) {
            return Err(EboniteError::NonExistingModel(model_id));
        }
        state.images.update(image)
    }

    async fn delete_image(&self, image: &Image) -> EboniteResult<()> {
        let id = image.bound_id()?;
        let mut state = self.write()?;
        if !state.images.contains(id) {
            return Err(EboniteError::NonExistingImage(id));
        }
        let count = state.instances.count_children(id);
        if count > 0 {
            return Err(EboniteError::ImageWithInstances {
                name: image.name.clone(),
                count,
            });
        }
        state.images.remove(id)
    }

    async fn get_instances(&self, image_id: ImageId) -> EboniteResult<Vec<RuntimeInstance>> {
        Ok(self.read()?.instances.children_of(image_id))
    }

    async fn get_instance_by_id(&self, id: InstanceId) -> EboniteResult<Option<RuntimeInstance>> {
        Ok(self.read()?.instances.get(id))
    }

    async fn get_instance_by_name(
        &self,
        image_id: ImageId,
        name: &str,
    ) -> EboniteResult<Option<RuntimeInstance>> {
        Ok(self.read()?.instances.by_name(image_id, name))
    }

    async fn create_instance(&self, instance: RuntimeInstance) -> EboniteResult<RuntimeInstance> {
        let mut state = self.write()?;
        let image_id = require_parent(&instance)?;
        if !state.images.contains(image_id) {
            return Err(EboniteError::NonExistingImage(image_id));
        }
        state.instances.insert(instance)
    }

    async fn delete_instance(&self, instance: &RuntimeInstance) -> EboniteResult<()> {
        let id = instance.bound_id()?;
        self.write()?.instances.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryMetadataRepository, Project, Task) {
        let repo = InMemoryMetadataRepository::new();
        let project = repo.create_project(Project::new("proj")).await.unwrap();
        let task = repo
            .create_task(Task::new("task").with_project(project.id.unwrap()))
            .await
            .unwrap();
        (repo, project, task)
    }

    fn model(name: &str, task: &Task) -> Model {
        Model::new(
            name,
            ebonite_core::WrapperMeta {
                type_name: "test".into(),
                methods: vec!["predict".into()],
            },
            ebonite_core::DatasetType::Null,
        )
        .with_task(task.id.unwrap())
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = InMemoryMetadataRepository::new();
        let a = repo.create_project(Project::new("a")).await.unwrap();
        let b = repo.create_project(Project::new("b")).await.unwrap();
        assert_eq!(a.id, Some(ProjectId::new(1)));
        assert_eq!(b.id, Some(ProjectId::new(2)));
        assert_eq!(repo.get_projects().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_sibling_name_is_rejected() {
        let (repo, project, _task) = seeded().await;
        let err = repo
            .create_task(Task::new("task").with_project(project.id.unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err, EboniteError::ExistingTask("task".into()));
    }

    #[tokio::test]
    async fn same_name_under_different_parents_is_allowed() {
        let (repo, _project, task) = seeded().await;
        let other = repo.create_project(Project::new("other")).await.unwrap();
        repo.create_task(Task::new("task").with_project(other.id.unwrap()))
            .await
            .unwrap();
        assert!(repo.create_model(model("m", &task)).await.is_ok());
    }

    #[tokio::test]
    async fn create_requires_existing_bound_parent() {
        let repo = InMemoryMetadataRepository::new();
        let err = repo.create_task(Task::new("t")).await.unwrap_err();
        assert!(matches!(err, EboniteError::UnboundObject(_)));

        let err = repo
            .create_task(Task::new("t").with_project(ProjectId::new(99)))
            .await
            .unwrap_err();
        assert_eq!(err, EboniteError::NonExistingProject(ProjectId::new(99)));
    }

    #[tokio::test]
    async fn creating_a_bound_record_is_rejected() {
        let (repo, project, _task) = seeded().await;
        let err = repo.create_project(project).await.unwrap_err();
        assert_eq!(err, EboniteError::ExistingProject("proj".into()));
    }

    #[tokio::test]
    async fn blank_names_are_rejected_on_create_and_update() {
        let (repo, _project, task) = seeded().await;
        let err = repo.create_project(Project::new(" ")).await.unwrap_err();
        assert!(matches!(err, EboniteError::Validation(_)));

        let mut renamed = task.clone();
        renamed.name = String::new();
        let err = repo.update_task(renamed).await.unwrap_err();
        assert!(matches!(err, EboniteError::Validation(_)));
        assert_eq!(repo.get_task_by_id(task.id.unwrap()).await.unwrap().unwrap().name, "task");
    }

    #[tokio::test]
    async fn update_keeps_stamp_and_checks_existence() {
        let (repo, _project, task) = seeded().await;
        let created = repo.create_model(model("m", &task)).await.unwrap();

        let mut changed = created.clone();
        changed.name = "renamed".into();
        changed.author = "someone-else".into();
        let updated = repo.update_model(changed).await.unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.author, created.author);

        let mut ghost = created.clone();
        ghost.id = Some(ModelId::new(1234));
        let err = repo.update_model(ghost).await.unwrap_err();
        assert_eq!(err, EboniteError::NonExistingModel(ModelId::new(1234)));
    }

    #[tokio::test]
    async fn update_rejects_missing_parent_and_name_clash() {
        let (repo, _project, task) = seeded().await;
        let m1 = repo.create_model(model("m1", &task)).await.unwrap();
        repo.create_model(model("m2", &task)).await.unwrap();

        let mut clash = m1.clone();
        clash.name = "m2".into();
        assert_eq!(
            repo.update_model(clash).await.unwrap_err(),
            EboniteError::ExistingModel("m2".into())
        );

        let mut moved = m1.clone();
        moved.task_id = Some(TaskId::new(77));
        assert_eq!(
            repo.update_model(moved).await.unwrap_err(),
            EboniteError::NonExistingTask(TaskId::new(77))
        );
    }

    #[tokio::test]
    async fn delete_refuses_records_with_children() {
        let (repo, project, task) = seeded().await;
        let m = repo.create_model(model("m", &task)).await.unwrap();
        let image = repo
            .create_image(Image::new("img").with_model(m.id.unwrap()))
            .await
            .unwrap();
        repo.create_instance(RuntimeInstance::new("inst").with_image(image.id.unwrap()))
            .await
            .unwrap();

        assert!(matches!(
            repo.delete_project(&project).await.unwrap_err(),
            EboniteError::ProjectWithTasks { count: 1, .. }
        ));
        assert!(matches!(
            repo.delete_task(&task).await.unwrap_err(),
            EboniteError::TaskWithModels { count: 1, .. }
        ));
        assert!(matches!(
            repo.delete_model(&m).await.unwrap_err(),
            EboniteError::ModelWithImages { count: 1, .. }
        ));
        assert!(matches!(
            repo.delete_image(&image).await.unwrap_err(),
            EboniteError::ImageWithInstances { count: 1, .. }
        ));
    }

    #[tokio::test]
    async fn delete_removes_leaf_and_reports_missing() {
        let (repo, _project, task) = seeded().await;
        let m = repo.create_model(model("m", &task)).await.unwrap();
        repo.delete_model(&m).await.unwrap();
        assert!(repo.get_model_by_id(m.id.unwrap()).await.unwrap().is_none());
        assert_eq!(
            repo.delete_model(&m).await.unwrap_err(),
            EboniteError::NonExistingModel(m.id.unwrap())
        );
    }
}
