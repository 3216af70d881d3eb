//! `ebonite-client`: high-level operations over the metadata and artifact
//! repositories.
//!
//! `Ebonite` owns both repositories and implements everything that spans more
//! than one record: pushing a model together with its artifacts, building
//! images, and cascading deletes down the project hierarchy.

pub mod helpers;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use ebonite_core::{
    ArtifactRepository, Blobs, EboniteError, EboniteResult, Entity, Image, MetadataRepository, Model,
    ModelObject, Project, Task,
};
use ebonite_infra::artifact_repo::InMemoryArtifactRepository;
use ebonite_infra::meta_repo::InMemoryMetadataRepository;

/// Entry point for managing models, their artifacts and images.
#[derive(Clone)]
pub struct Ebonite {
    meta_repo: Arc<dyn MetadataRepository>,
    artifact_repo: Arc<dyn ArtifactRepository>,
}

impl Ebonite {
    pub fn new(meta_repo: Arc<dyn MetadataRepository>, artifact_repo: Arc<dyn ArtifactRepository>) -> Self {
        Self {
            meta_repo,
            artifact_repo,
        }
    }

    /// Client backed by in-memory repositories.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryMetadataRepository::new()),
            Arc::new(InMemoryArtifactRepository::new()),
        )
    }

    pub fn meta_repo(&self) -> &Arc<dyn MetadataRepository> {
        &self.meta_repo
    }

    pub fn artifact_repo(&self) -> &Arc<dyn ArtifactRepository> {
        &self.artifact_repo
    }

    pub async fn get_or_create_project(&self, name: &str) -> EboniteResult<Project> {
        if let Some(project) = self.meta_repo.get_project_by_name(name).await? {
            return Ok(project);
        }
        let project = self.meta_repo.create_project(Project::new(name)).await?;
        tracing::info!(project = %project.name, "project created");
        Ok(project)
    }

    pub async fn get_or_create_task(&self, project_name: &str, task_name: &str) -> EboniteResult<Task> {
        let project = self.get_or_create_project(project_name).await?;
        let project_id = project.bound_id()?;
        if let Some(task) = self.meta_repo.get_task_by_name(project_id, task_name).await? {
            return Ok(task);
        }
        let task = self
            .meta_repo
            .create_task(Task::new(task_name).with_project(project_id))
            .await?;
        tracing::info!(project = %project.name, task = %task.name, "task created");
        Ok(task)
    }

    /// Register `model` under `task` and persist its pending artifacts.
    ///
    /// If storing the artifacts fails, the model record is removed again and
    /// the artifact error is returned.
    pub async fn push_model(&self, mut model: Model, task: &Task) -> EboniteResult<Model> {
        let task_id = task.bound_id()?;
        let blobs = model.take_unpersisted_artifacts();
        model.task_id = Some(task_id);

        let mut model = self.meta_repo.create_model(model).await?;
        let model_id = model.bound_id()?;

        if let Some(blobs) = blobs {
            let reference = match self.artifact_repo.push_artifacts(model_id, blobs).await {
                Ok(reference) => reference,
                Err(err) => {
                    self.rollback_model(&model).await;
                    return Err(err);
                }
            };
            model.artifact = Some(reference);
            model = match self.meta_repo.update_model(model.clone()).await {
                Ok(updated) => updated,
                Err(err) => {
                    if let Err(cleanup) = self.artifact_repo.delete_artifacts(model_id).await {
                        tracing::warn!(%model_id, error = %cleanup, "failed to remove artifacts during rollback");
                    }
                    self.rollback_model(&model).await;
                    return Err(err);
                }
            };
        }

        tracing::info!(%model_id, model = %model.name, %task_id, "model pushed");
        Ok(model)
    }

    async fn rollback_model(&self, model: &Model) {
        if let Err(err) = self.meta_repo.delete_model(model).await {
            tracing::warn!(model = %model.name, error = %err, "failed to remove model record during rollback");
        }
    }

    /// Wrap `model_object` into a `Model` and push it to `project`/`task`,
    /// creating both if needed.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_model(
        &self,
        model_object: &dyn ModelObject,
        input_data: &Value,
        model_name: Option<&str>,
        params: Option<BTreeMap<String, Value>>,
        description: Option<&str>,
        project_name: &str,
        task_name: &str,
    ) -> EboniteResult<Model> {
        let model = helpers::create_model(model_object, input_data, model_name, params, description)?;
        let task = self.get_or_create_task(project_name, task_name).await?;
        self.push_model(model, &task).await
    }

    /// Register an image for `model`. Only the metadata record is created.
    pub async fn build_image(&self, name: &str, model: &Model) -> EboniteResult<Image> {
        let model_id = model.bound_id()?;
        if self.meta_repo.get_model_by_id(model_id).await?.is_none() {
            return Err(EboniteError::NonExistingModel(model_id));
        }
        if self.meta_repo.get_image_by_name(model_id, name).await?.is_some() {
            return Err(EboniteError::ExistingImage(name.to_string()));
        }
        let image = self
            .meta_repo
            .create_image(Image::new(name).with_model(model_id))
            .await?;
        tracing::info!(image = %image.name, %model_id, "image built");
        Ok(image)
    }

    pub async fn delete_image(&self, image: &Image, cascade: bool) -> EboniteResult<()> {
        let image_id = image.bound_id()?;
        let instances = self.meta_repo.get_instances(image_id).await?;
        if !instances.is_empty() && !cascade {
            return Err(EboniteError::ImageWithInstances {
                name: image.name.clone(),
                count: instances.len(),
            });
        }
        for instance in &instances {
            self.meta_repo.delete_instance(instance).await?;
        }
        self.meta_repo.delete_image(image).await?;
        tracing::info!(%image_id, instances = instances.len(), "image deleted");
        Ok(())
    }

    /// Delete a model, its artifacts and (with `cascade`) its images.
    pub async fn delete_model(&self, model: &Model, cascade: bool) -> EboniteResult<()> {
        let model_id = model.bound_id()?;
        if self.meta_repo.get_model_by_id(model_id).await?.is_none() {
            return Err(EboniteError::NonExistingModel(model_id));
        }
        let images = self.meta_repo.get_images(model_id).await?;
        if !images.is_empty() && !cascade {
            return Err(EboniteError::ModelWithImages {
                name: model.name.clone(),
                count: images.len(),
            });
        }
        for image in &images {
            self.delete_image(image, true).await?;
        }

        match self.artifact_repo.delete_artifacts(model_id).await {
            Ok(()) | Err(EboniteError::NonExistingArtifact(_)) => {}
            Err(err) => return Err(err),
        }
        self.meta_repo.delete_model(model).await?;
        tracing::info!(%model_id, images = images.len(), "model deleted");
        Ok(())
    }

    pub async fn delete_task(&self, task: &Task, cascade: bool) -> EboniteResult<()> {
        let task_id = task.bound_id()?;
        let models = self.meta_repo.get_models(task_id).await?;
        if !models.is_empty() && !cascade {
            return Err(EboniteError::TaskWithModels {
                name: task.name.clone(),
                count: models.len(),
            });
        }
        for model in &models {
            self.delete_model(model, true).await?;
        }
        self.meta_repo.delete_task(task).await?;
        tracing::info!(%task_id, models = models.len(), "task deleted");
        Ok(())
    }

    pub async fn delete_project(&self, project: &Project, cascade: bool) -> EboniteResult<()> {
        let project_id = project.bound_id()?;
        let tasks = self.meta_repo.get_tasks(project_id).await?;
        if !tasks.is_empty() && !cascade {
            return Err(EboniteError::ProjectWithTasks {
                name: project.name.clone(),
                count: tasks.len(),
            });
        }
        for task in &tasks {
            self.delete_task(task, true).await?;
        }
        self.meta_repo.delete_project(project).await?;
        tracing::info!(%project_id, tasks = tasks.len(), "project deleted");
        Ok(())
    }

    pub async fn get_model_artifacts(&self, model: &Model) -> EboniteResult<Blobs> {
        self.artifact_repo.get_artifacts(model.bound_id()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ebonite_core::{ArtifactRef, Blob, ModelId, RuntimeInstance};
    use serde_json::json;

    struct Linear;

    impl ModelObject for Linear {
        fn type_name(&self) -> String {
            "demo::Linear".to_string()
        }

        fn dump(&self) -> EboniteResult<Blobs> {
            let mut blobs = Blobs::new();
            blobs.insert("coef.json".into(), Blob::in_memory(b"[0.5, 1.0]".to_vec()));
            Ok(blobs)
        }
    }

    struct Stateless;

    impl ModelObject for Stateless {
        fn type_name(&self) -> String {
            "demo::Stateless".to_string()
        }

        fn dump(&self) -> EboniteResult<Blobs> {
            Ok(Blobs::new())
        }
    }

    struct BrokenArtifacts;

    #[async_trait]
    impl ArtifactRepository for BrokenArtifacts {
        async fn push_artifacts(&self, _: ModelId, _: Blobs) -> EboniteResult<ArtifactRef> {
            Err(EboniteError::storage("disk full"))
        }

        async fn get_artifacts(&self, model_id: ModelId) -> EboniteResult<Blobs> {
            Err(EboniteError::NonExistingArtifact(model_id))
        }

        async fn delete_artifacts(&self, model_id: ModelId) -> EboniteResult<()> {
            Err(EboniteError::NonExistingArtifact(model_id))
        }
    }

    async fn pushed(ebnt: &Ebonite, name: &str) -> Model {
        ebnt.create_model(&Linear, &json!([1.0, 2.0]), Some(name), None, None, "proj", "task")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let ebnt = Ebonite::in_memory();
        let first = ebnt.get_or_create_task("proj", "task").await.unwrap();
        let second = ebnt.get_or_create_task("proj", "task").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(ebnt.meta_repo().get_projects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_model_persists_record_and_artifacts() {
        let ebnt = Ebonite::in_memory();
        let model = pushed(&ebnt, "linear").await;

        assert!(model.id.is_some());
        assert!(!model.has_unpersisted_artifacts());
        assert_eq!(model.artifact.as_ref().unwrap().blobs, vec!["coef.json".to_string()]);

        let stored = ebnt.meta_repo().get_model_by_id(model.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.artifact, model.artifact);

        let blobs = ebnt.get_model_artifacts(&model).await.unwrap();
        assert_eq!(blobs["coef.json"].bytes().await.unwrap(), b"[0.5, 1.0]");
    }

    #[tokio::test]
    async fn pushing_same_name_twice_is_existing_model() {
        let ebnt = Ebonite::in_memory();
        pushed(&ebnt, "linear").await;
        let err = ebnt
            .create_model(&Linear, &json!([1.0]), Some("linear"), None, None, "proj", "task")
            .await
            .unwrap_err();
        assert_eq!(err, EboniteError::ExistingModel("linear".into()));
    }

    #[tokio::test]
    async fn failed_artifact_push_removes_model_record() {
        let ebnt = Ebonite::new(Arc::new(InMemoryMetadataRepository::new()), Arc::new(BrokenArtifacts));
        let err = ebnt
            .create_model(&Linear, &json!([1.0]), Some("linear"), None, None, "proj", "task")
            .await
            .unwrap_err();
        assert!(matches!(err, EboniteError::Storage(_)));

        let task = ebnt.get_or_create_task("proj", "task").await.unwrap();
        assert!(ebnt.meta_repo().get_models(task.id.unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn build_image_rejects_duplicate_and_unbound_model() {
        let ebnt = Ebonite::in_memory();
        let model = pushed(&ebnt, "linear").await;

        let image = ebnt.build_image("img", &model).await.unwrap();
        assert_eq!(image.model_id, model.id);

        let err = ebnt.build_image("img", &model).await.unwrap_err();
        assert_eq!(err, EboniteError::ExistingImage("img".into()));

        let unbound = helpers::create_model(&Linear, &json!([1]), Some("x"), None, None).unwrap();
        let err = ebnt.build_image("img", &unbound).await.unwrap_err();
        assert!(matches!(err, EboniteError::UnboundObject(_)));
    }

    #[tokio::test]
    async fn stateless_model_round_trips_with_no_blobs() {
        let ebnt = Ebonite::in_memory();
        let model = ebnt
            .create_model(&Stateless, &json!([1]), Some("noop"), None, None, "proj", "task")
            .await
            .unwrap();

        assert_eq!(model.artifact.as_ref().unwrap().blobs, Vec::<String>::new());
        assert!(ebnt.get_model_artifacts(&model).await.unwrap().is_empty());
        ebnt.delete_model(&model, false).await.unwrap();
    }

    #[tokio::test]
    async fn build_image_rejects_blank_name() {
        let ebnt = Ebonite::in_memory();
        let model = pushed(&ebnt, "linear").await;

        let err = ebnt.build_image("", &model).await.unwrap_err();
        assert!(matches!(err, EboniteError::Validation(_)));
        assert!(ebnt.meta_repo().get_images(model.id.unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_image_respects_cascade_flag() {
        let ebnt = Ebonite::in_memory();
        let model = pushed(&ebnt, "linear").await;
        let image = ebnt.build_image("img", &model).await.unwrap();
        ebnt.meta_repo()
            .create_instance(RuntimeInstance::new("inst").with_image(image.id.unwrap()))
            .await
            .unwrap();

        let err = ebnt.delete_image(&image, false).await.unwrap_err();
        assert!(matches!(err, EboniteError::ImageWithInstances { count: 1, .. }));

        ebnt.delete_image(&image, true).await.unwrap();
        assert!(ebnt.meta_repo().get_image_by_id(image.id.unwrap()).await.unwrap().is_none());
        assert!(ebnt.meta_repo().get_instances(image.id.unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_model_cascades_to_images_and_artifacts() {
        let ebnt = Ebonite::in_memory();
        let model = pushed(&ebnt, "linear").await;
        ebnt.build_image("img", &model).await.unwrap();

        let err = ebnt.delete_model(&model, false).await.unwrap_err();
        assert!(matches!(err, EboniteError::ModelWithImages { count: 1, .. }));

        ebnt.delete_model(&model, true).await.unwrap();
        let model_id = model.id.unwrap();
        assert!(ebnt.meta_repo().get_model_by_id(model_id).await.unwrap().is_none());
        assert_eq!(
            ebnt.get_model_artifacts(&model).await.unwrap_err(),
            EboniteError::NonExistingArtifact(model_id)
        );
    }

    #[tokio::test]
    async fn delete_model_without_artifacts_succeeds() {
        let ebnt = Ebonite::in_memory();
        let task = ebnt.get_or_create_task("proj", "task").await.unwrap();
        let bare = Model::new("bare", Linear.wrapper_meta(), ebonite_core::DatasetType::Null);
        let model = ebnt.push_model(bare, &task).await.unwrap();
        assert!(model.artifact.is_none());

        ebnt.delete_model(&model, false).await.unwrap();
    }

    #[tokio::test]
    async fn delete_project_cascades_through_hierarchy() {
        let ebnt = Ebonite::in_memory();
        let model = pushed(&ebnt, "linear").await;
        ebnt.build_image("img", &model).await.unwrap();
        let project = ebnt.get_or_create_project("proj").await.unwrap();

        let err = ebnt.delete_project(&project, false).await.unwrap_err();
        assert!(matches!(err, EboniteError::ProjectWithTasks { count: 1, .. }));

        ebnt.delete_project(&project, true).await.unwrap();
        assert!(ebnt.meta_repo().get_projects().await.unwrap().is_empty());
        assert!(ebnt.meta_repo().get_model_by_id(model.id.unwrap()).await.unwrap().is_none());
    }
}
