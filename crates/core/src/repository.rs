//! Storage boundaries: the metadata repository (entity records) and the
//! artifact repository (model blobs).
//!
//! ## Metadata semantics
//!
//! Every backend must behave identically:
//!
//! - **create**: the parent reference must be bound (`UnboundObject`) and
//!   exist (`NonExisting*` for the parent); a sibling with the same name yields
//!   `Existing*`; creating an already-bound record yields `Existing*`. The
//!   repository assigns the id.
//! - **update**: the record must be bound and exist (`NonExisting*`); the
//!   (possibly new) parent must exist; renaming onto a sibling's name yields
//!   `Existing*`. `author` and `creation_date` are kept from the stored record.
//! - **delete**: the record must exist; a record that still has children
//!   yields the matching `*With*` error. Repositories never cascade; that is
//!   the client's job.

use async_trait::async_trait;

use crate::artifact::{ArtifactRef, Blobs};
use crate::error::EboniteResult;
use crate::id::{ImageId, InstanceId, ModelId, ProjectId, TaskId};
use crate::objects::{Image, Model, Project, RuntimeInstance, Task};

/// Store of entity metadata.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    // projects
    async fn get_projects(&self) -> EboniteResult<Vec<Project>>;
    async fn get_project_by_id(&self, id: ProjectId) -> EboniteResult<Option<Project>>;
    async fn get_project_by_name(&self, name: &str) -> EboniteResult<Option<Project>>;
    async fn create_project(&self, project: Project) -> EboniteResult<Project>;
    async fn update_project(&self, project: Project) -> EboniteResult<Project>;
    async fn delete_project(&self, project: &Project) -> EboniteResult<()>;

    // tasks
    async fn get_tasks(&self, project_id: ProjectId) -> EboniteResult<Vec<Task>>;
    async fn get_task_by_id(&self, id: TaskId) -> EboniteResult<Option<Task>>;
    async fn get_task_by_name(&self, project_id: ProjectId, name: &str) -> EboniteResult<Option<Task>>;
    async fn create_task(&self, task: Task) -> EboniteResult<Task>;
    async fn update_task(&self, task: Task) -> EboniteResult<Task>;
    async fn delete_task(&self, task: &Task) -> EboniteResult<()>;

    // models
    async fn get_models(&self, task_id: TaskId) -> EboniteResult<Vec<Model>>;
    async fn get_model_by_id(&self, id: ModelId) -> EboniteResult<Option<Model>>;
    async fn get_model_by_name(&self, task_id: TaskId, name: &str) -> EboniteResult<Option<Model>>;
    async fn create_model(&self, model: Model) -> EboniteResult<Model>;
    async fn update_model(&self, model: Model) -> EboniteResult<Model>;
    async fn delete_model(&self, model: &Model) -> EboniteResult<()>;

    // images
    async fn get_images(&self, model_id: ModelId) -> EboniteResult<Vec<Image>>;
    async fn get_image_by_id(&self, id: ImageId) -> EboniteResult<Option<Image>>;
    async fn get_image_by_name(&self, model_id: ModelId, name: &str) -> EboniteResult<Option<Image>>;
    async fn create_image(&self, image: Image) -> EboniteResult<Image>;
    async fn update_image(&self, image: Image) -> EboniteResult<Image>;
    async fn delete_image(&self, image: &Image) -> EboniteResult<()>;

    // runtime instances
    async fn get_instances(&self, image_id: ImageId) -> EboniteResult<Vec<RuntimeInstance>>;
    async fn get_instance_by_id(&self, id: InstanceId) -> EboniteResult<Option<RuntimeInstance>>;
    async fn get_instance_by_name(
        &self,
        image_id: ImageId,
        name: &str,
    ) -> EboniteResult<Option<RuntimeInstance>>;
    async fn create_instance(&self, instance: RuntimeInstance) -> EboniteResult<RuntimeInstance>;
    async fn delete_instance(&self, instance: &RuntimeInstance) -> EboniteResult<()>;
}

/// Blob store for serialized model artifacts, keyed by model id.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Persist the blobs of a model. Fails with `ExistingArtifact` if the model
    /// already has artifacts.
    async fn push_artifacts(&self, model_id: ModelId, blobs: Blobs) -> EboniteResult<ArtifactRef>;

    /// Fails with `NonExistingArtifact` if nothing was pushed for the model.
    async fn get_artifacts(&self, model_id: ModelId) -> EboniteResult<Blobs>;

    /// Fails with `NonExistingArtifact` if nothing was pushed for the model.
    async fn delete_artifacts(&self, model_id: ModelId) -> EboniteResult<()>;
}
