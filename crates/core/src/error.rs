//! Domain error model.

use thiserror::Error;

use crate::id::{ImageId, InstanceId, ModelId, ProjectId, TaskId};

/// Result type used across the domain layer.
pub type EboniteResult<T> = Result<T, EboniteError>;

/// Domain-level error.
///
/// Repository and client operations report every expected failure (missing
/// records, name clashes, records that still have dependents) through this
/// type. Infrastructure failures are folded into `Storage`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EboniteError {
    #[error("Project with id {0} does not exist")]
    NonExistingProject(ProjectId),

    #[error("Task with id {0} does not exist")]
    NonExistingTask(TaskId),

    #[error("Model with id {0} does not exist")]
    NonExistingModel(ModelId),

    #[error("Image with id {0} does not exist")]
    NonExistingImage(ImageId),

    #[error("Instance with id {0} does not exist")]
    NonExistingInstance(InstanceId),

    #[error("Project with name {0} already exists")]
    ExistingProject(String),

    #[error("Task with name {0} already exists")]
    ExistingTask(String),

    #[error("Model with name {0} already exists")]
    ExistingModel(String),

    #[error("Image with name {0} already exists")]
    ExistingImage(String),

    #[error("Instance with name {0} already exists")]
    ExistingInstance(String),

    #[error("Project {name} has {count} task(s); delete them first or use cascade")]
    ProjectWithTasks { name: String, count: usize },

    #[error("Task {name} has {count} model(s); delete them first or use cascade")]
    TaskWithModels { name: String, count: usize },

    #[error("Model {name} has {count} image(s); delete them first or use cascade")]
    ModelWithImages { name: String, count: usize },

    #[error("Image {name} has {count} instance(s); delete them first or use cascade")]
    ImageWithInstances { name: String, count: usize },

    /// The object (or the parent it references) has not been persisted yet.
    #[error("{0} is not bound to a repository")]
    UnboundObject(String),

    #[error("Artifacts for model with id {0} do not exist")]
    NonExistingArtifact(ModelId),

    #[error("Artifacts for model with id {0} already exist")]
    ExistingArtifact(ModelId),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Backend failure (database, filesystem).
    #[error("storage error: {0}")]
    Storage(String),
}

impl EboniteError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn unbound(what: impl Into<String>) -> Self {
        Self::UnboundObject(what.into())
    }

    /// True for the "record does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NonExistingProject(_)
                | Self::NonExistingTask(_)
                | Self::NonExistingModel(_)
                | Self::NonExistingImage(_)
                | Self::NonExistingInstance(_)
                | Self::NonExistingArtifact(_)
        )
    }
}

impl From<std::io::Error> for EboniteError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for EboniteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Storage(format!("serialization failed: {value}"))
    }
}
