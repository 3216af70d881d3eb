//! `ebonite-core`: domain foundation for model metadata management.
//!
//! This crate contains the entity records (projects, tasks, models, images,
//! runtime instances), the repository boundaries they are persisted through,
//! and the `ModelObject` seam that turns arbitrary model objects into `Model`s.
//! No storage backend lives here.

pub mod artifact;
pub mod dataset;
pub mod entity;
pub mod error;
pub mod id;
pub mod model_object;
pub mod objects;
pub mod repository;

pub use artifact::{ArtifactRef, Blob, Blobs};
pub use dataset::{DatasetType, PrimitiveKind};
pub use entity::Entity;
pub use error::{EboniteError, EboniteResult};
pub use id::{ImageId, InstanceId, ModelId, ProjectId, TaskId};
pub use model_object::{ModelObject, Requirement, WrapperMeta};
pub use objects::{Image, Model, Project, RuntimeInstance, Task};
pub use repository::{ArtifactRepository, MetadataRepository};
