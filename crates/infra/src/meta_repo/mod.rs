//! Metadata repository backends.
//!
//! Both backends implement `ebonite_core::MetadataRepository` with identical
//! semantics; `InMemoryMetadataRepository` is intended for tests/dev,
//! `PostgresMetadataRepository` for persistent deployments.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryMetadataRepository;
pub use postgres::PostgresMetadataRepository;

use ebonite_core::{EboniteError, Entity, Image, Model, Project, RuntimeInstance, Task};

/// Per-kind error constructors and update rules shared by the backends.
pub(crate) trait Record: Entity {
    fn existing(name: &str) -> EboniteError;

    fn non_existing(id: Self::Id) -> EboniteError;

    /// Carry over fields an update must not change.
    fn keep_stamp(&mut self, stored: &Self);
}

macro_rules! impl_record {
    ($t:ty, $existing:ident, $non_existing:ident) => {
        impl Record for $t {
            fn existing(name: &str) -> EboniteError {
                EboniteError::$existing(name.to_string())
            }

            fn non_existing(id: Self::Id) -> EboniteError {
                EboniteError::$non_existing(id)
            }

            fn keep_stamp(&mut self, stored: &Self) {
                self.author = stored.author.clone();
                self.creation_date = stored.creation_date;
            }
        }
    };
}

impl_record!(Project, ExistingProject, NonExistingProject);
impl_record!(Task, ExistingTask, NonExistingTask);
impl_record!(Model, ExistingModel, NonExistingModel);
impl_record!(Image, ExistingImage, NonExistingImage);
impl_record!(RuntimeInstance, ExistingInstance, NonExistingInstance);

/// Parent id of a record, or `UnboundObject` if the record has no bound parent.
pub(crate) fn require_parent<E: Entity>(record: &E) -> Result<E::ParentId, EboniteError> {
    record.parent_id().ok_or_else(|| {
        EboniteError::unbound(format!("parent of {} '{}'", E::KIND, record.name()))
    })
}

/// Names identify a record among its siblings, so they must not be blank.
pub(crate) fn require_name<E: Entity>(record: &E) -> Result<(), EboniteError> {
    if record.name().trim().is_empty() {
        return Err(EboniteError::validation(format!("{} name must not be empty", E::KIND)));
    }
    Ok(())
}
