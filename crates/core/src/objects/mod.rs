//! Metadata records of the project hierarchy:
//! `Project -> Task -> Model -> Image -> RuntimeInstance`.
//!
//! Records are plain data. Children are not embedded in their parents; they
//! reference the parent by id and are looked up through the repository.

/// Implements `Entity` for a record with `id`, `name` and a parent field.
macro_rules! impl_entity {
    ($t:ty, $id:ty, $kind:literal, parent: $parent_field:ident: $parent:ty) => {
        impl crate::entity::Entity for $t {
            type Id = $id;
            type ParentId = $parent;
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<Self::Id> {
                self.id
            }

            fn set_id(&mut self, id: Self::Id) {
                self.id = Some(id);
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn parent_id(&self) -> Option<Self::ParentId> {
                self.$parent_field
            }
        }
    };
}

pub(crate) use impl_entity;

mod image;
mod instance;
mod model;
mod project;
mod task;

pub use image::Image;
pub use instance::RuntimeInstance;
pub use model::Model;
pub use project::Project;
pub use task::Task;

/// Name of the current OS user, recorded as the author of new records.
pub fn current_author() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
