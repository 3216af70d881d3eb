//! Entity trait: identity + position in the project hierarchy.

use crate::error::{EboniteError, EboniteResult};

/// Entity marker + minimal interface shared by all metadata records.
///
/// Every entity lives under exactly one parent (projects live under `()`), and
/// names are unique among siblings.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Copy
        + Eq
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + From<i64>
        + Into<i64>
        + Send
        + Sync;

    /// Identifier of the parent record.
    type ParentId: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Human-readable kind, used in messages ("Model", "Image", ...).
    const KIND: &'static str;

    /// Returns the identifier, or `None` while the entity is unbound.
    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    fn name(&self) -> &str;

    /// Returns the parent identifier, or `None` if the parent is unbound.
    fn parent_id(&self) -> Option<Self::ParentId>;

    /// Identifier of a persisted entity.
    fn bound_id(&self) -> EboniteResult<Self::Id> {
        self.id()
            .ok_or_else(|| EboniteError::unbound(format!("{} '{}'", Self::KIND, self.name())))
    }
}
