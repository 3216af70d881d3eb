//! Infrastructure layer: metadata and artifact repository backends.

pub mod artifact_repo;
pub mod meta_repo;
