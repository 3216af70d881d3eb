//! Artifact repository backends.

pub mod in_memory;
pub mod local;

pub use in_memory::InMemoryArtifactRepository;
pub use local::LocalArtifactRepository;

use ebonite_core::{Blobs, EboniteError, EboniteResult};

/// Blob names become file names in the local backend, so they must be a single
/// plain path component.
pub(crate) fn validate_blob_names(blobs: &Blobs) -> EboniteResult<()> {
    for name in blobs.keys() {
        let invalid = name.is_empty()
            || name == "."
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\');
        if invalid {
            return Err(EboniteError::validation(format!("invalid artifact name '{name}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebonite_core::Blob;

    fn blobs(names: &[&str]) -> Blobs {
        names
            .iter()
            .map(|n| (n.to_string(), Blob::in_memory(vec![0u8])))
            .collect()
    }

    #[test]
    fn plain_names_are_accepted() {
        assert!(validate_blob_names(&blobs(&["model.bin", "methods.json"])).is_ok());
    }

    #[test]
    fn path_like_names_are_rejected() {
        for name in ["", ".", "../evil", "a/b", "a\\b", "x..y"] {
            let err = validate_blob_names(&blobs(&[name])).unwrap_err();
            assert!(matches!(err, EboniteError::Validation(_)), "{name:?}");
        }
    }
}
