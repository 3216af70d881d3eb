//! Model artifacts: named binary blobs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::EboniteResult;

/// A single binary artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Blob {
    InMemory { payload: Vec<u8> },
    LocalFile { path: PathBuf },
}

/// Artifacts of one model, keyed by blob name.
pub type Blobs = BTreeMap<String, Blob>;

impl Blob {
    pub fn in_memory(payload: impl Into<Vec<u8>>) -> Self {
        Self::InMemory {
            payload: payload.into(),
        }
    }

    pub fn local_file(path: impl Into<PathBuf>) -> Self {
        Self::LocalFile { path: path.into() }
    }

    /// Read the blob contents.
    pub async fn bytes(&self) -> EboniteResult<Vec<u8>> {
        match self {
            Self::InMemory { payload } => Ok(payload.clone()),
            Self::LocalFile { path } => Ok(tokio::fs::read(path).await?),
        }
    }

    /// JSON descriptor of the blob; payload bytes are never inlined.
    pub fn describe(&self) -> serde_json::Value {
        match self {
            Self::InMemory { payload } => serde_json::json!({
                "type": "in_memory",
                "size": payload.len(),
            }),
            Self::LocalFile { path } => serde_json::json!({
                "type": "local_file",
                "path": path.display().to_string(),
            }),
        }
    }
}

/// Reference to the pushed artifacts of a model, recorded on the model itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub blobs: Vec<String>,
}

impl ArtifactRef {
    pub fn from_blobs(blobs: &Blobs) -> Self {
        Self {
            blobs: blobs.keys().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_blob_reads_back_payload() {
        let blob = Blob::in_memory(b"weights".to_vec());
        assert_eq!(blob.bytes().await.unwrap(), b"weights");
        assert_eq!(blob.describe()["size"], 7);
    }

    #[tokio::test]
    async fn missing_local_file_is_storage_error() {
        let blob = Blob::local_file("/nonexistent/ebonite/blob.bin");
        let err = blob.bytes().await.unwrap_err();
        assert!(matches!(err, crate::EboniteError::Storage(_)));
    }

    #[test]
    fn artifact_ref_lists_blob_names_in_order() {
        let mut blobs = Blobs::new();
        blobs.insert("model.pkl".into(), Blob::in_memory(vec![1]));
        blobs.insert("methods.json".into(), Blob::in_memory(vec![2]));
        assert_eq!(
            ArtifactRef::from_blobs(&blobs).blobs,
            vec!["methods.json".to_string(), "model.pkl".to_string()]
        );
    }
}
