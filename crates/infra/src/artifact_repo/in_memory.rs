use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ebonite_core::{ArtifactRef, ArtifactRepository, Blob, Blobs, EboniteError, EboniteResult, ModelId};

use super::validate_blob_names;

/// Artifact store that keeps every blob as an in-memory payload.
#[derive(Debug, Default)]
pub struct InMemoryArtifactRepository {
    artifacts: RwLock<HashMap<ModelId, Blobs>>,
}

impl InMemoryArtifactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> EboniteError {
    EboniteError::storage("artifact store lock poisoned")
}

#[async_trait]
impl ArtifactRepository for InMemoryArtifactRepository {
    async fn push_artifacts(&self, model_id: ModelId, blobs: Blobs) -> EboniteResult<ArtifactRef> {
        validate_blob_names(&blobs)?;

        // Materialize file-backed blobs before taking the lock.
        let mut stored = Blobs::new();
        for (name, blob) in &blobs {
            stored.insert(name.clone(), Blob::in_memory(blob.bytes().await?));
        }

        let mut guard = self.artifacts.write().map_err(poisoned)?;
        if guard.contains_key(&model_id) {
            return Err(EboniteError::ExistingArtifact(model_id));
        }
        let reference = ArtifactRef::from_blobs(&stored);
        guard.insert(model_id, stored);
        tracing::debug!(%model_id, blobs = reference.blobs.len(), "artifacts stored in memory");
        Ok(reference)
    }

    async fn get_artifacts(&self, model_id: ModelId) -> EboniteResult<Blobs> {
        let guard = self.artifacts.read().map_err(poisoned)?;
        guard
            .get(&model_id)
            .cloned()
            .ok_or(EboniteError::NonExistingArtifact(model_id))
    }

    async fn delete_artifacts(&self, model_id: ModelId) -> EboniteResult<()> {
        let mut guard = self.artifacts.write().map_err(poisoned)?;
        guard
            .remove(&model_id)
            .map(|_| ())
            .ok_or(EboniteError::NonExistingArtifact(model_id))
    }
}
