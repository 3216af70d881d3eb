use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use ebonite_core::{ArtifactRef, ArtifactRepository, Blob, Blobs, EboniteError, EboniteResult, ModelId};

use super::validate_blob_names;

/// Artifact store on the local filesystem.
///
/// Layout: `<root>/<model_id>/<blob name>`. A model has artifacts iff its
/// directory exists.
#[derive(Debug, Clone)]
pub struct LocalArtifactRepository {
    root: PathBuf,
}

impl LocalArtifactRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn model_dir(&self, model_id: ModelId) -> PathBuf {
        self.root.join(model_id.to_string())
    }

    async fn write_all(dir: &Path, blobs: &Blobs) -> EboniteResult<()> {
        for (name, blob) in blobs {
            let payload = blob.bytes().await?;
            tokio::fs::write(dir.join(name), payload).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactRepository for LocalArtifactRepository {
    #[instrument(skip(self, blobs), fields(root = %self.root.display()), err)]
    async fn push_artifacts(&self, model_id: ModelId, blobs: Blobs) -> EboniteResult<ArtifactRef> {
        validate_blob_names(&blobs)?;

        let dir = self.model_dir(model_id);
        tokio::fs::create_dir_all(&self.root).await?;
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(EboniteError::ExistingArtifact(model_id));
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = Self::write_all(&dir, &blobs).await {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                tracing::warn!(%model_id, error = %cleanup, "failed to clean up partial artifacts");
            }
            return Err(e);
        }

        Ok(ArtifactRef::from_blobs(&blobs))
    }

    async fn get_artifacts(&self, model_id: ModelId) -> EboniteResult<Blobs> {
        let dir = self.model_dir(model_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EboniteError::NonExistingArtifact(model_id));
            }
            Err(e) => return Err(e.into()),
        };

        let mut blobs = Blobs::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                blobs.insert(name.to_string(), Blob::local_file(entry.path()));
            }
        }
        Ok(blobs)
    }

    #[instrument(skip(self), err)]
    async fn delete_artifacts(&self, model_id: ModelId) -> EboniteResult<()> {
        match tokio::fs::remove_dir_all(self.model_dir(model_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EboniteError::NonExistingArtifact(model_id)),
            Err(e) => Err(e.into()),
        }
    }
}
