use std::sync::Arc;

use ebonite_client::Ebonite;
use ebonite_core::{ArtifactRepository, EboniteResult, MetadataRepository};
use ebonite_infra::{
    artifact_repo::{InMemoryArtifactRepository, LocalArtifactRepository},
    meta_repo::{InMemoryMetadataRepository, PostgresMetadataRepository},
};

use crate::config::{ApiConfig, ArtifactRepoConfig, MetaRepoConfig};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    ebonite: Ebonite,
}

impl AppServices {
    pub fn new(ebonite: Ebonite) -> Self {
        Self { ebonite }
    }

    pub fn client(&self) -> &Ebonite {
        &self.ebonite
    }

    pub fn meta(&self) -> &dyn MetadataRepository {
        self.ebonite.meta_repo().as_ref()
    }
}

pub async fn build_services(config: &ApiConfig) -> EboniteResult<AppServices> {
    let meta_repo: Arc<dyn MetadataRepository> = match &config.meta_repo {
        MetaRepoConfig::Memory => {
            tracing::info!("using in-memory metadata repository");
            Arc::new(InMemoryMetadataRepository::new())
        }
        MetaRepoConfig::Postgres { database_url } => {
            tracing::info!("using postgres metadata repository");
            Arc::new(PostgresMetadataRepository::connect(database_url).await?)
        }
    };

    let artifact_repo: Arc<dyn ArtifactRepository> = match &config.artifact_repo {
        ArtifactRepoConfig::Memory => {
            tracing::info!("using in-memory artifact repository");
            Arc::new(InMemoryArtifactRepository::new())
        }
        ArtifactRepoConfig::Local { path } => {
            tracing::info!(path = %path.display(), "using local artifact repository");
            Arc::new(LocalArtifactRepository::new(path.clone()))
        }
    };

    Ok(AppServices::new(Ebonite::new(meta_repo, artifact_repo)))
}
