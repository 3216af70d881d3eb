//! Server configuration from environment variables.
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `EBONITE_BIND_ADDR` | socket address | `0.0.0.0:8080` |
//! | `EBONITE_META_REPO` | `memory` \| `postgres` | `memory` |
//! | `DATABASE_URL` | Postgres URL (required for `postgres`) | - |
//! | `EBONITE_ARTIFACT_REPO` | `memory` \| `local` | `memory` |
//! | `EBONITE_ARTIFACT_PATH` | directory for `local` | `.ebonite/artifacts` |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ARTIFACT_PATH: &str = ".ebonite/artifacts";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("EBONITE_BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),

    #[error("unknown EBONITE_META_REPO '{0}' (expected memory or postgres)")]
    UnknownMetaRepo(String),

    #[error("unknown EBONITE_ARTIFACT_REPO '{0}' (expected memory or local)")]
    UnknownArtifactRepo(String),

    #[error("DATABASE_URL must be set when EBONITE_META_REPO=postgres")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaRepoConfig {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRepoConfig {
    Memory,
    Local { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub meta_repo: MetaRepoConfig,
    pub artifact_repo: ArtifactRepoConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_addr = var("EBONITE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        let meta_repo = match var("EBONITE_META_REPO").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("memory") => MetaRepoConfig::Memory,
            Some("postgres") => MetaRepoConfig::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?,
            },
            Some(other) => return Err(ConfigError::UnknownMetaRepo(other.to_string())),
        };

        let artifact_repo = match var("EBONITE_ARTIFACT_REPO").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("memory") => ArtifactRepoConfig::Memory,
            Some("local") => ArtifactRepoConfig::Local {
                path: var("EBONITE_ARTIFACT_PATH")
                    .unwrap_or_else(|| DEFAULT_ARTIFACT_PATH.to_string())
                    .into(),
            },
            Some(other) => return Err(ConfigError::UnknownArtifactRepo(other.to_string())),
        };

        Ok(Self {
            bind_addr,
            meta_repo,
            artifact_repo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_repositories() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.meta_repo, MetaRepoConfig::Memory);
        assert_eq!(config.artifact_repo, ArtifactRepoConfig::Memory);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(
            parse(&[("EBONITE_META_REPO", "postgres")]).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );

        let config = parse(&[
            ("EBONITE_META_REPO", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/ebonite"),
        ])
        .unwrap();
        assert_eq!(
            config.meta_repo,
            MetaRepoConfig::Postgres {
                database_url: "postgres://localhost/ebonite".into()
            }
        );
    }

    #[test]
    fn local_artifacts_use_default_or_given_path() {
        let config = parse(&[("EBONITE_ARTIFACT_REPO", "local")]).unwrap();
        assert_eq!(
            config.artifact_repo,
            ArtifactRepoConfig::Local {
                path: PathBuf::from(DEFAULT_ARTIFACT_PATH)
            }
        );

        let config = parse(&[
            ("EBONITE_ARTIFACT_REPO", "local"),
            ("EBONITE_ARTIFACT_PATH", "/var/lib/ebonite"),
        ])
        .unwrap();
        assert_eq!(
            config.artifact_repo,
            ArtifactRepoConfig::Local {
                path: PathBuf::from("/var/lib/ebonite")
            }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            parse(&[("EBONITE_BIND_ADDR", "localhost")]),
            Err(ConfigError::InvalidBindAddr(_))
        ));
        assert_eq!(
            parse(&[("EBONITE_META_REPO", "sqlite")]).unwrap_err(),
            ConfigError::UnknownMetaRepo("sqlite".into())
        );
        assert_eq!(
            parse(&[("EBONITE_ARTIFACT_REPO", "s3")]).unwrap_err(),
            ConfigError::UnknownArtifactRepo("s3".into())
        );
    }
}
