//! Store configuration from environment variables.
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `NUISANCE_MAP_BUCKET` | unset | Use the S3 backend with this bucket |
//! | `NUISANCE_MAP_KEY` | `nuisances.csv` | Object key of the collection |
//! | `AWS_ACCESS_KEY_ID` | required with a bucket | S3 access key |
//! | `AWS_SECRET_ACCESS_KEY` | required with a bucket | S3 secret key |
//! | `AWS_REGION` | `eu-west-3` | S3 region |
//! | `S3_ENDPOINT_URL` | unset | S3-compatible endpoint (R2, `MinIO`) |
//! | `NUISANCE_MAP_DATA_DIR` | `data` | Filesystem backend root when no bucket is set |
//! | `NUISANCE_MAP_STORAGE_TIMEOUT_SECS` | `10` | Per-request storage timeout |
//!
//! Empty values count as unset.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::fs::FsObjectStore;
use crate::s3::S3ObjectStore;
use crate::{DEFAULT_OBJECT_KEY, ObjectStore, ReportRepository};

/// Default S3 region.
pub const DEFAULT_REGION: &str = "eu-west-3";

/// Default filesystem backend root.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default per-request storage timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors reading the store configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: String,
    },

    /// A variable has an unusable value.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// Connection settings for the S3 backend.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Bucket holding the collection.
    pub bucket: String,
    /// Region name.
    pub region: String,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint_url: Option<String>,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Which backend holds the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// S3-compatible bucket.
    S3(S3Config),
    /// Local directory.
    Filesystem {
        /// Root directory.
        root: PathBuf,
    },
}

/// Complete store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend selection.
    pub backend: BackendConfig,
    /// Object key of the collection.
    pub key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a bucket is set without credentials or
    /// the timeout is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| ConfigError::MissingEnv {
                name: name.to_string(),
            })
        };

        let backend = match get("NUISANCE_MAP_BUCKET") {
            Some(bucket) => BackendConfig::S3(S3Config {
                bucket,
                region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint_url: get("S3_ENDPOINT_URL"),
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => BackendConfig::Filesystem {
                root: PathBuf::from(
                    get("NUISANCE_MAP_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
                ),
            },
        };

        let timeout = match get("NUISANCE_MAP_STORAGE_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "NUISANCE_MAP_STORAGE_TIMEOUT_SECS".to_string(),
                        value,
                    });
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            backend,
            key: get("NUISANCE_MAP_KEY").unwrap_or_else(|| DEFAULT_OBJECT_KEY.to_string()),
            timeout,
        })
    }

    /// Builds the configured backend.
    #[must_use]
    pub fn build_store(&self) -> Arc<dyn ObjectStore> {
        match &self.backend {
            BackendConfig::S3(s3) => {
                log::info!(
                    "Using S3 store s3://{}/{} ({})",
                    s3.bucket,
                    self.key,
                    s3.endpoint_url.as_deref().unwrap_or(&s3.region)
                );
                Arc::new(S3ObjectStore::new(s3, self.timeout))
            }
            BackendConfig::Filesystem { root } => {
                log::info!("Using filesystem store {}", root.join(&self.key).display());
                Arc::new(FsObjectStore::new(root.clone(), self.timeout))
            }
        }
    }

    /// Builds a repository over the configured backend.
    #[must_use]
    pub fn repository(&self) -> ReportRepository {
        ReportRepository::new(self.build_store(), self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_filesystem_backend() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Filesystem {
                root: PathBuf::from("data")
            }
        );
        assert_eq!(config.key, "nuisances.csv");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn bucket_selects_s3_backend() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("NUISANCE_MAP_BUCKET", "reports"),
            ("AWS_ACCESS_KEY_ID", "id"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("S3_ENDPOINT_URL", "http://localhost:9000"),
            ("NUISANCE_MAP_STORAGE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        let BackendConfig::S3(s3) = &config.backend else {
            panic!("expected S3 backend");
        };
        assert_eq!(s3.bucket, "reports");
        assert_eq!(s3.region, DEFAULT_REGION);
        assert_eq!(s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(!format!("{s3:?}").contains("secret\""));
    }

    #[test]
    fn bucket_without_credentials_is_error() {
        let err = StoreConfig::from_lookup(lookup(&[("NUISANCE_MAP_BUCKET", "reports")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv { name } if name == "AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("NUISANCE_MAP_BUCKET", ""),
            ("NUISANCE_MAP_KEY", " "),
        ]))
        .unwrap();
        assert!(matches!(config.backend, BackendConfig::Filesystem { .. }));
        assert_eq!(config.key, DEFAULT_OBJECT_KEY);
    }

    #[test]
    fn bad_timeout_is_error() {
        for value in ["zero", "0", "-1"] {
            let err = StoreConfig::from_lookup(lookup(&[(
                "NUISANCE_MAP_STORAGE_TIMEOUT_SECS",
                value,
            )]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnv { .. }));
        }
    }
}
