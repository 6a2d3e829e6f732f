#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Append-only nuisance report repository.
//!
//! The whole report collection lives in a single CSV object in an object
//! store. [`ReportRepository`] reads the object, appends to it and writes
//! it back wholesale; there are no partial updates and no deletes.
//!
//! ## Backends
//!
//! | Backend | Type | Use |
//! |---|---|---|
//! | S3 / R2 / `MinIO` | [`s3::S3ObjectStore`] | Production |
//! | Local directory | [`fs::FsObjectStore`] | Development |
//! | In-memory | [`memory::MemoryObjectStore`] | Tests |
//!
//! The backend is picked from the environment by [`config::StoreConfig`].
//!
//! ## Lost updates
//!
//! Two concurrent [`ReportRepository::append`] calls both read the same
//! collection and the later write wins, silently dropping the other
//! report. This is a known limitation of read-modify-write over a plain
//! object store.

pub mod codec;
pub mod config;
pub mod fs;
pub mod memory;
pub mod repository;
pub mod s3;
pub mod table;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use nuisance_map_nuisance_models::{ReportError, SubmissionError};
use uuid::Uuid;

pub use repository::{DEFAULT_OBJECT_KEY, ReportRepository};

/// Errors talking to the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading the object failed.
    #[error("Failed to read {location}: {source}")]
    Read {
        /// Object location (e.g. `s3://bucket/key` or a file path).
        location: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Writing the object failed or was rejected.
    #[error("Failed to write {location}: {source}")]
    Write {
        /// Object location.
        location: String,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The store did not answer in time.
    #[error("Timed out after {timeout:?} during {operation} of {location}")]
    Timeout {
        /// `"read"` or `"write"`.
        operation: &'static str,
        /// Object location.
        location: String,
        /// Configured timeout.
        timeout: Duration,
    },
}

/// Stored data that does not fit the fixed report schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The CSV could not be read at all.
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The header row is not the report header.
    #[error("Unexpected header {found:?}")]
    Header {
        /// Header fields found in the object.
        found: Vec<String>,
    },

    /// A data row has the wrong number of fields.
    #[error("Row {row}: expected {expected} fields, found {found}")]
    FieldCount {
        /// 1-based data row number.
        row: usize,
        /// Number of columns in the schema.
        expected: usize,
        /// Number of fields in the row.
        found: usize,
    },

    /// A field could not be parsed into its column type.
    #[error("Row {row}: invalid {column} '{value}': {message}")]
    InvalidField {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: &'static str,
        /// Raw field value.
        value: String,
        /// What went wrong.
        message: String,
    },

    /// A row parsed but breaks a report invariant.
    #[error("Row {row}: {source}")]
    InvalidReport {
        /// 1-based data row number.
        row: usize,
        /// Violated invariant.
        source: ReportError,
    },

    /// Two reports share an id.
    #[error("Duplicate report id {id}")]
    DuplicateId {
        /// The repeated id.
        id: Uuid,
    },

    /// The collection could not be serialized.
    #[error("Failed to encode report table: {message}")]
    Encode {
        /// What went wrong.
        message: String,
    },
}

/// Errors from [`ReportRepository`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The durable store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored collection is corrupt.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors from [`ReportRepository::submit`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No coordinate was provided.
    #[error("a location is required: enter an address or place a marker on the map")]
    MissingLocation,

    /// The coordinate is out of range.
    #[error("invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Submitted latitude.
        latitude: f64,
        /// Submitted longitude.
        longitude: f64,
    },

    /// No nuisance type was selected.
    #[error("select at least one nuisance type")]
    MissingNuisanceType,

    /// The durable store failed.
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// The stored collection is corrupt.
    #[error("Schema error: {0}")]
    Schema(SchemaError),
}

impl SubmitError {
    /// Taxonomy name of this failure, stable across releases.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingLocation => "MissingLocation",
            Self::InvalidLocation { .. } => "InvalidLocation",
            Self::MissingNuisanceType => "MissingNuisanceType",
            Self::Storage(_) => "StorageError",
            Self::Schema(_) => "SchemaError",
        }
    }

    /// Returns `true` if the submitter can fix the input and resubmit.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::MissingLocation | Self::InvalidLocation { .. } | Self::MissingNuisanceType
        )
    }
}

impl From<SubmissionError> for SubmitError {
    fn from(value: SubmissionError) -> Self {
        match value {
            SubmissionError::MissingLocation => Self::MissingLocation,
            SubmissionError::InvalidLocation {
                latitude,
                longitude,
            } => Self::InvalidLocation {
                latitude,
                longitude,
            },
            SubmissionError::MissingNuisanceType => Self::MissingNuisanceType,
        }
    }
}

impl From<RepositoryError> for SubmitError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Storage(e) => Self::Storage(e),
            RepositoryError::Schema(e) => Self::Schema(e),
        }
    }
}

/// A key/value object store holding whole objects.
///
/// Implementations must treat [`put`](Self::put) as a wholesale replace and
/// report a missing object from [`get`](Self::get) as `Ok(None)`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the object at `key`, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store is unreachable or times out.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the object at `key` with `body`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store is unreachable, rejects the
    /// write or times out.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError>;
}

/// Runs a storage future, converting an elapsed `timeout` into
/// [`StorageError::Timeout`].
pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    location: &str,
    timeout: Duration,
    future: F,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>> + Send,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| StorageError::Timeout {
            operation,
            location: location.to_string(),
            timeout,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stalled_operation_times_out() {
        let result: Result<(), StorageError> = with_timeout(
            "read",
            "s3://bucket/nuisances.csv",
            Duration::from_secs(10),
            std::future::pending(),
        )
        .await;

        match result {
            Err(StorageError::Timeout {
                operation,
                location,
                timeout,
            }) => {
                assert_eq!(operation, "read");
                assert_eq!(location, "s3://bucket/nuisances.csv");
                assert_eq!(timeout, Duration::from_secs(10));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn submit_error_kinds() {
        assert_eq!(SubmitError::MissingLocation.kind(), "MissingLocation");
        assert_eq!(
            SubmitError::from(SubmissionError::MissingNuisanceType).kind(),
            "MissingNuisanceType"
        );
        assert!(SubmitError::MissingLocation.is_user_correctable());
        let storage = SubmitError::from(RepositoryError::Storage(StorageError::Timeout {
            operation: "write",
            location: "x".to_string(),
            timeout: Duration::from_secs(1),
        }));
        assert_eq!(storage.kind(), "StorageError");
        assert!(!storage.is_user_correctable());
    }
}
