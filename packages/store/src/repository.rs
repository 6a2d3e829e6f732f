//! Read-modify-write repository over a single collection object.

use std::sync::Arc;

use nuisance_map_nuisance_models::{NuisanceReport, ReportSubmission};

use crate::{ObjectStore, RepositoryError, SchemaError, SubmitError, table};

/// Default object key of the report collection.
pub const DEFAULT_OBJECT_KEY: &str = "nuisances.csv";

/// Owns the canonical report collection stored at one object key.
///
/// Holds no cached copy: every call reads the object afresh.
#[derive(Clone)]
pub struct ReportRepository {
    store: Arc<dyn ObjectStore>,
    key: String,
}

impl std::fmt::Debug for ReportRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRepository")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ReportRepository {
    /// Creates a repository for the collection at `key` in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Object key of the collection.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the whole collection in stored order.
    ///
    /// A missing object is the empty collection (first run).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Storage`] if the store fails and
    /// [`RepositoryError::Schema`] if the stored data is corrupt.
    pub async fn load_all(&self) -> Result<Vec<NuisanceReport>, RepositoryError> {
        let Some(body) = self.store.get(&self.key).await? else {
            log::info!("{} not found (first run?), starting empty", self.key);
            return Ok(Vec::new());
        };

        let reports = table::decode_reports(&body).inspect_err(|e| {
            log::error!("Stored collection {} is corrupt: {e}", self.key);
        })?;

        log::debug!("Loaded {} reports from {}", reports.len(), self.key);
        Ok(reports)
    }

    /// Appends `report` and writes the whole collection back.
    ///
    /// Nothing is written if the stored collection fails to load or
    /// already contains the report's id. Concurrent appends may lose
    /// updates; see the crate documentation.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Storage`] if the read or write fails and
    /// [`RepositoryError::Schema`] if the stored data is corrupt or the id
    /// is already present.
    pub async fn append(&self, report: NuisanceReport) -> Result<(), RepositoryError> {
        let mut reports = self.load_all().await?;

        let id = report.id();
        if reports.iter().any(|r| r.id() == id) {
            return Err(SchemaError::DuplicateId { id }.into());
        }

        reports.push(report);
        let body = table::encode_reports(&reports)?;
        self.store.put(&self.key, body).await?;

        log::info!(
            "Appended report {id} to {} ({} reports)",
            self.key,
            reports.len()
        );
        Ok(())
    }

    /// Validates a submission, creates the report and appends it.
    ///
    /// Returns the persisted report.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] for invalid input or a failed append.
    pub async fn submit(
        &self,
        submission: ReportSubmission,
    ) -> Result<NuisanceReport, SubmitError> {
        let report = submission.into_report()?;
        self.append(report.clone()).await.inspect_err(|e| {
            log::warn!("Failed to append report {}: {e}", report.id());
        })?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use nuisance_map_nuisance_models::{ANONYMOUS_SUBMITTER, Frequency, NuisanceType};
    use tokio::sync::Barrier;

    use super::*;
    use crate::StorageError;
    use crate::memory::MemoryObjectStore;

    fn submission(types: Vec<NuisanceType>, frequency: Frequency) -> ReportSubmission {
        ReportSubmission {
            submitter_name: Some("Ana".to_string()),
            latitude: Some(43.65),
            longitude: Some(6.80),
            address: Some("Nice".to_string()),
            nuisance_types: types,
            frequency,
            comment: Some("every evening".to_string()),
        }
    }

    fn repository() -> (Arc<MemoryObjectStore>, ReportRepository) {
        let store = Arc::new(MemoryObjectStore::new());
        let repository = ReportRepository::new(store.clone(), DEFAULT_OBJECT_KEY);
        (store, repository)
    }

    #[tokio::test]
    async fn missing_object_loads_empty() {
        let (_, repository) = repository();
        assert!(repository.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_grows_collection_by_one_and_preserves_fields() {
        let (_, repository) = repository();
        repository
            .submit(submission(vec![NuisanceType::Noise], Frequency::Daily))
            .await
            .unwrap();
        let before = repository.load_all().await.unwrap();

        let report = submission(vec![NuisanceType::Odor, NuisanceType::Light], Frequency::Yearly)
            .into_report()
            .unwrap();
        repository.append(report.clone()).await.unwrap();

        let after = repository.load_all().await.unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last(), Some(&report));
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[tokio::test]
    async fn repeated_loads_are_identical() {
        let (_, repository) = repository();
        for frequency in Frequency::all() {
            repository
                .submit(submission(vec![NuisanceType::Noise], *frequency))
                .await
                .unwrap();
        }
        let first = repository.load_all().await.unwrap();
        let second = repository.load_all().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[tokio::test]
    async fn blank_name_is_stored_as_anonymous() {
        let (_, repository) = repository();
        let persisted = repository
            .submit(ReportSubmission {
                submitter_name: Some(String::new()),
                comment: Some(String::new()),
                ..submission(vec![NuisanceType::Noise, NuisanceType::Odor], Frequency::Weekly)
            })
            .await
            .unwrap();

        let loaded = repository.load_all().await.unwrap();
        assert_eq!(loaded, vec![persisted]);
        assert_eq!(loaded[0].submitter_name(), ANONYMOUS_SUBMITTER);
        assert_eq!(loaded[0].nuisance_types().primary(), NuisanceType::Noise);
    }

    #[tokio::test]
    async fn invalid_submission_writes_nothing() {
        let (store, repository) = repository();
        let err = repository
            .submit(submission(Vec::new(), Frequency::Daily))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "MissingNuisanceType");
        assert!(store.object(DEFAULT_OBJECT_KEY).is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let (_, repository) = repository();
        let report = submission(vec![NuisanceType::Light], Frequency::Monthly)
            .into_report()
            .unwrap();
        repository.append(report.clone()).await.unwrap();

        let err = repository.append(report).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Schema(SchemaError::DuplicateId { .. })
        ));
        assert_eq!(repository.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_collection_fails_and_is_left_untouched() {
        let corrupt = b"id,submitterName,latitude,longitude,address,nuisanceTypes,frequency,comment\n\
                        0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,a,1,2,x,Smoke,Daily,\n"
            .to_vec();
        let store = Arc::new(MemoryObjectStore::new().with_object(DEFAULT_OBJECT_KEY, corrupt.clone()));
        let repository = ReportRepository::new(store.clone(), DEFAULT_OBJECT_KEY);

        assert!(matches!(
            repository.load_all().await,
            Err(RepositoryError::Schema(_))
        ));

        let err = repository
            .submit(submission(vec![NuisanceType::Noise], Frequency::Daily))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
        assert_eq!(store.object(DEFAULT_OBJECT_KEY), Some(corrupt));
    }

    #[tokio::test]
    async fn legacy_collection_is_rewritten_canonically_on_append() {
        let legacy = "id,nom,lat,lon,adresse,nuisances,frequence,commentaire\n\
                      0b6f4ad4-5c3e-4d55-9a55-8f1ef4b4a1f0,anonyme,43.65388,6.80198,Localisation manuelle,Odeur,Tous les jours,\n";
        let store = Arc::new(
            MemoryObjectStore::new().with_object(DEFAULT_OBJECT_KEY, legacy.as_bytes().to_vec()),
        );
        let repository = ReportRepository::new(store.clone(), DEFAULT_OBJECT_KEY);

        repository
            .submit(submission(vec![NuisanceType::Noise], Frequency::Daily))
            .await
            .unwrap();

        let stored = String::from_utf8(store.object(DEFAULT_OBJECT_KEY).unwrap()).unwrap();
        assert!(stored.starts_with("id,submitterName,latitude,"));
        assert!(stored.contains(",Odor,Daily,"));
        assert_eq!(repository.load_all().await.unwrap().len(), 2);
    }

    struct RejectingStore;

    #[async_trait]
    impl ObjectStore for RejectingStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        async fn put(&self, key: &str, _body: Vec<u8>) -> Result<(), StorageError> {
            Err(StorageError::Write {
                location: key.to_string(),
                source: "access denied".into(),
            })
        }
    }

    #[tokio::test]
    async fn rejected_write_is_storage_error() {
        let repository = ReportRepository::new(Arc::new(RejectingStore), DEFAULT_OBJECT_KEY);
        let err = repository
            .submit(submission(vec![NuisanceType::Noise], Frequency::Daily))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "StorageError");
        assert!(err.to_string().contains("access denied"));
    }

    /// Holds every reader until two reads have happened, forcing the
    /// read/read/write/write interleaving of two concurrent appends.
    struct InterleavingStore {
        inner: Arc<MemoryObjectStore>,
        barrier: Barrier,
    }

    #[async_trait]
    impl ObjectStore for InterleavingStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            let body = self.inner.get(key).await;
            self.barrier.wait().await;
            body
        }

        async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
            self.inner.put(key, body).await
        }
    }

    #[tokio::test]
    async fn concurrent_appends_lose_an_update() {
        let inner = Arc::new(MemoryObjectStore::new());
        let racing = ReportRepository::new(
            Arc::new(InterleavingStore {
                inner: inner.clone(),
                barrier: Barrier::new(2),
            }),
            DEFAULT_OBJECT_KEY,
        );

        let first = submission(vec![NuisanceType::Noise], Frequency::Daily)
            .into_report()
            .unwrap();
        let second = submission(vec![NuisanceType::Odor], Frequency::Weekly)
            .into_report()
            .unwrap();

        let (a, b) = tokio::join!(racing.append(first.clone()), racing.append(second.clone()));
        a.unwrap();
        b.unwrap();

        // Both appends succeeded, yet only the last writer's report survives.
        let survivors = ReportRepository::new(inner, DEFAULT_OBJECT_KEY)
            .load_all()
            .await
            .unwrap();
        assert_eq!(survivors.len(), 1);
        assert!(survivors[0] == first || survivors[0] == second);
    }
}
