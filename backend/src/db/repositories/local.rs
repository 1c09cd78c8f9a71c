//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in memory
//! using maps and vectors, providing fast, deterministic, and isolated execution.
//!
//! Besides plain data, each dataset can be told to fail or to answer slowly so
//! that degraded-source behaviour can be exercised without a real server.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::db::models::*;
use crate::db::repository::*;

/// In-memory local repository.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use flux_discovery::db::models::{DatasetInfo, Location};
/// use flux_discovery::db::repositories::LocalRepository;
///
/// let start = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
///
/// let repo = LocalRepository::new();
/// repo.add_dataset(DatasetInfo::new("papa_flux", "Station Papa", "https://example.org/papa", start, end));
/// repo.add_location("papa_flux", Location::new("48401", 50.1, -144.9));
/// assert_eq!(repo.dataset_count(), 1);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

/// How an injected failure behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    /// Every query fails.
    Always { retryable: bool },
    /// The next `remaining` queries fail with a retryable error, then succeed.
    Times { remaining: u32 },
}

struct CountRow {
    site_code: SiteCode,
    time: Instant,
    counts: HashMap<String, f64>,
}

struct RecordRow {
    time: Instant,
    values: HashMap<String, f64>,
}

struct LocalDataset {
    info: DatasetInfo,
    locations: Vec<Location>,
    counts: Vec<CountRow>,
    records: HashMap<SiteCode, Vec<RecordRow>>,
    failure: Option<FailureMode>,
    delay: Option<Duration>,
}

impl LocalDataset {
    fn new(info: DatasetInfo) -> Self {
        Self {
            info,
            locations: Vec::new(),
            counts: Vec::new(),
            records: HashMap::new(),
            failure: None,
            delay: None,
        }
    }
}

struct LocalData {
    datasets: BTreeMap<DatasetId, LocalDataset>,
    sum_queries: usize,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            datasets: BTreeMap::new(),
            sum_queries: 0,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Register a dataset. Replaces any previous dataset with the same id.
    pub fn add_dataset(&self, info: DatasetInfo) {
        let mut data = self.data.write();
        data.datasets
            .insert(info.id.clone(), LocalDataset::new(info));
    }

    /// Register a platform location for a dataset. Unknown datasets are ignored.
    pub fn add_location(&self, dataset: impl Into<DatasetId>, location: Location) {
        let mut data = self.data.write();
        if let Some(entry) = data.datasets.get_mut(&dataset.into()) {
            entry.locations.push(location);
        }
    }

    /// Add one row of per-variable observation counts.
    pub fn add_counts(
        &self,
        dataset: impl Into<DatasetId>,
        site_code: impl Into<SiteCode>,
        time: Instant,
        counts: &[(&str, f64)],
    ) {
        let mut data = self.data.write();
        if let Some(entry) = data.datasets.get_mut(&dataset.into()) {
            entry.counts.push(CountRow {
                site_code: site_code.into(),
                time,
                counts: counts.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            });
        }
    }

    /// Add one raw observation row for a platform.
    pub fn add_observation(
        &self,
        dataset: impl Into<DatasetId>,
        site_code: impl Into<SiteCode>,
        time: Instant,
        values: &[(&str, f64)],
    ) {
        let mut data = self.data.write();
        if let Some(entry) = data.datasets.get_mut(&dataset.into()) {
            entry
                .records
                .entry(site_code.into())
                .or_default()
                .push(RecordRow {
                    time,
                    values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                });
        }
    }

    /// Make every query against a dataset fail.
    pub fn fail_dataset(&self, dataset: impl Into<DatasetId>, retryable: bool) {
        self.set_failure(dataset.into(), Some(FailureMode::Always { retryable }));
    }

    /// Make the next `times` queries against a dataset fail with a retryable error.
    pub fn fail_dataset_times(&self, dataset: impl Into<DatasetId>, times: u32) {
        self.set_failure(dataset.into(), Some(FailureMode::Times { remaining: times }));
    }

    /// Remove any injected failure.
    pub fn restore_dataset(&self, dataset: impl Into<DatasetId>) {
        self.set_failure(dataset.into(), None);
    }

    fn set_failure(&self, dataset: DatasetId, failure: Option<FailureMode>) {
        let mut data = self.data.write();
        if let Some(entry) = data.datasets.get_mut(&dataset) {
            entry.failure = failure;
        }
    }

    /// Delay every query against a dataset.
    pub fn set_delay(&self, dataset: impl Into<DatasetId>, delay: Duration) {
        let mut data = self.data.write();
        if let Some(entry) = data.datasets.get_mut(&dataset.into()) {
            entry.delay = Some(delay);
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of datasets stored.
    pub fn dataset_count(&self) -> usize {
        self.data.read().datasets.len()
    }

    /// Number of `query_sums` calls answered or rejected so far.
    pub fn sum_query_count(&self) -> usize {
        self.data.read().sum_queries
    }

    /// Health, existence and injected-failure checks shared by every query.
    ///
    /// Returns the configured delay so the caller can wait without holding the lock.
    fn admit(&self, dataset: &DatasetId, operation: &str) -> RepositoryResult<Option<Duration>> {
        let mut data = self.data.write();
        if !data.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Data store is not healthy",
                ErrorContext::new(operation),
            ));
        }

        let entry = data.datasets.get_mut(dataset).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Dataset {} not found", dataset),
                ErrorContext::new(operation)
                    .with_entity("dataset")
                    .with_entity_id(dataset),
            )
        })?;

        let context = ErrorContext::new(operation)
            .with_entity("dataset")
            .with_entity_id(dataset);
        match entry.failure {
            Some(FailureMode::Always { retryable: true }) => Err(
                RepositoryError::connection_with_context("Injected failure", context),
            ),
            Some(FailureMode::Always { retryable: false }) => Err(
                RepositoryError::query_with_context("Injected failure", context),
            ),
            Some(FailureMode::Times { remaining }) if remaining > 0 => {
                entry.failure = Some(FailureMode::Times {
                    remaining: remaining - 1,
                });
                Err(RepositoryError::connection_with_context(
                    "Injected transient failure",
                    context,
                ))
            }
            _ => Ok(entry.delay),
        }
    }

    async fn wait(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Dataset Repository ====================

#[async_trait]
impl DatasetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>> {
        let data = self.data.read();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Data store is not healthy"));
        }
        Ok(data.datasets.values().map(|d| d.info.clone()).collect())
    }

    async fn dataset_info(&self, dataset: &DatasetId) -> RepositoryResult<DatasetInfo> {
        let delay = self.admit(dataset, "dataset_info")?;
        Self::wait(delay).await;

        let data = self.data.read();
        data.datasets
            .get(dataset)
            .map(|d| d.info.clone())
            .ok_or_else(|| RepositoryError::not_found(format!("Dataset {} not found", dataset)))
    }

    async fn query_locations(&self, dataset: &DatasetId) -> RepositoryResult<Vec<Location>> {
        let delay = self.admit(dataset, "query_locations")?;
        Self::wait(delay).await;

        let data = self.data.read();
        Ok(data
            .datasets
            .get(dataset)
            .map(|d| d.locations.clone())
            .unwrap_or_default())
    }
}

// ==================== Observation Repository ====================

#[async_trait]
impl ObservationRepository for LocalRepository {
    async fn query_sums(
        &self,
        dataset: &DatasetId,
        variables: &[String],
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<SumRow>> {
        self.data.write().sum_queries += 1;
        let delay = self.admit(dataset, "query_sums")?;
        Self::wait(delay).await;

        let data = self.data.read();
        let Some(entry) = data.datasets.get(dataset) else {
            return Ok(Vec::new());
        };

        let mut by_site: BTreeMap<SiteCode, SumRow> = BTreeMap::new();
        for row in entry.counts.iter().filter(|r| window.contains(r.time)) {
            let sum_row = by_site
                .entry(row.site_code.clone())
                .or_insert_with(|| SumRow::new(row.site_code.clone()));
            for variable in variables {
                let count = row.counts.get(variable).copied().unwrap_or(0.0);
                *sum_row.sums.entry(variable.clone()).or_insert(0.0) += count;
            }
        }

        Ok(by_site.into_values().collect())
    }

    async fn query_raw_series(
        &self,
        dataset: &DatasetId,
        site_code: &SiteCode,
        variables: &[String],
        window: &TimeWindow,
    ) -> RepositoryResult<Series> {
        let delay = self.admit(dataset, "query_raw_series")?;
        Self::wait(delay).await;

        let data = self.data.read();
        let mut rows: Vec<Observation> = data
            .datasets
            .get(dataset)
            .and_then(|d| d.records.get(site_code))
            .map(|records| {
                records
                    .iter()
                    .filter(|r| window.contains(r.time))
                    .map(|r| {
                        Observation::new(
                            r.time,
                            variables.iter().map(|v| r.values.get(v).copied()).collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|o| o.time);

        Ok(Series {
            source: dataset.clone(),
            site_code: site_code.clone(),
            variables: variables.to_vec(),
            rows,
        })
    }
}
