//! Dataset repository trait for metadata and platform locations.
//!
//! This trait defines the read-only operations describing which datasets exist,
//! what time range they cover and which platforms each one knows about.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::{DatasetId, DatasetInfo, Location};

/// Repository trait for dataset metadata.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Check if the data store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if the store is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// List every dataset the store can answer queries for.
    ///
    /// # Returns
    /// * `Ok(Vec<DatasetInfo>)` - Metadata of all datasets, in dataset order
    /// * `Err(RepositoryError)` - If the operation fails
    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>>;

    /// Metadata for one dataset.
    ///
    /// # Returns
    /// * `Ok(DatasetInfo)` - Title, URL, units, sampling interval and extent
    /// * `Err(RepositoryError::NotFound)` - If the dataset doesn't exist
    async fn dataset_info(&self, dataset: &DatasetId) -> RepositoryResult<DatasetInfo>;

    /// Every platform location known to a dataset.
    ///
    /// # Arguments
    /// * `dataset` - The dataset to list platforms for
    ///
    /// # Returns
    /// * `Ok(Vec<Location>)` - Known platforms (possibly empty)
    /// * `Err(RepositoryError)` - If the operation fails
    async fn query_locations(&self, dataset: &DatasetId) -> RepositoryResult<Vec<Location>>;
}
