//! Observation repository trait for windowed counts and raw series.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::{DatasetId, Series, SiteCode, SumRow, TimeWindow};

/// Repository trait for observation queries.
///
/// Both queries are restricted to an inclusive time window.
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    /// Per-platform sums of each named variable over the window.
    ///
    /// # Arguments
    /// * `dataset` - Dataset to query
    /// * `variables` - Variable short names to sum
    /// * `window` - Inclusive time window
    ///
    /// # Returns
    /// * `Ok(Vec<SumRow>)` - One row per platform with any rows in the window
    /// * `Err(RepositoryError)` - If the query fails
    async fn query_sums(
        &self,
        dataset: &DatasetId,
        variables: &[String],
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<SumRow>>;

    /// Raw time-ordered observations of the named variables at one platform.
    ///
    /// # Returns
    /// * `Ok(Series)` - Observations inside the window, sorted by time
    /// * `Err(RepositoryError)` - If the query fails
    async fn query_raw_series(
        &self,
        dataset: &DatasetId,
        site_code: &SiteCode,
        variables: &[String],
        window: &TimeWindow,
    ) -> RepositoryResult<Series>;
}
