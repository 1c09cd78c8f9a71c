//! High-level data store service layer.
//!
//! Repository-agnostic operations that work with any [`DataStore`]. The search
//! engine and the plot orchestrator never call a store directly; every query
//! goes through [`guarded_query`], which applies the configured timeout and the
//! bounded retry policy.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Discovery services (search, plot)                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                              │
//! │  - Timeouts and retries                                   │
//! │  - Global extent                                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/)                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!          ┌──────────▼──────────────┐
//!          │ Local Repository        │
//!          │ (in-memory)             │
//!          └─────────────────────────┘
//! ```

use log::{debug, info, warn};
use std::future::Future;

use super::models::{DatasetInfo, GlobalExtent};
use super::repository::{DataStore, ErrorContext, RepositoryError, RepositoryResult};
use crate::config::SearchSettings;

// ==================== Health & Metadata ====================

/// Check if the data store is healthy.
///
/// This is a simple pass-through to the repository's health check.
pub async fn health_check(store: &dyn DataStore) -> RepositoryResult<bool> {
    store.health_check().await
}

/// List every dataset the store knows about.
pub async fn list_datasets(store: &dyn DataStore) -> RepositoryResult<Vec<DatasetInfo>> {
    info!("Service layer: listing datasets");
    let datasets = store.list_datasets().await?;
    info!("Service layer: found {} datasets", datasets.len());
    Ok(datasets)
}

/// Union of the time extents of all datasets.
///
/// # Returns
/// * `Ok(GlobalExtent)` spanning every dataset
/// * `Err(RepositoryError::ConfigurationError)` if no dataset has a valid extent
pub fn global_extent(datasets: &[DatasetInfo]) -> RepositoryResult<GlobalExtent> {
    GlobalExtent::union(datasets.iter().map(|d| (d.start, d.end))).ok_or_else(|| {
        RepositoryError::configuration("No dataset declares a valid time extent")
    })
}

// ==================== Query Policy ====================

/// Retry `query` while it fails with a retryable error, up to `max_retries` times.
pub async fn with_retry<T, F, Fut>(
    settings: &SearchSettings,
    operation: &str,
    mut query: F,
) -> RepositoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RepositoryResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match query().await {
            Err(e) if e.is_retryable() && attempt < settings.max_retries => {
                attempt += 1;
                warn!(
                    "Service layer: {} failed (attempt {}/{}), retrying: {}",
                    operation,
                    attempt,
                    settings.max_retries + 1,
                    e
                );
                tokio::time::sleep(settings.retry_delay()).await;
            }
            other => return other,
        }
    }
}

/// Run a store query under the configured timeout and retry policy.
///
/// The timeout bounds the whole attempt sequence. Expiry is reported as
/// [`RepositoryError::TimeoutError`].
pub async fn guarded_query<T, F, Fut>(
    settings: &SearchSettings,
    operation: &str,
    query: F,
) -> RepositoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RepositoryResult<T>>,
{
    match tokio::time::timeout(
        settings.query_timeout(),
        with_retry(settings, operation, query),
    )
    .await
    {
        Ok(result) => {
            debug!("Service layer: {} finished", operation);
            result
        }
        Err(_) => Err(RepositoryError::timeout_with_context(
            "query did not answer",
            ErrorContext::new(operation)
                .with_details(format!("limit {} ms", settings.query_timeout_ms)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_settings() -> SearchSettings {
        SearchSettings {
            max_retries: 2,
            retry_delay_ms: 1,
            query_timeout_ms: 200,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast_settings(), "count_rows", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(RepositoryError::connection("flaky"))
            } else {
                Ok(5)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: RepositoryResult<()> = with_retry(&fast_settings(), "count_rows", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::query("bad column"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_guarded_query_times_out() {
        let result: RepositoryResult<()> = guarded_query(&fast_settings(), "slow", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RepositoryError::TimeoutError { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.context().operation.as_deref(), Some("slow"));
        assert_eq!(err.context().details.as_deref(), Some("limit 200 ms"));
        assert!(err.to_string().contains("details=limit 200 ms"));
    }

    #[tokio::test]
    async fn test_global_extent_from_store() {
        let repo = LocalRepository::new();
        let a = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2004, 1, 1, 0, 0, 0).unwrap();
        let c = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        repo.add_dataset(DatasetInfo::new("one", "One", "u1", a, b));
        repo.add_dataset(DatasetInfo::new("two", "Two", "u2", b, c));

        assert!(health_check(&repo).await.unwrap());
        let datasets = list_datasets(&repo).await.unwrap();
        let extent = global_extent(&datasets).unwrap();
        assert_eq!((extent.min, extent.max), (a, c));
        assert!(global_extent(&[]).is_err());
    }
}
