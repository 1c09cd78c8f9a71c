//! Repository trait definitions for data store queries.
//!
//! The discovery core never talks to a concrete storage engine. It consumes two
//! focused traits:
//!
//! - [`datasets`]: dataset metadata and platform locations
//! - [`observations`]: windowed per-platform sums and raw series
//! - [`error`]: Error types for repository operations
//!
//! # Convenience Trait Bound
//!
//! Functions that need both capabilities take a [`DataStore`]:
//!
//! ```ignore
//! async fn my_service(store: &dyn DataStore) -> RepositoryResult<()> {
//!     let datasets = store.list_datasets().await?;
//!     Ok(())
//! }
//! ```

pub mod datasets;
pub mod error;
pub mod observations;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use datasets::DatasetRepository;
pub use observations::ObservationRepository;

/// Composite trait bound for a complete data store.
///
/// Automatically implemented for any type that implements both traits.
pub trait DataStore: DatasetRepository + ObservationRepository {}

// Blanket implementation: any type implementing both traits automatically implements DataStore
impl<T> DataStore for T where T: DatasetRepository + ObservationRepository {}
