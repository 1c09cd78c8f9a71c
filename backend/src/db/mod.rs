//! Data store module.
//!
//! This module provides abstractions for data store queries via the Repository
//! pattern, so the discovery services run unchanged against any backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Discovery services (search, plot)                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Query policy              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The module includes:
//! - `services`: timeouts, retries, health and extent helpers
//! - `repository`: trait definitions and error types
//! - `repositories::local`: in-memory implementation for tests and local development
//!
//! There is no process-wide store. Callers build one and hand it to
//! [`crate::services::Discovery`] as an `Arc<dyn DataStore>`.

pub mod models;
pub mod repositories;
pub mod repository;
pub mod services;

pub use services::{global_extent, guarded_query, health_check, list_datasets, with_retry};

pub use models::DatasetInfo;
pub use repositories::LocalRepository;
pub use repository::{
    DataStore, DatasetRepository, ErrorContext, ObservationRepository, RepositoryError,
    RepositoryResult,
};
