//! Repository implementations module.
//!
//! This module contains implementations of the `DataStore` traits:
//! - `local`: In-memory implementation for unit testing and local development
pub mod local;

pub use local::LocalRepository;
