//! # Flux Data Discovery
//!
//! Core of a data discovery tool for ocean surface flux observations.
//!
//! A user picks a question (a named set of variables) and a time window; the
//! crate finds which fixed platforms have data for that question in that window
//! across several data sources, and prepares a gap-aware time series plot of the
//! platform the user selects.
//!
//! ## Features
//!
//! - **Window reconciliation**: keep the range slider, the date fields and the
//!   deep link in agreement on one canonical window
//! - **Availability search**: AND/OR join predicates evaluated concurrently per
//!   data source, with per-source failure isolation
//! - **Resampling**: gap markers so plots break lines across missing data
//! - **Tick selection**: axis tick spacing and labels that follow the zoom level
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Data Transfer Objects (DTOs) for the presentation layer
//! - [`config`]: search settings from TOML and environment variables
//! - [`db`]: data store traits, the in-memory store and query policy
//! - [`models`]: domain types (catalog, windows, platforms, series)
//! - [`services`]: discovery logic and orchestration
//! - [`routes`]: route-specific data types and presentation helpers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
