//! Search and plot settings.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file with a `[search]` table
//! 3. `FLUX_*` environment variables
//!
//! ```toml
//! [search]
//! worker_limit = 4
//! query_timeout_ms = 10000
//! subsample_seed = 42
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::repository::RepositoryError;

pub const ENV_WORKER_LIMIT: &str = "FLUX_WORKER_LIMIT";
pub const ENV_QUERY_TIMEOUT_MS: &str = "FLUX_QUERY_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "FLUX_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "FLUX_RETRY_DELAY_MS";
pub const ENV_SUBSAMPLE_LIMIT: &str = "FLUX_SUBSAMPLE_LIMIT";
pub const ENV_SUBSAMPLE_SEED: &str = "FLUX_SUBSAMPLE_SEED";

/// Settings file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub search: SearchSettings,
}

/// Tunables for the availability search and the plot orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Maximum number of source queries in flight at once.
    #[serde(default = "default_worker_limit")]
    pub worker_limit: usize,
    /// Per-query timeout; a query that exceeds it counts as a failed source.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Series longer than this are randomly sub-sampled before plotting.
    #[serde(default = "default_subsample_limit")]
    pub subsample_limit: usize,
    /// Fixed seed for sub-sampling. Unseeded when absent.
    #[serde(default)]
    pub subsample_seed: Option<u64>,
    /// Resampling interval for datasets that do not declare one.
    #[serde(default = "default_sampling_interval_secs")]
    pub default_sampling_interval_secs: i64,
}

fn default_worker_limit() -> usize {
    8
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_subsample_limit() -> usize {
    88_000
}

fn default_sampling_interval_secs() -> i64 {
    3600
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            worker_limit: default_worker_limit(),
            query_timeout_ms: default_query_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            subsample_limit: default_subsample_limit(),
            subsample_seed: None,
            default_sampling_interval_secs: default_sampling_interval_secs(),
        }
    }
}

impl SearchSettings {
    /// Load settings from a TOML file and validate them.
    ///
    /// # Returns
    /// * `Ok(SearchSettings)` if successful
    /// * `Err(RepositoryError)` if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text. A missing `[search]` table yields defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        let config: DiscoveryConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.search.validate()?;
        Ok(config.search)
    }

    /// Load settings from the default location.
    ///
    /// Searches for `discovery.toml` in the current directory, then `backend/`,
    /// then the parent directory.
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("discovery.toml"),
            PathBuf::from("backend/discovery.toml"),
            PathBuf::from("../discovery.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No discovery.toml found in standard locations",
        ))
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, RepositoryError> {
        Self::default().apply_env()
    }

    /// Override fields from `FLUX_*` environment variables that are set.
    pub fn apply_env(mut self) -> Result<Self, RepositoryError> {
        if let Some(v) = env_value(ENV_WORKER_LIMIT)? {
            self.worker_limit = v;
        }
        if let Some(v) = env_value(ENV_QUERY_TIMEOUT_MS)? {
            self.query_timeout_ms = v;
        }
        if let Some(v) = env_value(ENV_MAX_RETRIES)? {
            self.max_retries = v;
        }
        if let Some(v) = env_value(ENV_RETRY_DELAY_MS)? {
            self.retry_delay_ms = v;
        }
        if let Some(v) = env_value(ENV_SUBSAMPLE_LIMIT)? {
            self.subsample_limit = v;
        }
        if let Some(v) = env_value(ENV_SUBSAMPLE_SEED)? {
            self.subsample_seed = Some(v);
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings the search engine cannot run with.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.worker_limit == 0 {
            return Err(RepositoryError::configuration(
                "worker_limit must be at least 1",
            ));
        }
        if self.query_timeout_ms == 0 {
            return Err(RepositoryError::configuration(
                "query_timeout_ms must be positive",
            ));
        }
        if self.subsample_limit == 0 {
            return Err(RepositoryError::configuration(
                "subsample_limit must be at least 1",
            ));
        }
        if self.default_sampling_interval_secs <= 0 {
            return Err(RepositoryError::configuration(
                "default_sampling_interval_secs must be positive",
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.query_timeout_ms)
    }

    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_delay_ms)
    }
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, RepositoryError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            RepositoryError::configuration(format!("Invalid value for {}: '{}'", key, raw))
        }),
        Err(_) => Ok(None),
    }
}
