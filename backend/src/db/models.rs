//! Shared data models re-exported for database layer consumers.

use std::collections::HashMap;

pub use crate::models::{
    DatasetId, GlobalExtent, Instant, Location, Observation, Series, SiteCode, SumRow, TimeWindow,
};

/// Descriptive metadata for one dataset (data source).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetInfo {
    pub id: DatasetId,
    /// Human readable title shown under each plot panel.
    pub title: String,
    /// Base URL of the dataset on its data server (no file extension).
    pub url: String,
    /// Units keyed by variable short name.
    #[serde(default)]
    pub units: HashMap<String, String>,
    /// Expected spacing between observations, if the dataset declares one.
    #[serde(default)]
    pub sampling_interval_secs: Option<i64>,
    /// First instant with data.
    pub start: Instant,
    /// Last instant with data.
    pub end: Instant,
}

impl DatasetInfo {
    pub fn new(
        id: impl Into<DatasetId>,
        title: impl Into<String>,
        url: impl Into<String>,
        start: Instant,
        end: Instant,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            units: HashMap::new(),
            sampling_interval_secs: None,
            start,
            end,
        }
    }

    pub fn with_unit(mut self, variable: impl Into<String>, unit: impl Into<String>) -> Self {
        self.units.insert(variable.into(), unit.into());
        self
    }

    pub fn with_sampling_interval_secs(mut self, seconds: i64) -> Self {
        self.sampling_interval_secs = Some(seconds);
        self
    }

    /// Legend label: the variable followed by its unit when one is known.
    pub fn label_for(&self, variable: &str) -> String {
        match self.units.get(variable) {
            Some(unit) => format!("{} ({})", variable, unit),
            None => variable.to_string(),
        }
    }
}
