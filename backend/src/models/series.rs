//! Time series as delivered by the data store and as prepared for plotting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::catalog::DatasetId;
use super::platform::SiteCode;
use super::time::Instant;

/// Per-platform sums of the requested variables over a time window.
///
/// A variable missing from `sums` counts as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumRow {
    pub site_code: SiteCode,
    pub sums: HashMap<String, f64>,
}

impl SumRow {
    pub fn new(site_code: impl Into<SiteCode>) -> Self {
        Self {
            site_code: site_code.into(),
            sums: HashMap::new(),
        }
    }

    pub fn with_sum(mut self, variable: impl Into<String>, sum: f64) -> Self {
        self.sums.insert(variable.into(), sum);
        self
    }

    pub fn sum(&self, variable: &str) -> f64 {
        self.sums.get(variable).copied().unwrap_or(0.0)
    }
}

/// One real measurement row; `values` lines up with the owning series' variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: Instant,
    pub values: Vec<Option<f64>>,
}

impl Observation {
    pub fn new(time: Instant, values: Vec<Option<f64>>) -> Self {
        Self { time, values }
    }

    /// Single-variable convenience constructor.
    pub fn scalar(time: Instant, value: f64) -> Self {
        Self {
            time,
            values: vec![Some(value)],
        }
    }
}

/// Time-ordered observations of one or more variables from one source at one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub source: DatasetId,
    pub site_code: SiteCode,
    pub variables: Vec<String>,
    pub rows: Vec<Observation>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row of a resampled series.
///
/// `Gap` rows exist only to break line interpolation and carry no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResampledRow {
    Observed(Observation),
    Gap { time: Instant },
}

impl ResampledRow {
    pub fn time(&self) -> Instant {
        match self {
            Self::Observed(observation) => observation.time,
            Self::Gap { time } => *time,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Self::Observed(_))
    }

    pub fn observation(&self) -> Option<&Observation> {
        match self {
            Self::Observed(observation) => Some(observation),
            Self::Gap { .. } => None,
        }
    }
}

/// A series with synthetic gap markers, safe to draw as connected lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledSeries {
    pub source: DatasetId,
    pub site_code: SiteCode,
    pub variables: Vec<String>,
    pub rows: Vec<ResampledRow>,
}

impl ResampledSeries {
    /// The real observations, in output order.
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.rows.iter().filter_map(ResampledRow::observation)
    }

    pub fn gap_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_real()).count()
    }
}
