use serde::Serialize;

use crate::models::{DatasetId, ResampledSeries};
use crate::services::availability::SourceFailure;
use crate::services::ticks::{TickFormatStop, TickSpec};

// =========================================================
// Plot types + route
// =========================================================

/// One stacked panel: the selected platform as seen by one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct PlotPanel {
    pub source: DatasetId,
    /// Dataset title, shown under the panel.
    pub dataset_title: String,
    /// Site code, plus a note when the series was sub-sampled.
    pub subtitle: String,
    /// Legend group name: `legend`, `legend2`, ...
    pub legend: String,
    pub variables: Vec<String>,
    /// Variable names with units, one per variable.
    pub legend_labels: Vec<String>,
    pub subsampled_to: Option<usize>,
    pub series: ResampledSeries,
    pub ticks: TickSpec,
}

/// Download links for one panel's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRow {
    pub title: String,
    pub erddap: String,
    pub html: String,
    pub csv: String,
    pub netcdf: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotResponse {
    pub title: String,
    /// Set when there is nothing to plot.
    pub message: Option<String>,
    pub panels: Vec<PlotPanel>,
    pub downloads: Vec<DownloadRow>,
    pub download_enabled: bool,
    /// Deep link for the plotted state, empty when nothing was plotted.
    pub query_string: String,
    pub tick_format_stops: Vec<TickFormatStop>,
    pub failed_sources: Vec<SourceFailure>,
}

impl PlotResponse {
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

pub const GET_PLOT: &str = "get_plot";
