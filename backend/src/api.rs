//! Public API surface of the discovery core.
//!
//! This file consolidates the DTO types exchanged with the presentation layer.
//! All types derive Serialize for JSON serialization.

pub use crate::db::models::DatasetInfo;
pub use crate::models::{
    DatasetId, GlobalExtent, Location, PlatformColor, PlatformStatus, QuestionId, ResampledRow,
    ResampledSeries, Selection, SiteCode, TimeWindow,
};
pub use crate::routes::discovery::DateRangeControls;
pub use crate::routes::discovery::QuestionOption;
pub use crate::routes::map::MapCenter;
pub use crate::routes::map::MapLayers;
pub use crate::routes::map::MapMarker;
pub use crate::routes::map::MapView;
pub use crate::routes::plot::DownloadRow;
pub use crate::routes::plot::PlotPanel;
pub use crate::routes::plot::PlotResponse;
pub use crate::services::availability::SearchOutcome;
pub use crate::services::availability::SourceFailure;
pub use crate::services::reconciler::Reconciled;
pub use crate::services::reconciler::SliderMark;
pub use crate::services::reconciler::Trigger;
pub use crate::services::search_tracker::SearchToken;
pub use crate::services::ticks::TickFormatStop;
pub use crate::services::ticks::TickSpec;
