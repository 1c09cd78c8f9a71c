//! Service layer for business logic and orchestration.
//!
//! Services sit between the data store and the presentation layer. The pure
//! pieces (reconciler, resampler, ticks, deep links) never touch the store; the
//! availability search and the plot orchestrator drive it through
//! [`crate::db::DataStore`].

pub mod availability;
pub mod deep_link;
pub mod discovery;
pub mod plot;
pub mod reconciler;
pub mod resampler;
pub mod search_tracker;
pub mod ticks;

#[cfg(test)]
#[path = "resampler_tests.rs"]
mod resampler_tests;

pub use availability::{search, JoinPredicate, SearchOutcome, SourceFailure};
pub use deep_link::DeepLink;
pub use discovery::{Discovery, InitialState};
pub use plot::build_plot;
pub use reconciler::{reconcile, time_marks, Reconciled, SliderMark, Trigger};
pub use resampler::resample;
pub use search_tracker::{SearchToken, SearchTracker};
pub use ticks::{select_ticks, ticks_for_zoom, TickSpec, ZoomEvent};
