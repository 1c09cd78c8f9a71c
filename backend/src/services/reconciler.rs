//! Date-range reconciliation.
//!
//! Three inputs describe the same window: a range slider (epoch seconds), two
//! free-text date fields and the initial range carried by a deep link. Whichever
//! of them changed is passed as a [`Trigger`]; [`reconcile`] returns the single
//! canonical window together with the values every input should now show.
//!
//! Malformed input is never an error. An unparsable field falls back to the
//! bound it was meant to replace.

use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{format_date, from_epoch_seconds, parse_date, GlobalExtent, Instant, TimeWindow};

/// Slider step: one "month" of 30.25 days.
pub const MONTH_STEP_SECS: i64 = 60 * 60 * 24 * 30 + 60 * 60 * 6;

/// Which input changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum Trigger {
    /// Both slider handles, in epoch seconds.
    Slider { start: i64, end: i64 },
    /// New text of the start date field.
    StartField(String),
    /// New text of the end date field.
    EndField(String),
    /// Initial range from the page URL.
    DeepLink {
        start: Option<String>,
        end: Option<String>,
    },
}

/// Canonical window and the presentation of it for each input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciled {
    pub window: TimeWindow,
    pub start_display: String,
    pub end_display: String,
    /// Slider handles in epoch seconds.
    pub slider: (i64, i64),
}

impl Reconciled {
    fn from_bounds(start: Instant, end: Instant) -> Self {
        Self {
            window: TimeWindow { start, end },
            start_display: format_date(start),
            end_display: format_date(end),
            slider: (start.timestamp(), end.timestamp()),
        }
    }
}

/// A labelled tick on the range slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderMark {
    pub value: i64,
    pub label: String,
}

/// Apply one input change to the previous window.
///
/// The result always satisfies `start <= end` with both bounds inside `extent`.
/// When an edited field crosses the other bound, the edited value is kept and the
/// other bound is moved onto it.
pub fn reconcile(extent: &GlobalExtent, previous: &TimeWindow, trigger: &Trigger) -> Reconciled {
    let current_start = extent.clamp(previous.start);
    let current_end = extent.clamp(previous.end).max(current_start);

    match trigger {
        Trigger::DeepLink { start, end } => {
            let start = start
                .as_deref()
                .and_then(parse_date)
                .map(|s| extent.clamp(s))
                .unwrap_or(extent.min);
            let end = end
                .as_deref()
                .and_then(parse_date)
                .map(|e| extent.clamp(e))
                .unwrap_or(extent.max);
            Reconciled::from_bounds(start, end.max(start))
        }
        Trigger::StartField(raw) => {
            let start = extent.clamp(parse_date(raw).unwrap_or(current_start));
            Reconciled::from_bounds(start, current_end.max(start))
        }
        Trigger::EndField(raw) => {
            let end = extent.clamp(parse_date(raw).unwrap_or(current_end));
            Reconciled::from_bounds(current_start.min(end), end)
        }
        Trigger::Slider { start, end } => {
            let a = from_epoch_seconds(*start)
                .map(|s| extent.clamp(s))
                .unwrap_or(current_start);
            let b = from_epoch_seconds(*end)
                .map(|e| extent.clamp(e))
                .unwrap_or(current_end);
            Reconciled::from_bounds(a.min(b), a.max(b))
        }
    }
}

/// One mark per new year inside the extent, labelled with the year.
pub fn time_marks(extent: &GlobalExtent) -> Vec<SliderMark> {
    (extent.min.year()..=extent.max.year())
        .filter_map(|year| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single())
        .filter(|instant| extent.contains(*instant))
        .map(|instant| SliderMark {
            value: instant.timestamp(),
            label: instant.year().to_string(),
        })
        .collect()
}
