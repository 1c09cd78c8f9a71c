use serde::{Deserialize, Serialize};

use crate::models::{Catalog, GlobalExtent, QuestionId};
use crate::services::reconciler::{time_marks, Reconciled, SliderMark, MONTH_STEP_SECS};

// =========================================================
// Question selector + date range controls
// =========================================================

/// One entry of the question dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub value: QuestionId,
}

/// Dropdown options in catalog order.
pub fn get_question_options(catalog: &Catalog) -> Vec<QuestionOption> {
    catalog
        .questions()
        .iter()
        .map(|q| QuestionOption {
            label: q.label.clone(),
            value: q.id.clone(),
        })
        .collect()
}

/// Everything the range slider and the two date fields display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeControls {
    pub min: i64,
    pub max: i64,
    pub step: i64,
    pub marks: Vec<SliderMark>,
    pub value: (i64, i64),
    pub start_date: String,
    pub end_date: String,
}

impl DateRangeControls {
    pub fn new(extent: &GlobalExtent, range: &Reconciled) -> Self {
        Self {
            min: extent.min.timestamp(),
            max: extent.max.timestamp(),
            step: MONTH_STEP_SECS,
            marks: time_marks(extent),
            value: range.slider,
            start_date: range.start_display.clone(),
            end_date: range.end_display.clone(),
        }
    }
}

pub const GET_QUESTION_OPTIONS: &str = "get_question_options";
pub const GET_DATE_RANGE: &str = "get_date_range";
pub const OPEN_LINK: &str = "open_link";
pub const SEARCH_PLATFORMS: &str = "search_platforms";
