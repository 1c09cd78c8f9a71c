//! Shareable page state in the URL query string.
//!
//! `?start_date=2001-04-01&end_date=2010-03-31&q=heat&site_code=48401&lat=14.8&lon=-51.0`
//!
//! Parsing never fails. Unknown keys are ignored, a repeated key keeps its first
//! value and a selection is only produced when `site_code`, `lat` and `lon` are
//! all present and the coordinates are numbers.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{QuestionId, Selection, TimeWindow};
use crate::services::reconciler::Trigger;

/// State restored from, or written to, the page URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLink {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub question: Option<QuestionId>,
    pub selection: Option<Selection>,
}

/// Wire form of the query string, in key order.
#[derive(Debug, Default, Serialize)]
struct RawLink<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lon: Option<String>,
}

impl DeepLink {
    /// Parse a query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let pairs: Vec<(String, String)> =
            match serde_urlencoded::from_str(query.trim_start_matches('?')) {
                Ok(pairs) => pairs,
                Err(e) => {
                    warn!("Ignoring malformed deep link '{}': {}", query, e);
                    return Self::default();
                }
            };
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let selection = match (first("site_code"), first("lat"), first("lon")) {
            (Some(site), Some(lat), Some(lon)) if !site.is_empty() => {
                match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                    (Ok(lat), Ok(lon)) => Some(Selection::new(site, lat, lon)),
                    _ => None,
                }
            }
            _ => None,
        };

        Self {
            start_date: first("start_date"),
            end_date: first("end_date"),
            question: first("q").filter(|q| !q.is_empty()).map(QuestionId::new),
            selection,
        }
    }

    /// State for the current window, question and selection.
    pub fn from_state(window: &TimeWindow, question: &QuestionId, selection: &Selection) -> Self {
        Self {
            start_date: Some(window.start_date()),
            end_date: Some(window.end_date()),
            question: Some(question.clone()),
            selection: Some(selection.clone()),
        }
    }

    /// Initial-range trigger for the reconciler.
    pub fn trigger(&self) -> Trigger {
        Trigger::DeepLink {
            start: self.start_date.clone(),
            end: self.end_date.clone(),
        }
    }

    /// Render as `?key=value&...` in the fixed key order shown in the module docs.
    pub fn to_query_string(&self) -> String {
        let raw = RawLink {
            start_date: self.start_date.as_deref(),
            end_date: self.end_date.as_deref(),
            q: self.question.as_ref().map(QuestionId::as_str),
            site_code: self.selection.as_ref().map(|s| s.site_code.as_str()),
            lat: self.selection.as_ref().map(|s| s.latitude.to_string()),
            lon: self.selection.as_ref().map(|s| s.longitude.to_string()),
        };
        match serde_urlencoded::to_string(&raw) {
            Ok(query) if !query.is_empty() => format!("?{}", query),
            Ok(_) => String::new(),
            Err(e) => {
                warn!("Failed to encode deep link: {}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_link() {
        let link = DeepLink::parse(
            "?start_date=2001-04-01&end_date=2010-03-31&q=heat&site_code=48401&lat=14.8&lon=-51.0",
        );
        assert_eq!(link.start_date.as_deref(), Some("2001-04-01"));
        assert_eq!(link.end_date.as_deref(), Some("2010-03-31"));
        assert_eq!(link.question, Some(QuestionId::from("heat")));
        let selection = link.selection.unwrap();
        assert_eq!(selection.site_code.as_str(), "48401");
        assert_eq!(selection.latitude, 14.8);
        assert_eq!(selection.longitude, -51.0);
    }

    #[test]
    fn test_selection_needs_all_three_keys() {
        let link = DeepLink::parse("site_code=48401&lat=14.8");
        assert!(link.selection.is_none());

        let link = DeepLink::parse("site_code=48401&lat=north&lon=3");
        assert!(link.selection.is_none());
    }

    #[test]
    fn test_empty_query() {
        let link = DeepLink::parse("");
        assert_eq!(link, DeepLink::default());
        assert_eq!(link.to_query_string(), "");
        assert_eq!(
            link.trigger(),
            Trigger::DeepLink {
                start: None,
                end: None
            }
        );
    }

    #[test]
    fn test_query_string_round_trip_with_escapes() {
        let link = DeepLink {
            start_date: Some("2001-04-01".into()),
            end_date: Some("2010-03-31".into()),
            question: Some(QuestionId::from("air & sea")),
            selection: Some(Selection::new("0N 165E", 0.0, 165.0)),
        };
        let query = link.to_query_string();
        assert!(query.starts_with("?start_date=2001-04-01&end_date=2010-03-31&q=air+%26+sea"));
        assert!(query.contains("site_code=0N+165E"));
        assert_eq!(DeepLink::parse(&query), link);
    }

    #[test]
    fn test_parse_decodes_escapes() {
        let link = DeepLink::parse("q=air+%26+sea&site_code=0N%20165E&lat=0&lon=165");
        assert_eq!(link.question, Some(QuestionId::from("air & sea")));
        assert_eq!(link.selection, Some(Selection::new("0N 165E", 0.0, 165.0)));
    }

    #[test]
    fn test_repeated_key_keeps_first_value() {
        let link = DeepLink::parse("q=heat&q=wind&start_date=2001-04-01");
        assert_eq!(link.question, Some(QuestionId::from("heat")));
        assert_eq!(link.start_date.as_deref(), Some("2001-04-01"));
    }

    #[test]
    fn test_key_without_value() {
        let link = DeepLink::parse("?q&start_date=2001-04-01");
        assert!(link.question.is_none());
        assert_eq!(link.start_date.as_deref(), Some("2001-04-01"));
    }
}
