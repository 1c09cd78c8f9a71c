//! Zoom-adaptive time axis ticks.
//!
//! The visible span picks one of four brackets. Each bracket fixes the tick
//! spacing, the calendar unit the first tick is aligned to and the label format:
//!
//! | span            | spacing  | origin         | label              |
//! |-----------------|----------|----------------|--------------------|
//! | up to 1 day     | 1 hour   | start of day   | `%H:%M\n%e-%b-%Y`  |
//! | up to 45 days   | 1 day    | start of month | `%e\n%b-%Y`        |
//! | up to 730 days  | 1 month  | start of year  | `%b\n%Y`           |
//! | longer          | 365 days | start of year  | `%Y`               |
//!
//! A span exactly on a boundary belongs to the finer bracket.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{Instant, TimeWindow};

pub const ONE_HOUR_MS: i64 = 60 * 60 * 1000;
pub const ONE_DAY_MS: i64 = 24 * ONE_HOUR_MS;

pub const HOURLY_FORMAT: &str = "%H:%M\n%e-%b-%Y";
pub const DAILY_FORMAT: &str = "%e\n%b-%Y";
pub const MONTHLY_FORMAT: &str = "%b\n%Y";
pub const YEARLY_FORMAT: &str = "%Y";

/// Distance between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSpacing {
    /// Fixed spacing in milliseconds.
    Millis(i64),
    /// Calendar months.
    Months(u32),
}

impl TickSpacing {
    /// Plotly `dtick` value: a number of milliseconds or `"M<n>"`.
    pub fn dtick(&self) -> Value {
        match self {
            Self::Millis(ms) => json!(ms),
            Self::Months(n) => json!(format!("M{}", n)),
        }
    }
}

/// Tick origin, spacing and label format for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSpec {
    pub origin: Instant,
    pub spacing: TickSpacing,
    pub label_format: &'static str,
}

impl TickSpec {
    /// Axis properties in the form the chart expects.
    pub fn axis_update(&self) -> Value {
        json!({
            "tick0": self.origin.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "dtick": self.spacing.dtick(),
            "tickformat": self.label_format,
        })
    }
}

/// Choose ticks for a visible span starting at `anchor`.
pub fn select_ticks(span: Duration, anchor: Instant) -> TickSpec {
    if span <= Duration::days(1) {
        TickSpec {
            origin: start_of_day(anchor),
            spacing: TickSpacing::Millis(ONE_HOUR_MS),
            label_format: HOURLY_FORMAT,
        }
    } else if span <= Duration::days(45) {
        TickSpec {
            origin: start_of_month(anchor),
            spacing: TickSpacing::Millis(ONE_DAY_MS),
            label_format: DAILY_FORMAT,
        }
    } else if span <= Duration::days(730) {
        TickSpec {
            origin: start_of_year(anchor),
            spacing: TickSpacing::Months(1),
            label_format: MONTHLY_FORMAT,
        }
    } else {
        TickSpec {
            origin: start_of_year(anchor),
            spacing: TickSpacing::Millis(365 * ONE_DAY_MS),
            label_format: YEARLY_FORMAT,
        }
    }
}

fn midnight(date: Option<NaiveDate>, fallback: Instant) -> Instant {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(fallback)
}

fn start_of_day(anchor: Instant) -> Instant {
    midnight(Some(anchor.date_naive()), anchor)
}

fn start_of_month(anchor: Instant) -> Instant {
    midnight(NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1), anchor)
}

fn start_of_year(anchor: Instant) -> Instant {
    midnight(NaiveDate::from_ymd_opt(anchor.year(), 1, 1), anchor)
}

/// A relayout notification from the time-series chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoomEvent {
    /// The user zoomed or panned to an explicit range.
    Range { start: Instant, end: Instant },
    /// The user reset the axis to show all data.
    AutoRange,
    /// Anything that does not touch the time axis.
    Other,
}

impl ZoomEvent {
    /// Interpret the chart's relayout payload.
    ///
    /// ```
    /// use flux_discovery::services::ticks::ZoomEvent;
    ///
    /// let event = ZoomEvent::from_relayout(&serde_json::json!({
    ///     "xaxis.range[0]": "2005-01-01 00:00:00",
    ///     "xaxis.range[1]": "2005-01-03 12:00:00.5",
    /// }));
    /// assert!(matches!(event, ZoomEvent::Range { .. }));
    /// ```
    pub fn from_relayout(payload: &Value) -> Self {
        let bound = |key: &str| payload.get(key).and_then(Value::as_str).and_then(parse_axis_time);
        match (bound("xaxis.range[0]"), bound("xaxis.range[1]")) {
            (Some(a), Some(b)) => Self::Range {
                start: a.min(b),
                end: a.max(b),
            },
            _ if payload.get("xaxis.autorange").is_some() => Self::AutoRange,
            _ => Self::Other,
        }
    }
}

fn parse_axis_time(raw: &str) -> Option<Instant> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Ticks after a zoom event. `None` means the axis should be left alone.
///
/// A range uses the visible span; an autorange reset goes back to the span of
/// the whole plotted window.
pub fn ticks_for_zoom(event: &ZoomEvent, data_window: &TimeWindow) -> Option<TickSpec> {
    match event {
        ZoomEvent::Range { start, end } => Some(select_ticks(*end - *start, *start)),
        ZoomEvent::AutoRange => Some(select_ticks(data_window.span(), data_window.start)),
        ZoomEvent::Other => None,
    }
}

/// Label format for one range of tick spacings on the multi-panel plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickFormatStop {
    /// `[from, to]`; `null` leaves the upper end open.
    pub dtickrange: [Value; 2],
    pub value: &'static str,
}

/// Static zoom-level label formats used when the chart picks its own spacing.
pub fn tick_format_stops() -> Vec<TickFormatStop> {
    let stop = |from: Value, to: Value, value: &'static str| TickFormatStop {
        dtickrange: [from, to],
        value,
    };
    vec![
        stop(json!(1000), json!(60_000), "%H:%M:%S\n%d%b%Y"),
        stop(json!(60_000), json!(ONE_HOUR_MS), "%H:%M\n%d%b%Y"),
        stop(json!(ONE_HOUR_MS), json!(ONE_DAY_MS), "%H:%M\n%d%b%Y"),
        stop(json!(ONE_DAY_MS), json!(7 * ONE_DAY_MS), "%e\n%b %Y"),
        stop(json!(7 * ONE_DAY_MS), json!("M1"), MONTHLY_FORMAT),
        stop(json!("M1"), json!("M12"), MONTHLY_FORMAT),
        stop(json!("M12"), Value::Null, YEARLY_FORMAT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Instant {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_hourly_bracket() {
        let spec = select_ticks(Duration::hours(6), at(2005, 3, 14, 9));
        assert_eq!(spec.origin, at(2005, 3, 14, 0));
        assert_eq!(spec.spacing, TickSpacing::Millis(ONE_HOUR_MS));
        assert_eq!(spec.label_format, HOURLY_FORMAT);
    }

    #[test]
    fn test_boundaries_take_finer_bracket() {
        let anchor = at(2005, 3, 14, 9);
        assert_eq!(select_ticks(Duration::days(1), anchor).label_format, HOURLY_FORMAT);
        assert_eq!(select_ticks(Duration::days(45), anchor).label_format, DAILY_FORMAT);
        assert_eq!(select_ticks(Duration::days(730), anchor).label_format, MONTHLY_FORMAT);
        assert_eq!(
            select_ticks(Duration::days(730) + Duration::milliseconds(1), anchor).label_format,
            YEARLY_FORMAT
        );
    }

    #[test]
    fn test_daily_aligns_to_month() {
        let spec = select_ticks(Duration::days(10), at(2005, 3, 14, 9));
        assert_eq!(spec.origin, at(2005, 3, 1, 0));
        assert_eq!(spec.spacing.dtick(), json!(ONE_DAY_MS));
    }

    #[test]
    fn test_monthly_and_yearly_align_to_year() {
        let anchor = at(2005, 3, 14, 9);
        let monthly = select_ticks(Duration::days(200), anchor);
        assert_eq!(monthly.origin, at(2005, 1, 1, 0));
        assert_eq!(monthly.spacing.dtick(), json!("M1"));

        let yearly = select_ticks(Duration::days(3000), anchor);
        assert_eq!(yearly.origin, at(2005, 1, 1, 0));
        assert_eq!(yearly.spacing, TickSpacing::Millis(365 * ONE_DAY_MS));
    }

    #[test]
    fn test_select_ticks_is_idempotent() {
        let anchor = at(2008, 11, 30, 23);
        for days in [0, 1, 2, 44, 45, 46, 400, 730, 731, 5000] {
            let span = Duration::days(days);
            assert_eq!(select_ticks(span, anchor), select_ticks(span, anchor));
        }
    }

    #[test]
    fn test_axis_update_shape() {
        let update = select_ticks(Duration::days(100), at(2005, 6, 1, 0)).axis_update();
        assert_eq!(update["tick0"], "2005-01-01T00:00:00");
        assert_eq!(update["dtick"], "M1");
        assert_eq!(update["tickformat"], "%b\n%Y");
    }

    #[test]
    fn test_zoom_range_and_autorange() {
        let data = TimeWindow::new(at(2001, 4, 1, 0), at(2010, 3, 31, 0)).unwrap();

        let zoom = ZoomEvent::from_relayout(&json!({
            "xaxis.range[0]": "2005-01-01 00:00:00",
            "xaxis.range[1]": "2005-01-01 12:00:00",
        }));
        let spec = ticks_for_zoom(&zoom, &data).unwrap();
        assert_eq!(spec.label_format, HOURLY_FORMAT);

        let reset = ZoomEvent::from_relayout(&json!({"xaxis.autorange": true}));
        assert_eq!(reset, ZoomEvent::AutoRange);
        assert_eq!(ticks_for_zoom(&reset, &data).unwrap().label_format, YEARLY_FORMAT);

        let other = ZoomEvent::from_relayout(&json!({"dragmode": "pan"}));
        assert!(ticks_for_zoom(&other, &data).is_none());
    }

    #[test]
    fn test_format_stops_cover_all_zoom_levels() {
        let stops = tick_format_stops();
        assert_eq!(stops.len(), 7);
        assert_eq!(stops[0].dtickrange[0], json!(1000));
        assert_eq!(stops[6].dtickrange[1], Value::Null);
        assert_eq!(stops[6].value, "%Y");
    }
}
