//! Instants, date strings and time windows.
//!
//! All instants are UTC. Date fields exchanged with the presentation layer use
//! the `%Y-%m-%d` format and denote midnight of that day.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A point in time.
pub type Instant = DateTime<Utc>;

/// Date format shared by the text fields, deep links and query strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `%Y-%m-%d` date string into midnight UTC of that day.
///
/// Surrounding whitespace is ignored. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<Instant> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

/// Format the calendar date of an instant.
pub fn format_date(instant: Instant) -> String {
    instant.format(DATE_FORMAT).to_string()
}

/// Instant from whole seconds since the Unix epoch.
pub fn from_epoch_seconds(seconds: i64) -> Option<Instant> {
    DateTime::from_timestamp(seconds, 0)
}

/// The union of all known data extents; every valid window lies inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalExtent {
    pub min: Instant,
    pub max: Instant,
}

impl GlobalExtent {
    /// Create an extent, rejecting an inverted range.
    pub fn new(min: Instant, max: Instant) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    /// Smallest extent covering every `(start, end)` pair.
    pub fn union<I>(ranges: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Instant, Instant)>,
    {
        ranges
            .into_iter()
            .filter(|(start, end)| start <= end)
            .fold(None, |acc: Option<Self>, (start, end)| match acc {
                None => Some(Self { min: start, max: end }),
                Some(extent) => Some(Self {
                    min: extent.min.min(start),
                    max: extent.max.max(end),
                }),
            })
    }

    /// Clamp an instant into the extent.
    pub fn clamp(&self, instant: Instant) -> Instant {
        instant.clamp(self.min, self.max)
    }

    pub fn contains(&self, instant: Instant) -> bool {
        self.min <= instant && instant <= self.max
    }

    /// Window covering the whole extent.
    pub fn full_window(&self) -> TimeWindow {
        TimeWindow {
            start: self.min,
            end: self.max,
        }
    }
}

/// Canonical `[start, end]` range currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Instant,
    pub end: Instant,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: Instant, end: Instant) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn span(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: Instant) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn start_date(&self) -> String {
        format_date(self.start)
    }

    pub fn end_date(&self) -> String {
        format_date(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> Instant {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(parse_date("2001-04-01"), Some(at(2001, 4, 1)));
        assert_eq!(parse_date("  2010-03-31 "), Some(at(2010, 3, 31)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2001/04/01"), None);
        assert_eq!(parse_date("2001-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_format_date_drops_time_of_day() {
        let instant = Utc.with_ymd_and_hms(2005, 7, 9, 18, 30, 0).unwrap();
        assert_eq!(format_date(instant), "2005-07-09");
    }

    #[test]
    fn test_extent_rejects_inverted_range() {
        assert!(GlobalExtent::new(at(2010, 1, 1), at(2000, 1, 1)).is_none());
        assert!(GlobalExtent::new(at(2000, 1, 1), at(2000, 1, 1)).is_some());
    }

    #[test]
    fn test_extent_union() {
        let extent = GlobalExtent::union(vec![
            (at(2003, 1, 1), at(2005, 1, 1)),
            (at(2001, 6, 1), at(2004, 1, 1)),
            (at(2009, 1, 1), at(2008, 1, 1)), // inverted, ignored
        ])
        .unwrap();
        assert_eq!(extent.min, at(2001, 6, 1));
        assert_eq!(extent.max, at(2005, 1, 1));
        assert!(GlobalExtent::union(Vec::new()).is_none());
    }

    #[test]
    fn test_extent_clamp() {
        let extent = GlobalExtent::new(at(2001, 1, 1), at(2002, 1, 1)).unwrap();
        assert_eq!(extent.clamp(at(1999, 1, 1)), at(2001, 1, 1));
        assert_eq!(extent.clamp(at(2003, 1, 1)), at(2002, 1, 1));
        assert_eq!(extent.clamp(at(2001, 5, 5)), at(2001, 5, 5));
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = TimeWindow::new(at(2001, 1, 1), at(2001, 1, 31)).unwrap();
        assert!(window.contains(at(2001, 1, 1)));
        assert!(window.contains(at(2001, 1, 31)));
        assert!(!window.contains(at(2001, 2, 1)));
        assert_eq!(window.span(), chrono::Duration::days(30));
    }
}
