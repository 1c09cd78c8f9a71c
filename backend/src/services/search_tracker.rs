//! Stale-result guard for overlapping searches.
//!
//! Every search takes a token from [`SearchTracker::begin`]. When it finishes,
//! its outcome is only stored if no newer search has begun in the meantime, so
//! a slow search for an old window can never overwrite the result for the
//! window the user is looking at now.

use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::services::availability::SearchOutcome;

crate::define_id_type!(u64, SearchToken);

#[derive(Default)]
struct TrackerState {
    latest: u64,
    current: Option<(SearchToken, SearchOutcome)>,
}

/// In-memory tracker of the most recent search.
#[derive(Clone, Default)]
pub struct SearchTracker {
    state: Arc<RwLock<TrackerState>>,
}

impl SearchTracker {
    /// Create a new tracker with no searches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search and return its token. Tokens increase monotonically.
    pub fn begin(&self) -> SearchToken {
        let mut state = self.state.write();
        state.latest += 1;
        SearchToken(state.latest)
    }

    /// Whether `token` belongs to the newest search begun so far.
    pub fn is_latest(&self, token: SearchToken) -> bool {
        self.state.read().latest == token.0
    }

    /// Store the outcome of a finished search.
    ///
    /// Returns `false`, and drops the outcome, when a newer search has begun.
    pub fn complete(&self, token: SearchToken, outcome: SearchOutcome) -> bool {
        let mut state = self.state.write();
        if state.latest != token.0 {
            debug!(
                "Search {} finished after search {} began, discarding",
                token, state.latest
            );
            return false;
        }
        state.current = Some((token, outcome));
        true
    }

    /// The most recently applied outcome.
    pub fn current(&self) -> Option<SearchOutcome> {
        self.state
            .read()
            .current
            .as_ref()
            .map(|(_, outcome)| outcome.clone())
    }

    /// Token of the most recently applied outcome.
    pub fn current_token(&self) -> Option<SearchToken> {
        self.state.read().current.as_ref().map(|(token, _)| *token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;
    use chrono::{TimeZone, Utc};

    fn outcome(year: i32) -> SearchOutcome {
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        SearchOutcome {
            question: None,
            window: TimeWindow::new(start, start).unwrap(),
            active: Vec::new(),
            inactive: Vec::new(),
            failed_sources: Vec::new(),
        }
    }

    #[test]
    fn test_tokens_are_monotonic() {
        let tracker = SearchTracker::new();
        let a = tracker.begin();
        let b = tracker.begin();
        assert!(b > a);
        assert!(tracker.is_latest(b));
        assert!(!tracker.is_latest(a));
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let tracker = SearchTracker::new();
        let old = tracker.begin();
        let new = tracker.begin();

        assert!(tracker.complete(new, outcome(2005)));
        assert!(!tracker.complete(old, outcome(2001)));

        assert_eq!(tracker.current(), Some(outcome(2005)));
        assert_eq!(tracker.current_token(), Some(new));
    }

    #[test]
    fn test_nothing_applied_initially() {
        let tracker = SearchTracker::new();
        assert!(tracker.current().is_none());
        assert!(tracker.current_token().is_none());
    }
}
