//! Availability search: which platforms have data for a question in a window.
//!
//! Each search group of the question is checked against each of its sources.
//! The store returns per-platform sums of the group's variables over the window
//! and the group's [`JoinPredicate`] decides, platform by platform, whether the
//! data is there. Every location a source knows that no group marked as having
//! data ends up in the inactive set.
//!
//! Sources are queried concurrently with at most `worker_limit` queries in
//! flight. A source that fails or times out only loses its own contribution: its
//! platforms are reported as inactive and the source is listed in
//! [`SearchOutcome::failed_sources`].

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant as Clock;

use crate::config::SearchSettings;
use crate::db::repository::{DataStore, RepositoryError, RepositoryResult};
use crate::db::services::guarded_query;
use crate::models::{
    DatasetId, JoinType, Location, PlatformStatus, Question, QuestionId, SearchGroup, SiteCode,
    SumRow, TimeWindow,
};

/// Per-platform "has data" test for one search group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "variables", rename_all = "snake_case")]
pub enum JoinPredicate {
    /// Every variable's sum is positive on its own.
    AllPositive(Vec<String>),
    /// The total over all variables is positive.
    AnySumPositive(Vec<String>),
}

impl JoinPredicate {
    pub fn for_group(group: &SearchGroup) -> Self {
        match group.join {
            JoinType::And => Self::AllPositive(group.variables.clone()),
            JoinType::Or => Self::AnySumPositive(group.variables.clone()),
        }
    }

    pub fn variables(&self) -> &[String] {
        match self {
            Self::AllPositive(vars) | Self::AnySumPositive(vars) => vars,
        }
    }

    /// Missing variables count as a zero sum.
    pub fn evaluate(&self, row: &SumRow) -> bool {
        match self {
            Self::AllPositive(vars) => vars.iter().all(|v| row.sum(v) > 0.0),
            Self::AnySumPositive(vars) => vars.iter().map(|v| row.sum(v)).sum::<f64>() > 0.0,
        }
    }
}

/// A source whose contribution was dropped from a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: DatasetId,
    pub operation: String,
    pub message: String,
    pub timed_out: bool,
}

impl SourceFailure {
    pub(crate) fn from_error(source: &DatasetId, operation: &str, error: &RepositoryError) -> Self {
        Self {
            source: source.clone(),
            operation: operation.to_string(),
            message: error.to_string(),
            timed_out: matches!(error, RepositoryError::TimeoutError { .. }),
        }
    }
}

/// Partition of the known platforms for one window and question.
///
/// Both sets are sorted by `(source, site_code)`; the order carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub question: Option<QuestionId>,
    pub window: TimeWindow,
    pub active: Vec<PlatformStatus>,
    pub inactive: Vec<PlatformStatus>,
    pub failed_sources: Vec<SourceFailure>,
}

impl SearchOutcome {
    /// At least one source could not be searched.
    pub fn is_degraded(&self) -> bool {
        !self.failed_sources.is_empty()
    }

    pub fn is_active(&self, source: &DatasetId, site_code: &SiteCode) -> bool {
        self.active
            .iter()
            .any(|p| &p.source == source && &p.site_code == site_code)
    }

    /// Sources in which a platform has data, in dataset order.
    pub fn active_sources_for(&self, site_code: &SiteCode) -> Vec<DatasetId> {
        self.active
            .iter()
            .filter(|p| &p.site_code == site_code)
            .map(|p| p.source.clone())
            .collect()
    }
}

struct GroupQuery<'a> {
    group_index: usize,
    source_index: usize,
    source: &'a DatasetId,
    predicate: JoinPredicate,
}

/// Partition every platform known to the searched sources.
///
/// Without a question nothing is counted: every platform of every source in
/// `known_sources` is returned as inactive.
pub async fn search(
    store: &dyn DataStore,
    settings: &SearchSettings,
    window: &TimeWindow,
    question: Option<&Question>,
    known_sources: &[DatasetId],
) -> SearchOutcome {
    let started = Clock::now();
    let sources: Vec<DatasetId> = match question {
        Some(q) => q.datasets(),
        None => known_sources.to_vec(),
    };

    let mut failures: BTreeMap<DatasetId, SourceFailure> = BTreeMap::new();
    let locations = fetch_locations(store, settings, &sources, &mut failures).await;

    let mut active: BTreeMap<(DatasetId, SiteCode), PlatformStatus> = BTreeMap::new();
    let mut inactive: BTreeMap<(DatasetId, SiteCode), PlatformStatus> = BTreeMap::new();

    match question {
        None => {
            for (source, locs) in &locations {
                for location in locs {
                    let status = PlatformStatus::from_location(location, source, false);
                    inactive.insert(status.key(), status);
                }
            }
        }
        Some(question) => {
            let queries: Vec<GroupQuery<'_>> = question
                .groups
                .iter()
                .enumerate()
                .flat_map(|(group_index, group)| {
                    group
                        .sources
                        .iter()
                        .enumerate()
                        .map(move |(source_index, source)| GroupQuery {
                            group_index,
                            source_index,
                            source: &source.dataset,
                            predicate: JoinPredicate::for_group(group),
                        })
                })
                .collect();

            let mut results = run_sum_queries(store, settings, window, queries).await;
            results.sort_by_key(|(q, _)| (q.group_index, q.source_index));

            for (query, result) in results {
                let Some(locs) = locations.get(query.source) else {
                    continue;
                };
                let rows: HashMap<&SiteCode, &SumRow> = match &result {
                    Ok(rows) => {
                        debug!(
                            "Search: {} returned {} platform sums for {:?}",
                            query.source,
                            rows.len(),
                            query.predicate
                        );
                        rows.iter().map(|r| (&r.site_code, r)).collect()
                    }
                    Err(e) => {
                        warn!("Search: source {} failed, treating as no data: {}", query.source, e);
                        failures
                            .entry(query.source.clone())
                            .or_insert_with(|| SourceFailure::from_error(query.source, "query_sums", e));
                        HashMap::new()
                    }
                };

                for location in locs {
                    let has_data = rows
                        .get(&location.site_code)
                        .is_some_and(|row| query.predicate.evaluate(row));
                    let status = PlatformStatus::from_location(location, query.source, has_data);
                    if has_data {
                        active.insert(status.key(), status);
                    } else {
                        inactive.insert(status.key(), status);
                    }
                }
            }
        }
    }

    inactive.retain(|key, _| !active.contains_key(key));

    let outcome = SearchOutcome {
        question: question.map(|q| q.id.clone()),
        window: *window,
        active: active.into_values().collect(),
        inactive: inactive.into_values().collect(),
        failed_sources: failures.into_values().collect(),
    };
    info!(
        "Search: question {} over {} sources in {} ms: {} active, {} inactive, {} failed",
        outcome
            .question
            .as_ref()
            .map(|q| q.to_string())
            .unwrap_or_else(|| "<none>".to_string()),
        sources.len(),
        started.elapsed().as_millis(),
        outcome.active.len(),
        outcome.inactive.len(),
        outcome.failed_sources.len()
    );
    outcome
}

async fn fetch_locations(
    store: &dyn DataStore,
    settings: &SearchSettings,
    sources: &[DatasetId],
    failures: &mut BTreeMap<DatasetId, SourceFailure>,
) -> BTreeMap<DatasetId, Vec<Location>> {
    let results: Vec<(&DatasetId, RepositoryResult<Vec<Location>>)> = stream::iter(sources)
        .map(|source| async move {
            let result = guarded_query(settings, "query_locations", move || {
                store.query_locations(source)
            })
            .await
            .map_err(|e| e.with_dataset(source));
            (source, result)
        })
        .buffer_unordered(settings.worker_limit.max(1))
        .collect()
        .await;

    let mut locations = BTreeMap::new();
    for (source, result) in results {
        match result {
            Ok(locs) => {
                locations.insert(source.clone(), locs);
            }
            Err(e) => {
                warn!("Search: no locations for {}: {}", source, e);
                failures
                    .entry(source.clone())
                    .or_insert_with(|| SourceFailure::from_error(source, "query_locations", &e));
            }
        }
    }
    locations
}

async fn run_sum_queries<'a>(
    store: &'a dyn DataStore,
    settings: &'a SearchSettings,
    window: &'a TimeWindow,
    queries: Vec<GroupQuery<'a>>,
) -> Vec<(GroupQuery<'a>, RepositoryResult<Vec<SumRow>>)> {
    stream::iter(queries)
        .map(|query| async move {
            let source = query.source;
            let variables = query.predicate.variables().to_vec();
            let result = guarded_query(settings, "query_sums", || {
                store.query_sums(source, &variables, window)
            })
            .await
            .map_err(|e| e.with_dataset(source));
            (query, result)
        })
        .buffer_unordered(settings.worker_limit.max(1))
        .collect()
        .await
}
