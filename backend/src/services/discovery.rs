//! Process-wide discovery context.
//!
//! [`Discovery`] bundles the immutable pieces every request needs: the data
//! store handle, the question catalog, the settings and the global extent. It
//! is built once by [`Discovery::bootstrap`] and passed around explicitly.

use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::SearchSettings;
use crate::db::models::DatasetInfo;
use crate::db::repository::{DataStore, ErrorContext, RepositoryError, RepositoryResult};
use crate::db::services;
use crate::models::{Catalog, DatasetId, GlobalExtent, Question, QuestionId, Selection, TimeWindow};
use crate::routes::plot::PlotResponse;
use crate::services::availability::{self, SearchOutcome};
use crate::services::deep_link::DeepLink;
use crate::services::plot::{build_plot, PlotRequest};
use crate::services::reconciler::{reconcile, Reconciled, Trigger};
use crate::services::search_tracker::{SearchToken, SearchTracker};

/// Page state restored from a deep link.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub range: Reconciled,
    /// Only set when the link names a question the catalog knows.
    pub question: Option<QuestionId>,
    pub selection: Option<Selection>,
}

/// Immutable discovery configuration plus the data store.
#[derive(Clone)]
pub struct Discovery {
    store: Arc<dyn DataStore>,
    catalog: Catalog,
    settings: SearchSettings,
    datasets: Vec<DatasetInfo>,
    extent: GlobalExtent,
    tracker: SearchTracker,
}

impl Discovery {
    /// Parse the catalog document and build the context.
    pub async fn bootstrap(
        store: Arc<dyn DataStore>,
        catalog_json: &str,
        settings: SearchSettings,
    ) -> Result<Self> {
        let catalog =
            Catalog::from_json_str(catalog_json).context("Failed to load discovery catalog")?;
        Self::with_catalog(store, catalog, settings).await
    }

    /// Build the context from an already parsed catalog.
    ///
    /// Fails when the settings are invalid, the store cannot list its datasets,
    /// the catalog names a dataset the store does not know, or no dataset has a
    /// usable time extent.
    pub async fn with_catalog(
        store: Arc<dyn DataStore>,
        catalog: Catalog,
        settings: SearchSettings,
    ) -> Result<Self> {
        settings.validate().context("Invalid search settings")?;

        let datasets = services::list_datasets(store.as_ref())
            .await
            .context("Failed to list datasets from the data store")?;
        let known: HashSet<DatasetId> = datasets.iter().map(|d| d.id.clone()).collect();
        catalog
            .check_datasets(&known)
            .context("Discovery catalog does not match the data store")?;
        let extent =
            services::global_extent(&datasets).context("Failed to compute the global extent")?;

        info!(
            "Discovery ready: {} questions, {} datasets, extent {} to {}",
            catalog.questions().len(),
            datasets.len(),
            extent.min,
            extent.max
        );

        Ok(Self {
            store,
            catalog,
            settings,
            datasets,
            extent,
            tracker: SearchTracker::new(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn datasets(&self) -> &[DatasetInfo] {
        &self.datasets
    }

    pub fn extent(&self) -> &GlobalExtent {
        &self.extent
    }

    pub fn tracker(&self) -> &SearchTracker {
        &self.tracker
    }

    /// The whole extent, used until the user narrows it.
    pub fn initial_window(&self) -> TimeWindow {
        self.extent.full_window()
    }

    pub async fn health_check(&self) -> RepositoryResult<bool> {
        services::health_check(self.store.as_ref()).await
    }

    /// Apply one date-range input change.
    pub fn reconcile(&self, previous: &TimeWindow, trigger: &Trigger) -> Reconciled {
        reconcile(&self.extent, previous, trigger)
    }

    /// Restore window, question and selection from a page query string.
    pub fn open_link(&self, query: &str) -> InitialState {
        let link = DeepLink::parse(query);
        let range = self.reconcile(&self.initial_window(), &link.trigger());
        let question = link.question.filter(|q| {
            let known = self.catalog.question(q.as_str()).is_some();
            if !known {
                warn!("Deep link names unknown question '{}', ignoring", q);
            }
            known
        });
        InitialState {
            range,
            question,
            selection: link.selection,
        }
    }

    fn resolve_question(&self, question_id: Option<&str>) -> Option<&Question> {
        let id = question_id.filter(|id| !id.is_empty())?;
        let question = self.catalog.question(id);
        if question.is_none() {
            warn!("Unknown question '{}', showing every platform as empty", id);
        }
        question
    }

    /// Partition platforms for a window and an optional question.
    pub async fn search(&self, window: &TimeWindow, question_id: Option<&str>) -> SearchOutcome {
        let question = self.resolve_question(question_id);
        let known_sources = self.catalog.datasets();
        availability::search(
            self.store.as_ref(),
            &self.settings,
            window,
            question,
            &known_sources,
        )
        .await
    }

    /// Run a search under a token and apply it only if it is still the latest.
    ///
    /// Returns `None` when a newer search began before this one finished.
    pub async fn search_latest(
        &self,
        window: &TimeWindow,
        question_id: Option<&str>,
    ) -> Option<SearchOutcome> {
        let token = self.tracker.begin();
        self.finish_search(token, window, question_id).await
    }

    /// Run the search for an already issued token.
    pub async fn finish_search(
        &self,
        token: SearchToken,
        window: &TimeWindow,
        question_id: Option<&str>,
    ) -> Option<SearchOutcome> {
        let outcome = self.search(window, question_id).await;
        self.tracker
            .complete(token, outcome.clone())
            .then_some(outcome)
    }

    /// Plot the selected platform for the datasets in which `search` found it active.
    pub async fn plot(
        &self,
        window: &TimeWindow,
        question_id: &str,
        selection: &Selection,
        search: &SearchOutcome,
    ) -> RepositoryResult<PlotResponse> {
        let question = self.catalog.question(question_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Question {} not found", question_id),
                ErrorContext::new("plot")
                    .with_entity("question")
                    .with_entity_id(question_id),
            )
        })?;

        Ok(build_plot(
            self.store.as_ref(),
            &self.settings,
            PlotRequest {
                window,
                question,
                selection,
                search,
            },
        )
        .await)
    }
}
