//! Discovery catalog: the named questions a user can ask.
//!
//! The catalog is parsed once at startup from the discovery document and is
//! immutable afterwards. Every structural problem (unknown join type, empty
//! variable or source lists, unknown datasets) is reported here as a
//! [`CatalogError`] so that no search ever runs against a malformed question.
//!
//! Document shape:
//!
//! ```json
//! {
//!   "discovery": {
//!     "heat": {
//!       "question": "Net heat flux",
//!       "search": [
//!         { "short_names": ["QNET"], "join": "or", "datasets": ["ntas_flux"] }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

crate::define_key_type!(QuestionId);
crate::define_key_type!(DatasetId);

/// How per-variable "has data" signals combine into one platform signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    And,
    Or,
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            other => Err(format!("Unknown join type: {}", other)),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
        }
    }
}

/// One data source (dataset) a search group is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef {
    pub dataset: DatasetId,
}

impl SourceRef {
    pub fn new(dataset: impl Into<DatasetId>) -> Self {
        Self {
            dataset: dataset.into(),
        }
    }
}

/// A set of variables plus the join predicate and the sources that supply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGroup {
    pub variables: Vec<String>,
    pub join: JoinType,
    pub sources: Vec<SourceRef>,
}

/// A named discovery topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub label: String,
    pub groups: Vec<SearchGroup>,
}

impl Question {
    /// Distinct datasets referenced by any group, in dataset order.
    pub fn datasets(&self) -> Vec<DatasetId> {
        self.groups
            .iter()
            .flat_map(|g| g.sources.iter().map(|s| s.dataset.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Variables requested from `dataset` across all groups, first-seen order.
    pub fn variables_for(&self, dataset: &DatasetId) -> Vec<String> {
        let mut variables: Vec<String> = Vec::new();
        for group in &self.groups {
            if group.sources.iter().any(|s| &s.dataset == dataset) {
                for variable in &group.variables {
                    if !variables.contains(variable) {
                        variables.push(variable.clone());
                    }
                }
            }
        }
        variables
    }
}

/// Fatal problems found while loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse discovery catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Discovery catalog defines no questions")]
    Empty,

    #[error("Question '{question}': unknown join type '{join}' in search group {group}")]
    UnknownJoinType {
        question: String,
        group: usize,
        join: String,
    },

    #[error("Question '{question}': search group {group} names no variables")]
    EmptyVariables { question: String, group: usize },

    #[error("Question '{question}': search group {group} names no datasets")]
    EmptySources { question: String, group: usize },

    #[error("Question '{question}': dataset '{dataset}' is not known to the data store")]
    UnknownDataset { question: String, dataset: String },
}

#[derive(Deserialize)]
struct RawCatalog {
    discovery: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    search: Vec<RawSearch>,
}

#[derive(Deserialize)]
struct RawSearch {
    short_names: Vec<String>,
    join: String,
    #[serde(default)]
    datasets: Vec<String>,
}

/// Immutable set of questions, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    /// Build a catalog from already validated questions.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parse and validate a discovery document.
    pub fn from_json_str(document: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(document)?;
        if raw.discovery.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut questions = Vec::with_capacity(raw.discovery.len());
        for (id, value) in raw.discovery {
            let raw_question: RawQuestion = serde_json::from_value(value)?;
            questions.push(Self::build_question(id, raw_question)?);
        }
        Ok(Self { questions })
    }

    fn build_question(id: String, raw: RawQuestion) -> Result<Question, CatalogError> {
        let mut groups = Vec::with_capacity(raw.search.len());
        for (index, search) in raw.search.into_iter().enumerate() {
            let join = search
                .join
                .parse::<JoinType>()
                .map_err(|_| CatalogError::UnknownJoinType {
                    question: id.clone(),
                    group: index,
                    join: search.join.clone(),
                })?;
            if search.short_names.is_empty() {
                return Err(CatalogError::EmptyVariables {
                    question: id,
                    group: index,
                });
            }
            if search.datasets.is_empty() {
                return Err(CatalogError::EmptySources {
                    question: id,
                    group: index,
                });
            }
            groups.push(SearchGroup {
                variables: search.short_names,
                join,
                sources: search.datasets.into_iter().map(SourceRef::new).collect(),
            });
        }

        Ok(Question {
            id: QuestionId::new(id),
            label: raw.question,
            groups,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id.as_str() == id)
    }

    /// Every dataset referenced by any question, in dataset order.
    pub fn datasets(&self) -> Vec<DatasetId> {
        self.questions
            .iter()
            .flat_map(|q| q.datasets())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Ensure every referenced dataset is one the store knows about.
    pub fn check_datasets(&self, known: &HashSet<DatasetId>) -> Result<(), CatalogError> {
        for question in &self.questions {
            for dataset in question.datasets() {
                if !known.contains(&dataset) {
                    return Err(CatalogError::UnknownDataset {
                        question: question.id.to_string(),
                        dataset: dataset.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
