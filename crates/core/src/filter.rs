//! Question list filtering and ordering.
//!
//! The whole pipeline recomputes from the input on every call; nothing is
//! memoized and the input slice is never reordered.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// How a text query is matched against questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    None,
    /// Substring match on title or description.
    Search,
    /// Exact match on any tag name.
    Tag,
}

impl FromStr for FilterMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(FilterMode::None),
            "search" => Ok(FilterMode::Search),
            "tag" => Ok(FilterMode::Tag),
            other => Err(CoreError::Validation(format!(
                "Invalid filter mode '{other}'. Must be one of: none, search, tag"
            ))),
        }
    }
}

/// Anything the filter engine can match and order.
pub trait Searchable {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn tag_names(&self) -> Box<dyn Iterator<Item = &str> + '_>;
    fn created_at(&self) -> Timestamp;
}

/// A filter request: mode plus query text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFilter {
    pub mode: FilterMode,
    pub query: String,
}

impl QuestionFilter {
    pub fn new(mode: FilterMode, query: impl Into<String>) -> Self {
        Self {
            mode,
            query: query.into(),
        }
    }

    /// The mode actually applied: a blank query matches everything.
    pub fn effective_mode(&self) -> FilterMode {
        if self.query.trim().is_empty() {
            FilterMode::None
        } else {
            self.mode
        }
    }

    pub fn apply<Q: Searchable + Clone>(&self, questions: &[Q]) -> Vec<Q> {
        filter_questions(questions, self.effective_mode(), &self.query)
    }
}

/// Filter `questions` by `mode` and `query`, newest first.
///
/// Ties on the creation timestamp keep their input order.
pub fn filter_questions<Q: Searchable + Clone>(
    questions: &[Q],
    mode: FilterMode,
    query: &str,
) -> Vec<Q> {
    let needle = query.trim().to_lowercase();
    let mode = if needle.is_empty() { FilterMode::None } else { mode };

    let mut matched: Vec<Q> = questions
        .iter()
        .filter(|q| matches(*q, mode, &needle))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal timestamps stay in input order.
    matched.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    matched
}

fn matches<Q: Searchable>(question: &Q, mode: FilterMode, needle: &str) -> bool {
    match mode {
        FilterMode::None => true,
        FilterMode::Search => {
            question.title().to_lowercase().contains(needle)
                || question.description().to_lowercase().contains(needle)
        }
        FilterMode::Tag => question
            .tag_names()
            .any(|name| name.trim().to_lowercase() == needle),
    }
}
