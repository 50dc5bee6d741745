//! Raw records as the backing store hands them over.
//!
//! Relations that the store may fail to populate (author profiles, tags,
//! vote tallies, answer counts) are explicit `Option`s or possibly-empty
//! vectors here. They are resolved to display defaults exactly once, in
//! [`crate::read_model`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::vote::{AggregateCounts, TargetType};

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Public profile of a forum member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub id: DbId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub reputation: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub author_id: Option<DbId>,
    pub views: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnswer {
    pub id: DbId,
    pub question_id: DbId,
    pub author_id: Option<DbId>,
    pub content: String,
    pub created_at: Timestamp,
}

/// The single parent a comment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum CommentTarget {
    Question(DbId),
    Answer(DbId),
}

impl CommentTarget {
    /// Build a target from the two nullable parent columns of a comment row.
    ///
    /// Exactly one of the columns must be set.
    pub fn from_columns(
        question_id: Option<DbId>,
        answer_id: Option<DbId>,
    ) -> Result<Self, CoreError> {
        match (question_id, answer_id) {
            (Some(q), None) => Ok(CommentTarget::Question(q)),
            (None, Some(a)) => Ok(CommentTarget::Answer(a)),
            (Some(_), Some(_)) => Err(CoreError::Validation(
                "A comment cannot belong to both a question and an answer".to_string(),
            )),
            (None, None) => Err(CoreError::Validation(
                "A comment must belong to a question or an answer".to_string(),
            )),
        }
    }

    pub fn kind(self) -> TargetType {
        match self {
            CommentTarget::Question(_) => TargetType::Question,
            CommentTarget::Answer(_) => TargetType::Answer,
        }
    }

    pub fn id(self) -> DbId {
        match self {
            CommentTarget::Question(id) | CommentTarget::Answer(id) => id,
        }
    }

    /// Split back into `(question_id, answer_id)` columns.
    pub fn to_columns(self) -> (Option<DbId>, Option<DbId>) {
        match self {
            CommentTarget::Question(id) => (Some(id), None),
            CommentTarget::Answer(id) => (None, Some(id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub id: DbId,
    pub content: String,
    pub author_id: Option<DbId>,
    pub target: CommentTarget,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: DbId,
    pub name: String,
}

/// A tag together with the number of questions carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub id: DbId,
    pub name: String,
    pub question_count: i64,
}

// ---------------------------------------------------------------------------
// Bundles returned by the backing store
// ---------------------------------------------------------------------------

/// A question with whatever relations the store could resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: RawQuestion,
    pub author: Option<AuthorProfile>,
    /// In the order the tags were attached.
    pub tags: Vec<TagRecord>,
    pub votes: Option<AggregateCounts>,
    pub answer_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub comment: RawComment,
    pub author: Option<AuthorProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub answer: RawAnswer,
    pub author: Option<AuthorProfile>,
    pub votes: Option<AggregateCounts>,
    pub comments: Vec<CommentRecord>,
}

/// Everything the question detail view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDetailRecord {
    pub question: QuestionRecord,
    pub answers: Vec<AnswerRecord>,
    pub comments: Vec<CommentRecord>,
}

/// Contribution totals and authored questions for one member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    pub questions_asked: i64,
    pub answers_posted: i64,
    pub comments_posted: i64,
    pub questions: Vec<RawQuestion>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Normalize a tag name: trim whitespace and lowercase.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn comment_target_requires_exactly_one_parent() {
        assert_eq!(
            CommentTarget::from_columns(Some(3), None).unwrap(),
            CommentTarget::Question(3)
        );
        assert_eq!(
            CommentTarget::from_columns(None, Some(9)).unwrap(),
            CommentTarget::Answer(9)
        );
        assert_matches!(
            CommentTarget::from_columns(Some(3), Some(9)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            CommentTarget::from_columns(None, None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn comment_target_columns_round_trip() {
        let target = CommentTarget::Answer(5);
        let (q, a) = target.to_columns();
        assert_eq!(CommentTarget::from_columns(q, a).unwrap(), target);
        assert_eq!(target.kind(), TargetType::Answer);
        assert_eq!(target.id(), 5);
    }

    #[test]
    fn tag_names_are_trimmed_and_lowercased() {
        assert_eq!(normalize_tag_name("  React "), "react");
        assert_eq!(normalize_tag_name("RUST"), "rust");
    }
}
