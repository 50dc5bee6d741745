//! Normalization and validation of user submissions.
//!
//! Everything here runs before any store call; a submission that fails
//! validation never reaches the backend.

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;
use crate::records::{normalize_tag_name, CommentTarget};
use crate::types::DbId;

/// Most tags a question may carry.
pub const MAX_TAGS: usize = 5;

/// Longest accepted question title, in characters.
pub const MAX_TITLE_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 300, message = "Please enter a title"))]
    pub title: String,
    #[validate(length(min = 1, message = "Please enter a description"))]
    pub description: String,
    #[validate(length(min = 1, max = 5, message = "Add between 1 and 5 tags"))]
    pub tags: Vec<String>,
}

impl NewQuestion {
    pub fn new<I, S>(title: impl Into<String>, description: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            description: description.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Trim text fields; lowercase, trim and de-duplicate tags (first
    /// occurrence wins) and drop blank ones.
    pub fn normalized(self) -> Self {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.iter().map(|t| normalize_tag_name(t)) {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            tags,
        }
    }

    /// Normalize and validate, ready to hand to the store.
    pub fn prepare(self) -> Result<Self, CoreError> {
        let question = self.normalized();
        question.validate()?;
        Ok(question)
    }
}

// ---------------------------------------------------------------------------
// Answers and comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewAnswer {
    pub question_id: DbId,
    #[validate(length(min = 1, message = "Answer cannot be empty"))]
    pub content: String,
}

impl NewAnswer {
    pub fn prepare(self) -> Result<Self, CoreError> {
        let answer = Self {
            question_id: self.question_id,
            content: self.content.trim().to_string(),
        };
        answer.validate()?;
        Ok(answer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewComment {
    pub target: CommentTarget,
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub content: String,
}

impl NewComment {
    pub fn prepare(self) -> Result<Self, CoreError> {
        let comment = Self {
            target: self.target,
            content: self.content.trim().to_string(),
        };
        comment.validate()?;
        Ok(comment)
    }
}
