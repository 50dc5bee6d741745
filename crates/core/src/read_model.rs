//! Display-ready read models built from raw records.
//!
//! Aggregation never fails: missing tags become an empty list, missing vote
//! tallies become zero counts, a missing answer count becomes zero and a
//! missing author profile becomes [`AuthorDisplay::placeholder`].

use serde::Serialize;

use crate::age::format_age;
use crate::filter::Searchable;
use crate::records::{
    AnswerRecord, AuthorProfile, CommentRecord, CommentTarget, QuestionRecord, RawAnswer,
    RawComment, RawQuestion, TagRecord,
};
use crate::types::{DbId, Timestamp};
use crate::vote::{AggregateCounts, VoteType};

/// Characters of the description shown in list views.
pub const EXCERPT_CHARS: usize = 200;

/// Display name used when a record's author profile is missing.
pub const UNKNOWN_AUTHOR: &str = "Unknown user";

// ---------------------------------------------------------------------------
// Author display
// ---------------------------------------------------------------------------

/// Author fields as the rendering layer shows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorDisplay {
    pub id: Option<DbId>,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub reputation: i32,
}

impl AuthorDisplay {
    pub fn placeholder(id: Option<DbId>) -> Self {
        Self {
            id,
            username: String::new(),
            display_name: UNKNOWN_AUTHOR.to_string(),
            avatar_url: String::new(),
            reputation: 0,
        }
    }

    /// Resolve an optional profile, falling back to the placeholder.
    ///
    /// A present profile with a blank display name shows its username instead.
    pub fn resolve(profile: Option<&AuthorProfile>, author_id: Option<DbId>) -> Self {
        match profile {
            None => Self::placeholder(author_id),
            Some(p) => {
                let display_name = if !p.display_name.trim().is_empty() {
                    p.display_name.clone()
                } else if !p.username.trim().is_empty() {
                    p.username.clone()
                } else {
                    UNKNOWN_AUTHOR.to_string()
                };
                Self {
                    id: Some(p.id),
                    username: p.username.clone(),
                    display_name,
                    avatar_url: p.avatar_url.clone().unwrap_or_default(),
                    reputation: p.reputation,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReadModel {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub likes: i64,
    pub dislikes: i64,
    pub score: i64,
    pub user_vote: Option<VoteType>,
    pub answer_count: i64,
    pub views: i64,
    pub author: AuthorDisplay,
    pub created_at: Timestamp,
    pub age: String,
}

impl QuestionReadModel {
    /// Replace the vote-derived fields with freshly confirmed counts.
    pub fn apply_counts(&mut self, counts: &AggregateCounts) {
        self.likes = counts.likes;
        self.dislikes = counts.dislikes;
        self.score = counts.score();
        self.user_vote = counts.user_vote;
    }
}

impl Searchable for QuestionReadModel {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tag_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.tags.iter().map(String::as_str))
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentReadModel {
    pub id: DbId,
    pub content: String,
    pub target: CommentTarget,
    pub author: AuthorDisplay,
    pub created_at: Timestamp,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerReadModel {
    pub id: DbId,
    pub question_id: DbId,
    pub content: String,
    pub likes: i64,
    pub dislikes: i64,
    pub score: i64,
    pub user_vote: Option<VoteType>,
    pub author: AuthorDisplay,
    pub comments: Vec<CommentReadModel>,
    pub created_at: Timestamp,
    pub age: String,
}

impl AnswerReadModel {
    pub fn apply_counts(&mut self, counts: &AggregateCounts) {
        self.likes = counts.likes;
        self.dislikes = counts.dislikes;
        self.score = counts.score();
        self.user_vote = counts.user_vote;
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Merge a raw question with its relations into a read model.
pub fn aggregate_question(
    raw: &RawQuestion,
    author: Option<&AuthorProfile>,
    related_tags: &[TagRecord],
    vote_summary: Option<&AggregateCounts>,
    answer_count: Option<i64>,
    now: Timestamp,
) -> QuestionReadModel {
    let counts = vote_summary.copied().unwrap_or_default();

    QuestionReadModel {
        id: raw.id,
        title: raw.title.clone(),
        description: raw.description.clone(),
        excerpt: excerpt(&raw.description, EXCERPT_CHARS),
        tags: related_tags.iter().map(|t| t.name.clone()).collect(),
        likes: counts.likes,
        dislikes: counts.dislikes,
        score: counts.score(),
        user_vote: counts.user_vote,
        answer_count: answer_count.unwrap_or(0).max(0),
        views: raw.views.max(0),
        author: AuthorDisplay::resolve(author, raw.author_id),
        created_at: raw.created_at,
        age: format_age(raw.created_at, now),
    }
}

/// [`aggregate_question`] over a store bundle.
pub fn aggregate_question_record(record: &QuestionRecord, now: Timestamp) -> QuestionReadModel {
    aggregate_question(
        &record.question,
        record.author.as_ref(),
        &record.tags,
        record.votes.as_ref(),
        record.answer_count,
        now,
    )
}

pub fn aggregate_comment(
    raw: &RawComment,
    author: Option<&AuthorProfile>,
    now: Timestamp,
) -> CommentReadModel {
    CommentReadModel {
        id: raw.id,
        content: raw.content.clone(),
        target: raw.target,
        author: AuthorDisplay::resolve(author, raw.author_id),
        created_at: raw.created_at,
        age: format_age(raw.created_at, now),
    }
}

pub fn aggregate_comment_record(record: &CommentRecord, now: Timestamp) -> CommentReadModel {
    aggregate_comment(&record.comment, record.author.as_ref(), now)
}

/// Comments come out oldest first, the order a thread reads in.
pub fn aggregate_answer(
    raw: &RawAnswer,
    author: Option<&AuthorProfile>,
    vote_summary: Option<&AggregateCounts>,
    comments: &[CommentRecord],
    now: Timestamp,
) -> AnswerReadModel {
    let counts = vote_summary.copied().unwrap_or_default();

    let mut comments: Vec<CommentReadModel> = comments
        .iter()
        .map(|c| aggregate_comment_record(c, now))
        .collect();
    comments.sort_by_key(|c| c.created_at);

    AnswerReadModel {
        id: raw.id,
        question_id: raw.question_id,
        content: raw.content.clone(),
        likes: counts.likes,
        dislikes: counts.dislikes,
        score: counts.score(),
        user_vote: counts.user_vote,
        author: AuthorDisplay::resolve(author, raw.author_id),
        comments,
        created_at: raw.created_at,
        age: format_age(raw.created_at, now),
    }
}

pub fn aggregate_answer_record(record: &AnswerRecord, now: Timestamp) -> AnswerReadModel {
    aggregate_answer(
        &record.answer,
        record.author.as_ref(),
        record.votes.as_ref(),
        &record.comments,
        now,
    )
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
    }
}
