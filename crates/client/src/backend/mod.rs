//! The backing-store collaborator the engine talks to.
//!
//! [`ForumBackend`] is deliberately coarse: one call per thing a view
//! needs. Implementations resolve relations themselves and leave anything
//! they cannot find as `None` / empty; the aggregator fills in defaults.

use async_trait::async_trait;
use qaforum_core::error::CoreError;
use qaforum_core::records::{QuestionDetailRecord, QuestionRecord, TagCount, UserActivity};
use qaforum_core::submission::{NewAnswer, NewComment, NewQuestion};
use qaforum_core::types::DbId;
use qaforum_core::vote::{AggregateCounts, VoteTarget, VoteTransition, VoteType};

pub mod memory;
pub mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// What the store committed for one vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    pub transition: VoteTransition,
    /// Counts for the target after the write, with the voter as viewer.
    pub counts: AggregateCounts,
}

/// Backing store for the forum.
///
/// Every error is a [`CoreError`]; an unreachable store is
/// [`CoreError::Network`].
#[async_trait]
pub trait ForumBackend: Send + Sync {
    /// Full question snapshot with tags, authors, tallies (for `viewer`)
    /// and answer counts.
    async fn fetch_questions(&self, viewer: Option<DbId>) -> Result<Vec<QuestionRecord>, CoreError>;

    /// One question with its answers and comments, or `None` if unknown.
    async fn fetch_question_detail(
        &self,
        question_id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<QuestionDetailRecord>, CoreError>;

    /// Count one view. Returns `false` if the question does not exist.
    async fn record_view(&self, question_id: DbId) -> Result<bool, CoreError>;

    /// Apply a vote submission atomically for the (user, target) key.
    ///
    /// The store reads the user's current vote on the target, derives the
    /// transition with [`qaforum_core::vote::VoteState::submit`] and
    /// performs the single create / update / delete it names, with no other
    /// writer for the same key in between. Fails with `NotFound` when the
    /// target does not exist.
    async fn submit_vote(
        &self,
        user_id: DbId,
        target: VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteReceipt, CoreError>;

    async fn create_question(&self, author_id: DbId, question: &NewQuestion)
        -> Result<DbId, CoreError>;

    async fn create_answer(&self, author_id: DbId, answer: &NewAnswer) -> Result<DbId, CoreError>;

    async fn create_comment(&self, author_id: DbId, comment: &NewComment)
        -> Result<DbId, CoreError>;

    /// Every tag with its question count.
    async fn tag_counts(&self) -> Result<Vec<TagCount>, CoreError>;

    /// Contribution totals and authored questions for one member.
    async fn user_activity(&self, user_id: DbId) -> Result<UserActivity, CoreError>;
}
