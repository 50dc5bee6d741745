//! Question detail: one question, its answers and every comment thread.
//!
//! Opening a thread counts a view and then loads the question. Posting an
//! answer or a comment keeps the draft text until the store confirms the
//! write, then reloads the thread.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use qaforum_core::error::CoreError;
use qaforum_core::read_model::{
    aggregate_answer_record, aggregate_comment_record, aggregate_question_record,
    AnswerReadModel, CommentReadModel, QuestionReadModel,
};
use qaforum_core::records::{CommentTarget, QuestionDetailRecord};
use qaforum_core::session::Session;
use qaforum_core::submission::{NewAnswer, NewComment};
use qaforum_core::types::{DbId, Timestamp};
use qaforum_core::vote::{AggregateCounts, TargetType, VoteTarget, VoteType};

use crate::backend::ForumBackend;
use crate::engine::VoteEngine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionDetail {
    pub question: QuestionReadModel,
    pub answers: Vec<AnswerReadModel>,
    /// Comments on the question itself, oldest first.
    pub comments: Vec<CommentReadModel>,
}

impl QuestionDetail {
    /// Load and aggregate one question for `session`.
    ///
    /// Fails with `NotFound` when the question does not exist.
    pub async fn load(
        backend: &dyn ForumBackend,
        session: &Session,
        question_id: DbId,
    ) -> Result<Self, CoreError> {
        backend
            .fetch_question_detail(question_id, session.viewer_id())
            .await?
            .map(|record| assemble_detail(&record, Utc::now()))
            .ok_or(CoreError::NotFound {
                entity: "question",
                id: question_id,
            })
    }

    fn apply_counts(&mut self, target: VoteTarget, counts: &AggregateCounts) {
        match target.kind {
            TargetType::Question if self.question.id == target.id => {
                self.question.apply_counts(counts);
            }
            TargetType::Answer => {
                if let Some(answer) = self.answers.iter_mut().find(|a| a.id == target.id) {
                    answer.apply_counts(counts);
                }
            }
            TargetType::Question => {}
        }
    }
}

/// Aggregate a detail bundle. Answers keep the store's order; comments are
/// sorted oldest first.
pub fn assemble_detail(record: &QuestionDetailRecord, now: Timestamp) -> QuestionDetail {
    let mut comments: Vec<CommentReadModel> = record
        .comments
        .iter()
        .map(|c| aggregate_comment_record(c, now))
        .collect();
    comments.sort_by_key(|c| c.created_at);

    let mut question = aggregate_question_record(&record.question, now);
    question.answer_count = record.answers.len() as i64;

    QuestionDetail {
        question,
        answers: record
            .answers
            .iter()
            .map(|a| aggregate_answer_record(a, now))
            .collect(),
        comments,
    }
}

/// What the detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum DetailView {
    Found(QuestionDetail),
    /// The question id is unknown; rendered as an empty state.
    Missing,
}

/// An open question page with its unsent drafts.
pub struct QuestionThread {
    backend: Arc<dyn ForumBackend>,
    question_id: DbId,
    view: DetailView,
    answer_draft: String,
    comment_drafts: HashMap<CommentTarget, String>,
}

impl std::fmt::Debug for QuestionThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionThread")
            .field("question_id", &self.question_id)
            .field("view", &self.view)
            .field("answer_draft", &self.answer_draft)
            .field("comment_drafts", &self.comment_drafts)
            .finish_non_exhaustive()
    }
}

impl QuestionThread {
    /// Count a view and load the question.
    ///
    /// An unknown id opens the thread in the [`DetailView::Missing`] state;
    /// only store failures are errors.
    pub async fn open(
        backend: Arc<dyn ForumBackend>,
        session: &Session,
        question_id: DbId,
    ) -> Result<Self, CoreError> {
        if !backend.record_view(question_id).await? {
            tracing::debug!(question_id, "View recorded for unknown question");
        }
        let mut thread = Self {
            backend,
            question_id,
            view: DetailView::Missing,
            answer_draft: String::new(),
            comment_drafts: HashMap::new(),
        };
        thread.reload(session).await?;
        Ok(thread)
    }

    pub fn question_id(&self) -> DbId {
        self.question_id
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    pub fn detail(&self) -> Option<&QuestionDetail> {
        match &self.view {
            DetailView::Found(detail) => Some(detail),
            DetailView::Missing => None,
        }
    }

    /// Re-fetch the thread. On error the current view is kept.
    pub async fn reload(&mut self, session: &Session) -> Result<(), CoreError> {
        let loaded = QuestionDetail::load(self.backend.as_ref(), session, self.question_id).await;
        self.view = match loaded {
            Ok(detail) => DetailView::Found(detail),
            Err(CoreError::NotFound { .. }) => DetailView::Missing,
            Err(e) => return Err(e),
        };
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Drafts
    // -----------------------------------------------------------------------

    pub fn set_answer_draft(&mut self, text: impl Into<String>) {
        self.answer_draft = text.into();
    }

    pub fn answer_draft(&self) -> &str {
        &self.answer_draft
    }

    pub fn set_comment_draft(&mut self, target: CommentTarget, text: impl Into<String>) {
        self.comment_drafts.insert(target, text.into());
    }

    pub fn comment_draft(&self, target: CommentTarget) -> &str {
        self.comment_drafts
            .get(&target)
            .map(String::as_str)
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Post the answer draft. The draft is cleared only once the store
    /// has accepted the answer.
    ///
    /// Returns the new answer's id once it is committed, even if the
    /// follow-up reload fails; the previous view is kept in that case.
    pub async fn post_answer(&mut self, session: &Session) -> Result<DbId, CoreError> {
        let user = session.require_user("answer")?;
        let answer = NewAnswer {
            question_id: self.question_id,
            content: self.answer_draft.clone(),
        }
        .prepare()?;

        let id = self.backend.create_answer(user.id, &answer).await.map_err(|e| {
            tracing::warn!(question_id = self.question_id, error = %e, "Posting answer failed");
            e
        })?;
        tracing::info!(question_id = self.question_id, answer_id = id, "Answer posted");
        self.answer_draft.clear();
        self.reload_after_write(session).await;
        Ok(id)
    }

    /// Post the comment draft for `target`, with the same draft handling
    /// as [`QuestionThread::post_answer`].
    pub async fn post_comment(
        &mut self,
        session: &Session,
        target: CommentTarget,
    ) -> Result<DbId, CoreError> {
        let user = session.require_user("comment")?;
        let comment = NewComment {
            target,
            content: self.comment_draft(target).to_string(),
        }
        .prepare()?;

        let id = self
            .backend
            .create_comment(user.id, &comment)
            .await
            .map_err(|e| {
                tracing::warn!(?target, error = %e, "Posting comment failed");
                e
            })?;
        tracing::info!(?target, comment_id = id, "Comment posted");
        self.comment_drafts.remove(&target);
        self.reload_after_write(session).await;
        Ok(id)
    }

    async fn reload_after_write(&mut self, session: &Session) {
        if let Err(e) = self.reload(session).await {
            tracing::warn!(
                question_id = self.question_id,
                error = %e,
                "Reload after a committed write failed; showing the previous view",
            );
        }
    }

    /// Vote on the question or one of its answers. Counts on screen change
    /// only after the engine confirms the write.
    pub async fn vote(
        &mut self,
        engine: &VoteEngine,
        session: &Session,
        target: VoteTarget,
        vote_type: VoteType,
    ) -> Result<AggregateCounts, CoreError> {
        let counts = engine.submit_vote(session, target, vote_type).await?;
        if let DetailView::Found(detail) = &mut self.view {
            detail.apply_counts(target, &counts);
        }
        Ok(counts)
    }
}
