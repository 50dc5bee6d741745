//! Forum client: backends, the vote engine and the page controllers.
//!
//! [`ForumClient`] bundles one backend with the long-lived pieces of client
//! state (the vote engine's in-flight guard and the dashboard) and exposes
//! the operations the pages call.

use std::sync::Arc;

use qaforum_core::error::CoreError;
use qaforum_core::records::TagCount;
use qaforum_core::session::Session;
use qaforum_core::submission::NewQuestion;
use qaforum_core::types::DbId;
use qaforum_core::vote::{AggregateCounts, VoteTarget, VoteType};

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod views;

use backend::ForumBackend;
use engine::VoteEngine;
use views::{Dashboard, PageSettings, ProfilePage, QuestionThread};

pub struct ForumClient {
    backend: Arc<dyn ForumBackend>,
    votes: VoteEngine,
    dashboard: Dashboard,
}

impl ForumClient {
    pub fn new(backend: Arc<dyn ForumBackend>, settings: PageSettings) -> Self {
        Self {
            votes: VoteEngine::new(Arc::clone(&backend)),
            dashboard: Dashboard::new(Arc::clone(&backend), settings),
            backend,
        }
    }

    pub fn votes(&self) -> &VoteEngine {
        &self.votes
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Vote on a question listed on the dashboard and show the confirmed counts.
    pub async fn vote_on_question(
        &self,
        session: &Session,
        question_id: DbId,
        vote_type: VoteType,
    ) -> Result<AggregateCounts, CoreError> {
        let counts = self
            .votes
            .submit_vote(session, VoteTarget::question(question_id), vote_type)
            .await?;
        self.dashboard.apply_vote(question_id, &counts).await;
        Ok(counts)
    }

    /// Open a question page, counting one view.
    pub async fn open_question(
        &self,
        session: &Session,
        question_id: DbId,
    ) -> Result<QuestionThread, CoreError> {
        QuestionThread::open(Arc::clone(&self.backend), session, question_id).await
    }

    /// Validate and store a new question. Returns its id.
    pub async fn ask_question(
        &self,
        session: &Session,
        question: NewQuestion,
    ) -> Result<DbId, CoreError> {
        let user = session.require_user("ask a question")?;
        let question = question.prepare()?;
        let id = self.backend.create_question(user.id, &question).await?;
        tracing::info!(
            question_id = id,
            author_id = user.id,
            tags = ?question.tags,
            "Question created",
        );
        Ok(id)
    }

    pub async fn tag_index(&self) -> Result<Vec<TagCount>, CoreError> {
        views::load_tag_index(self.backend.as_ref()).await
    }

    pub async fn profile(&self, session: &Session) -> Result<ProfilePage, CoreError> {
        views::load_profile(self.backend.as_ref(), session).await
    }
}
