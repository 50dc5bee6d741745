//! In-process backend.
//!
//! Holds every table in one mutex-protected store, so each call (vote
//! transitions included) is atomic. Used by the test suite, with two
//! switches for exercising failure and timing paths:
//!
//! - [`MemoryBackend::set_offline`] makes every call fail with
//!   [`CoreError::Network`] without touching the store.
//! - [`MemoryBackend::hold_next_fetch`] / [`MemoryBackend::hold_next_vote`]
//!   park the next call of that kind until the returned [`Notify`] fires.
//! - [`MemoryBackend::fail_next_detail`] makes only the next
//!   `fetch_question_detail` call fail, leaving writes unaffected.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use qaforum_core::error::CoreError;
use qaforum_core::records::{
    normalize_tag_name, AnswerRecord, AuthorProfile, CommentRecord, CommentTarget,
    QuestionDetailRecord, QuestionRecord, RawAnswer, RawComment, RawQuestion, TagCount, TagRecord,
    UserActivity,
};
use qaforum_core::submission::{NewAnswer, NewComment, NewQuestion};
use qaforum_core::types::{DbId, Timestamp};
use qaforum_core::vote::{
    tally, AggregateCounts, TargetType, VoteKey, VoteRecord, VoteState, VoteTarget,
    VoteTransition, VoteType,
};

use super::{ForumBackend, VoteReceipt};

#[derive(Default)]
struct Store {
    last_id: DbId,
    profiles: BTreeMap<DbId, AuthorProfile>,
    questions: BTreeMap<DbId, RawQuestion>,
    /// Tag ids per question, in attachment order.
    question_tags: HashMap<DbId, Vec<DbId>>,
    tags: BTreeMap<DbId, TagRecord>,
    answers: BTreeMap<DbId, RawAnswer>,
    comments: BTreeMap<DbId, RawComment>,
    /// Keyed on (user, target): at most one row per key by construction.
    votes: BTreeMap<VoteKey, VoteRecord>,
}

impl Store {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn tag_id(&mut self, name: &str) -> DbId {
        let name = normalize_tag_name(name);
        if let Some(tag) = self.tags.values().find(|t| t.name == name) {
            return tag.id;
        }
        let id = self.next_id();
        self.tags.insert(id, TagRecord { id, name });
        id
    }

    fn target_exists(&self, kind: TargetType, id: DbId) -> bool {
        match kind {
            TargetType::Question => self.questions.contains_key(&id),
            TargetType::Answer => self.answers.contains_key(&id),
        }
    }

    fn author(&self, author_id: Option<DbId>) -> Option<AuthorProfile> {
        author_id.and_then(|id| self.profiles.get(&id).cloned())
    }

    /// Tally for a target, `None` when nobody has voted on it.
    fn votes_on(&self, target: VoteTarget, viewer: Option<DbId>) -> Option<AggregateCounts> {
        let counts = tally(self.votes.values(), target, viewer);
        if counts.likes + counts.dislikes == 0 {
            None
        } else {
            Some(counts)
        }
    }

    fn question_record(&self, question: &RawQuestion, viewer: Option<DbId>) -> QuestionRecord {
        let tags = self
            .question_tags
            .get(&question.id)
            .map(|ids| ids.iter().filter_map(|id| self.tags.get(id).cloned()).collect())
            .unwrap_or_default();
        let answer_count = self
            .answers
            .values()
            .filter(|a| a.question_id == question.id)
            .count() as i64;

        QuestionRecord {
            question: question.clone(),
            author: self.author(question.author_id),
            tags,
            votes: self.votes_on(VoteTarget::question(question.id), viewer),
            answer_count: (answer_count > 0).then_some(answer_count),
        }
    }

    fn comment_records(&self, target: CommentTarget) -> Vec<CommentRecord> {
        self.comments
            .values()
            .filter(|c| c.target == target)
            .map(|c| CommentRecord {
                comment: c.clone(),
                author: self.author(c.author_id),
            })
            .collect()
    }
}

#[derive(Default)]
struct Holds {
    fetch: Option<Arc<Notify>>,
    vote: Option<Arc<Notify>>,
}

/// In-process [`ForumBackend`].
#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    holds: Mutex<Holds>,
    offline: AtomicBool,
    fail_detail: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn holds(&self) -> MutexGuard<'_, Holds> {
        self.holds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), CoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CoreError::Network("backing store offline".to_string()))
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Failure and timing switches
    // -----------------------------------------------------------------------

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_next_detail(&self) {
        self.fail_detail.store(true, Ordering::SeqCst);
    }

    /// Park the next `fetch_questions` call until the returned handle is notified.
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds().fetch = Some(Arc::clone(&notify));
        notify
    }

    /// Park the next `submit_vote` call until the returned handle is notified.
    pub fn hold_next_vote(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds().vote = Some(Arc::clone(&notify));
        notify
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    pub fn add_profile(&self, username: &str, display_name: &str) -> DbId {
        let mut store = self.store();
        let id = store.next_id();
        store.profiles.insert(
            id,
            AuthorProfile {
                id,
                username: username.to_string(),
                display_name: display_name.to_string(),
                avatar_url: None,
                reputation: 0,
            },
        );
        id
    }

    /// Insert a question with an explicit creation time.
    pub fn add_question_at(
        &self,
        author_id: Option<DbId>,
        title: &str,
        description: &str,
        tags: &[&str],
        created_at: Timestamp,
    ) -> DbId {
        let mut store = self.store();
        let id = store.next_id();
        store.questions.insert(
            id,
            RawQuestion {
                id,
                title: title.to_string(),
                description: description.to_string(),
                author_id,
                views: 0,
                created_at,
            },
        );
        let mut tag_ids = Vec::with_capacity(tags.len());
        for name in tags {
            let tag_id = store.tag_id(name);
            if !tag_ids.contains(&tag_id) {
                tag_ids.push(tag_id);
            }
        }
        store.question_tags.insert(id, tag_ids);
        id
    }

    pub fn add_answer_at(
        &self,
        question_id: DbId,
        author_id: Option<DbId>,
        content: &str,
        created_at: Timestamp,
    ) -> DbId {
        let mut store = self.store();
        let id = store.next_id();
        store.answers.insert(
            id,
            RawAnswer {
                id,
                question_id,
                author_id,
                content: content.to_string(),
                created_at,
            },
        );
        id
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Number of vote rows held by `user_id` on `target`.
    pub fn vote_rows(&self, user_id: DbId, target: VoteTarget) -> usize {
        self.store()
            .votes
            .values()
            .filter(|v| v.user_id == user_id && v.target == target)
            .count()
    }

    pub fn question_views(&self, question_id: DbId) -> Option<i64> {
        self.store().questions.get(&question_id).map(|q| q.views)
    }

    pub fn answer_count(&self, question_id: DbId) -> usize {
        self.store()
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .count()
    }

    pub fn comment_count(&self) -> usize {
        self.store().comments.len()
    }
}

#[async_trait]
impl ForumBackend for MemoryBackend {
    async fn fetch_questions(
        &self,
        viewer: Option<DbId>,
    ) -> Result<Vec<QuestionRecord>, CoreError> {
        self.ensure_online()?;
        let hold = self.holds().fetch.take();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        let store = self.store();
        Ok(store
            .questions
            .values()
            .map(|q| store.question_record(q, viewer))
            .collect())
    }

    async fn fetch_question_detail(
        &self,
        question_id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<QuestionDetailRecord>, CoreError> {
        self.ensure_online()?;
        if self.fail_detail.swap(false, Ordering::SeqCst) {
            return Err(CoreError::Network("detail fetch dropped".to_string()));
        }
        let store = self.store();
        let Some(question) = store.questions.get(&question_id) else {
            return Ok(None);
        };

        let answers = store
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .map(|a| AnswerRecord {
                answer: a.clone(),
                author: store.author(a.author_id),
                votes: store.votes_on(VoteTarget::answer(a.id), viewer),
                comments: store.comment_records(CommentTarget::Answer(a.id)),
            })
            .collect();

        Ok(Some(QuestionDetailRecord {
            question: store.question_record(question, viewer),
            answers,
            comments: store.comment_records(CommentTarget::Question(question_id)),
        }))
    }

    async fn record_view(&self, question_id: DbId) -> Result<bool, CoreError> {
        self.ensure_online()?;
        let mut store = self.store();
        match store.questions.get_mut(&question_id) {
            Some(question) => {
                question.views += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn submit_vote(
        &self,
        user_id: DbId,
        target: VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteReceipt, CoreError> {
        self.ensure_online()?;
        let hold = self.holds().vote.take();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        let mut store = self.store();
        if !store.target_exists(target.kind, target.id) {
            return Err(CoreError::NotFound {
                entity: target.kind.as_str(),
                id: target.id,
            });
        }

        let key = VoteKey { user_id, target };
        let current = store.votes.get(&key).map(|v| v.vote_type);
        let transition = VoteState::from(current).submit(vote_type);

        match transition {
            VoteTransition::Create(created) => {
                let id = store.next_id();
                store.votes.insert(
                    key,
                    VoteRecord {
                        id,
                        user_id,
                        target,
                        vote_type: created,
                        created_at: Utc::now(),
                    },
                );
            }
            VoteTransition::Update { to, .. } => {
                if let Some(row) = store.votes.get_mut(&key) {
                    row.vote_type = to;
                }
            }
            VoteTransition::Delete(_) => {
                store.votes.remove(&key);
            }
        }

        Ok(VoteReceipt {
            transition,
            counts: tally(store.votes.values(), target, Some(user_id)),
        })
    }

    async fn create_question(
        &self,
        author_id: DbId,
        question: &NewQuestion,
    ) -> Result<DbId, CoreError> {
        self.ensure_online()?;
        let tags: Vec<&str> = question.tags.iter().map(String::as_str).collect();
        Ok(self.add_question_at(
            Some(author_id),
            &question.title,
            &question.description,
            &tags,
            Utc::now(),
        ))
    }

    async fn create_answer(&self, author_id: DbId, answer: &NewAnswer) -> Result<DbId, CoreError> {
        self.ensure_online()?;
        if !self.store().questions.contains_key(&answer.question_id) {
            return Err(CoreError::NotFound {
                entity: "question",
                id: answer.question_id,
            });
        }
        Ok(self.add_answer_at(answer.question_id, Some(author_id), &answer.content, Utc::now()))
    }

    async fn create_comment(
        &self,
        author_id: DbId,
        comment: &NewComment,
    ) -> Result<DbId, CoreError> {
        self.ensure_online()?;
        let mut store = self.store();
        let target = comment.target;
        if !store.target_exists(target.kind(), target.id()) {
            return Err(CoreError::NotFound {
                entity: target.kind().as_str(),
                id: target.id(),
            });
        }
        let id = store.next_id();
        store.comments.insert(
            id,
            RawComment {
                id,
                content: comment.content.clone(),
                author_id: Some(author_id),
                target,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, CoreError> {
        self.ensure_online()?;
        let store = self.store();
        Ok(store
            .tags
            .values()
            .map(|tag| TagCount {
                id: tag.id,
                name: tag.name.clone(),
                question_count: store
                    .question_tags
                    .values()
                    .filter(|ids| ids.contains(&tag.id))
                    .count() as i64,
            })
            .collect())
    }

    async fn user_activity(&self, user_id: DbId) -> Result<UserActivity, CoreError> {
        self.ensure_online()?;
        let store = self.store();
        let mut questions: Vec<RawQuestion> = store
            .questions
            .values()
            .filter(|q| q.author_id == Some(user_id))
            .cloned()
            .collect();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(UserActivity {
            questions_asked: questions.len() as i64,
            answers_posted: store
                .answers
                .values()
                .filter(|a| a.author_id == Some(user_id))
                .count() as i64,
            comments_posted: store
                .comments
                .values()
                .filter(|c| c.author_id == Some(user_id))
                .count() as i64,
            questions,
        })
    }
}
