//! Postgres-backed [`ForumBackend`] built on the `qaforum_db` repositories.
//!
//! Each call fetches base rows first and then resolves relations (authors,
//! tags, tallies, answer counts) with one batched query per relation. The
//! pure `assemble_*` functions stitch the results together.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use qaforum_core::error::CoreError;
use qaforum_core::records::{
    AnswerRecord, AuthorProfile, CommentRecord, CommentTarget, QuestionDetailRecord,
    QuestionRecord, RawAnswer, RawComment, RawQuestion, TagCount, TagRecord, UserActivity,
};
use qaforum_core::submission::{NewAnswer, NewComment, NewQuestion};
use qaforum_core::types::DbId;
use qaforum_core::vote::{AggregateCounts, TargetType, VoteTarget, VoteType};
use qaforum_db::models::answer::AnswerCount;
use qaforum_db::models::comment::Comment;
use qaforum_db::models::profile::Profile;
use qaforum_db::models::tag::QuestionTag;
use qaforum_db::models::vote::VoteTally;
use qaforum_db::repositories::{
    AnswerRepo, CommentRepo, ProfileRepo, QuestionRepo, TagRepo, VoteRepo,
};
use qaforum_db::DbPool;

use super::{ForumBackend, VoteReceipt};
use crate::config::ClientConfig;
use crate::error::{classify_sqlx_error, ClientError, ClientResult};

pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `config.database_url`.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            ClientError::Core(CoreError::Validation("DATABASE_URL must be set".to_string()))
        })?;
        let pool = qaforum_db::create_pool(url, config.db_max_connections).await?;
        Ok(Self::new(pool))
    }

    /// Check connectivity and apply pending migrations.
    pub async fn prepare(&self) -> ClientResult<()> {
        qaforum_db::health_check(&self.pool).await?;
        tracing::info!("Database health check passed");
        qaforum_db::run_migrations(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

fn db(err: sqlx::Error) -> CoreError {
    classify_sqlx_error(&err)
}

#[async_trait]
impl ForumBackend for PgBackend {
    async fn fetch_questions(
        &self,
        viewer: Option<DbId>,
    ) -> Result<Vec<QuestionRecord>, CoreError> {
        let questions: Vec<RawQuestion> = QuestionRepo::list_all(&self.pool)
            .await
            .map_err(db)?
            .into_iter()
            .map(Into::into)
            .collect();
        let ids: Vec<DbId> = questions.iter().map(|q| q.id).collect();
        let author_ids = distinct(questions.iter().filter_map(|q| q.author_id));

        let (profiles, tags, tallies, answer_counts) = tokio::try_join!(
            ProfileRepo::find_by_ids(&self.pool, &author_ids),
            TagRepo::list_for_questions(&self.pool, &ids),
            VoteRepo::tally_for_targets(&self.pool, TargetType::Question, &ids, viewer),
            AnswerRepo::count_by_questions(&self.pool, &ids),
        )
        .map_err(db)?;

        Ok(assemble_questions(
            questions,
            profiles,
            tags,
            tallies,
            answer_counts,
        ))
    }

    async fn fetch_question_detail(
        &self,
        question_id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<QuestionDetailRecord>, CoreError> {
        let Some(question) = QuestionRepo::find_by_id(&self.pool, question_id)
            .await
            .map_err(db)?
        else {
            return Ok(None);
        };
        let question = RawQuestion::from(question);

        let answers: Vec<RawAnswer> = AnswerRepo::list_by_question(&self.pool, question_id)
            .await
            .map_err(db)?
            .into_iter()
            .map(Into::into)
            .collect();
        let answer_ids: Vec<DbId> = answers.iter().map(|a| a.id).collect();
        let comments = valid_comments(
            CommentRepo::list_for_thread(&self.pool, question_id, &answer_ids)
                .await
                .map_err(db)?,
        );

        let author_ids = distinct(
            question
                .author_id
                .into_iter()
                .chain(answers.iter().filter_map(|a| a.author_id))
                .chain(comments.iter().filter_map(|c| c.author_id)),
        );
        let question_ids = [question_id];

        let (profiles, tags, question_tallies, answer_tallies) = tokio::try_join!(
            ProfileRepo::find_by_ids(&self.pool, &author_ids),
            TagRepo::list_for_questions(&self.pool, &question_ids),
            VoteRepo::tally_for_targets(&self.pool, TargetType::Question, &question_ids, viewer),
            VoteRepo::tally_for_targets(&self.pool, TargetType::Answer, &answer_ids, viewer),
        )
        .map_err(db)?;

        Ok(Some(assemble_detail(
            question,
            answers,
            comments,
            profiles,
            tags,
            question_tallies,
            answer_tallies,
        )))
    }

    async fn record_view(&self, question_id: DbId) -> Result<bool, CoreError> {
        QuestionRepo::increment_views(&self.pool, question_id)
            .await
            .map_err(db)
    }

    async fn submit_vote(
        &self,
        user_id: DbId,
        target: VoteTarget,
        vote_type: VoteType,
    ) -> Result<VoteReceipt, CoreError> {
        let outcome = VoteRepo::apply(&self.pool, user_id, target, vote_type)
            .await
            .map_err(db)?
            .ok_or(CoreError::NotFound {
                entity: target.kind.as_str(),
                id: target.id,
            })?;

        Ok(VoteReceipt {
            transition: outcome.transition,
            counts: outcome.tally.counts(),
        })
    }

    async fn create_question(
        &self,
        author_id: DbId,
        question: &NewQuestion,
    ) -> Result<DbId, CoreError> {
        let created = QuestionRepo::create(&self.pool, author_id, question)
            .await
            .map_err(db)?;
        Ok(created.id)
    }

    async fn create_answer(&self, author_id: DbId, answer: &NewAnswer) -> Result<DbId, CoreError> {
        if QuestionRepo::find_by_id(&self.pool, answer.question_id)
            .await
            .map_err(db)?
            .is_none()
        {
            return Err(CoreError::NotFound {
                entity: "question",
                id: answer.question_id,
            });
        }
        let created = AnswerRepo::create(&self.pool, answer.question_id, author_id, &answer.content)
            .await
            .map_err(db)?;
        Ok(created.id)
    }

    async fn create_comment(
        &self,
        author_id: DbId,
        comment: &NewComment,
    ) -> Result<DbId, CoreError> {
        let created = CommentRepo::create(&self.pool, author_id, comment.target, &comment.content)
            .await
            .map_err(db)?;
        Ok(created.id)
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, CoreError> {
        let tags = TagRepo::list_with_counts(&self.pool).await.map_err(db)?;
        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn user_activity(&self, user_id: DbId) -> Result<UserActivity, CoreError> {
        let (questions, questions_asked, answers_posted, comments_posted) = tokio::try_join!(
            QuestionRepo::list_by_author(&self.pool, user_id),
            QuestionRepo::count_by_author(&self.pool, user_id),
            AnswerRepo::count_by_author(&self.pool, user_id),
            CommentRepo::count_by_author(&self.pool, user_id),
        )
        .map_err(db)?;

        Ok(UserActivity {
            questions_asked,
            answers_posted,
            comments_posted,
            questions: questions.into_iter().map(Into::into).collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

fn distinct(ids: impl Iterator<Item = DbId>) -> Vec<DbId> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Convert comment rows, skipping any whose parent columns are inconsistent.
fn valid_comments(rows: Vec<Comment>) -> Vec<RawComment> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match RawComment::try_from(row) {
                Ok(comment) => Some(comment),
                Err(e) => {
                    tracing::warn!(comment_id = id, error = %e, "Skipping malformed comment row");
                    None
                }
            }
        })
        .collect()
}

fn profile_map(profiles: Vec<Profile>) -> HashMap<DbId, AuthorProfile> {
    profiles
        .into_iter()
        .map(|p| (p.id, AuthorProfile::from(p)))
        .collect()
}

fn tag_map(tags: Vec<QuestionTag>) -> HashMap<DbId, Vec<TagRecord>> {
    let mut map: HashMap<DbId, Vec<TagRecord>> = HashMap::new();
    for tag in tags {
        map.entry(tag.question_id).or_default().push(tag.into());
    }
    map
}

fn tally_map(tallies: Vec<VoteTally>) -> HashMap<DbId, AggregateCounts> {
    tallies.into_iter().map(|t| (t.target_id, t.counts())).collect()
}

fn lookup_author(
    profiles: &HashMap<DbId, AuthorProfile>,
    id: Option<DbId>,
) -> Option<AuthorProfile> {
    id.and_then(|id| profiles.get(&id).cloned())
}

fn assemble_questions(
    questions: Vec<RawQuestion>,
    profiles: Vec<Profile>,
    tags: Vec<QuestionTag>,
    tallies: Vec<VoteTally>,
    answer_counts: Vec<AnswerCount>,
) -> Vec<QuestionRecord> {
    let profiles = profile_map(profiles);
    let mut tags = tag_map(tags);
    let tallies = tally_map(tallies);
    let answer_counts: HashMap<DbId, i64> = answer_counts
        .into_iter()
        .map(|c| (c.question_id, c.answer_count))
        .collect();

    questions
        .into_iter()
        .map(|question| QuestionRecord {
            author: lookup_author(&profiles, question.author_id),
            tags: tags.remove(&question.id).unwrap_or_default(),
            votes: tallies.get(&question.id).copied(),
            answer_count: answer_counts.get(&question.id).copied(),
            question,
        })
        .collect()
}

fn assemble_detail(
    question: RawQuestion,
    answers: Vec<RawAnswer>,
    comments: Vec<RawComment>,
    profiles: Vec<Profile>,
    tags: Vec<QuestionTag>,
    question_tallies: Vec<VoteTally>,
    answer_tallies: Vec<VoteTally>,
) -> QuestionDetailRecord {
    let profiles = profile_map(profiles);
    let answer_tallies = tally_map(answer_tallies);

    let mut question_comments = Vec::new();
    let mut answer_comments: HashMap<DbId, Vec<CommentRecord>> = HashMap::new();
    for comment in comments {
        let record = CommentRecord {
            author: lookup_author(&profiles, comment.author_id),
            comment,
        };
        match record.comment.target {
            CommentTarget::Question(_) => question_comments.push(record),
            CommentTarget::Answer(answer_id) => {
                answer_comments.entry(answer_id).or_default().push(record)
            }
        }
    }

    let answer_count = answers.len() as i64;
    let answers = answers
        .into_iter()
        .map(|answer| AnswerRecord {
            author: lookup_author(&profiles, answer.author_id),
            votes: answer_tallies.get(&answer.id).copied(),
            comments: answer_comments.remove(&answer.id).unwrap_or_default(),
            answer,
        })
        .collect();

    let question = QuestionRecord {
        author: lookup_author(&profiles, question.author_id),
        tags: tag_map(tags).remove(&question.id).unwrap_or_default(),
        votes: tally_map(question_tallies).get(&question.id).copied(),
        answer_count: Some(answer_count),
        question,
    };

    QuestionDetailRecord {
        question,
        answers,
        comments: question_comments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn raw_question(id: DbId, author_id: Option<DbId>) -> RawQuestion {
        RawQuestion {
            id,
            title: format!("Question {id}"),
            description: "body".to_string(),
            author_id,
            views: 0,
            created_at: ts(id),
        }
    }

    fn profile(id: DbId) -> Profile {
        Profile {
            id,
            username: format!("user{id}"),
            display_name: format!("User {id}"),
            avatar_url: None,
            reputation: 0,
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    fn question_tag(question_id: DbId, id: DbId, name: &str, position: i32) -> QuestionTag {
        QuestionTag {
            question_id,
            id,
            name: name.to_string(),
            position,
        }
    }

    #[test]
    fn questions_pick_up_their_own_relations() {
        let records = assemble_questions(
            vec![raw_question(1, Some(10)), raw_question(2, Some(99))],
            vec![profile(10)],
            vec![
                question_tag(1, 5, "rust", 0),
                question_tag(1, 6, "async", 1),
                question_tag(2, 5, "rust", 0),
            ],
            vec![VoteTally {
                target_id: 2,
                likes: 4,
                dislikes: 1,
                user_vote: Some("like".to_string()),
            }],
            vec![AnswerCount {
                question_id: 1,
                answer_count: 3,
            }],
        );

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.author.as_ref().map(|a| a.id), Some(10));
        let names: Vec<&str> = first.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "async"]);
        assert_eq!(first.votes, None);
        assert_eq!(first.answer_count, Some(3));

        let second = &records[1];
        assert!(second.author.is_none());
        assert_eq!(second.tags.len(), 1);
        assert_eq!(second.votes.map(|v| v.score()), Some(3));
        assert_eq!(second.answer_count, None);
    }

    #[test]
    fn detail_routes_comments_to_their_parent() {
        let answer = RawAnswer {
            id: 7,
            question_id: 1,
            author_id: Some(10),
            content: "try this".to_string(),
            created_at: ts(5),
        };
        let comment = |id: DbId, target: CommentTarget| RawComment {
            id,
            content: "+1".to_string(),
            author_id: Some(10),
            target,
            created_at: ts(id),
        };

        let detail = assemble_detail(
            raw_question(1, None),
            vec![answer],
            vec![
                comment(20, CommentTarget::Question(1)),
                comment(21, CommentTarget::Answer(7)),
                comment(22, CommentTarget::Answer(7)),
            ],
            vec![profile(10)],
            vec![question_tag(1, 5, "rust", 0)],
            Vec::new(),
            vec![VoteTally {
                target_id: 7,
                likes: 0,
                dislikes: 2,
                user_vote: None,
            }],
        );

        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.answers.len(), 1);
        assert_eq!(detail.answers[0].comments.len(), 2);
        assert_eq!(detail.answers[0].votes.map(|v| v.score()), Some(-2));
        assert_eq!(detail.question.answer_count, Some(1));
        assert_eq!(detail.question.tags.len(), 1);
    }

    #[test]
    fn malformed_comment_rows_are_skipped() {
        let row = |id: DbId, question_id: Option<DbId>, answer_id: Option<DbId>| Comment {
            id,
            content: "c".to_string(),
            author_id: None,
            question_id,
            answer_id,
            created_at: ts(0),
        };
        let comments = valid_comments(vec![
            row(1, Some(1), None),
            row(2, Some(1), Some(3)),
            row(3, None, None),
        ]);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, 1);
    }

    #[test]
    fn distinct_ids_are_sorted_and_unique() {
        assert_eq!(distinct([3, 1, 3, 2].into_iter()), vec![1, 2, 3]);
    }
}
