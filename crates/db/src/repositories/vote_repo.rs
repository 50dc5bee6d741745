//! Repository for the `votes` table.
//!
//! Every vote write goes through [`VoteRepo::apply`], which runs the
//! state-machine transition for one (user, target) key inside a single
//! transaction holding an advisory lock on that key. The read of the
//! current vote and the resulting insert / update / delete can therefore
//! never interleave with another writer for the same key.

use qaforum_core::types::DbId;
use qaforum_core::vote::{TargetType, VoteState, VoteTarget, VoteTransition, VoteType};
use sqlx::PgPool;

use crate::models::vote::VoteTally;

/// Aggregate query shared by single- and multi-target tallies.
/// `$1` target type, `$2` target ids, `$3` viewer id (nullable).
const TALLY_QUERY: &str = "\
    SELECT target_id, \
           COUNT(*) FILTER (WHERE vote_type = 'like') AS likes, \
           COUNT(*) FILTER (WHERE vote_type = 'dislike') AS dislikes, \
           MAX(vote_type) FILTER (WHERE user_id = $3) AS user_vote \
    FROM votes \
    WHERE target_type = $1 AND target_id = ANY($2) \
    GROUP BY target_id";

/// The committed result of one vote submission.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub transition: VoteTransition,
    /// Tally of the target after the write, seen by the submitting user.
    pub tally: VoteTally,
}

pub struct VoteRepo;

impl VoteRepo {
    /// Apply a submission of `submitted` by `user_id` on `target`.
    ///
    /// Returns `None` when the target question or answer does not exist;
    /// nothing is written in that case.
    pub async fn apply(
        pool: &PgPool,
        user_id: DbId,
        target: VoteTarget,
        submitted: VoteType,
    ) -> Result<Option<VoteOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(lock_key(user_id, target))
            .execute(&mut *tx)
            .await?;

        let exists_query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            target_table(target.kind)
        );
        let exists = sqlx::query_scalar::<_, bool>(&exists_query)
            .bind(target.id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let current = sqlx::query_scalar::<_, String>(
            "SELECT vote_type FROM votes \
             WHERE user_id = $1 AND target_type = $2 AND target_id = $3 \
             FOR UPDATE",
        )
        .bind(user_id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current
            .map(|v| v.parse::<VoteType>())
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let transition = VoteState::from(current).submit(submitted);

        match transition {
            VoteTransition::Create(vote_type) => {
                sqlx::query(
                    "INSERT INTO votes (user_id, target_type, target_id, vote_type) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(user_id)
                .bind(target.kind.as_str())
                .bind(target.id)
                .bind(vote_type.as_str())
                .execute(&mut *tx)
                .await?;
            }
            VoteTransition::Update { to, .. } => {
                sqlx::query(
                    "UPDATE votes SET vote_type = $4, updated_at = now() \
                     WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
                )
                .bind(user_id)
                .bind(target.kind.as_str())
                .bind(target.id)
                .bind(to.as_str())
                .execute(&mut *tx)
                .await?;
            }
            VoteTransition::Delete(_) => {
                sqlx::query(
                    "DELETE FROM votes \
                     WHERE user_id = $1 AND target_type = $2 AND target_id = $3",
                )
                .bind(user_id)
                .bind(target.kind.as_str())
                .bind(target.id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let tally = sqlx::query_as::<_, VoteTally>(TALLY_QUERY)
            .bind(target.kind.as_str())
            .bind(vec![target.id])
            .bind(Some(user_id))
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or_else(|| VoteTally {
                target_id: target.id,
                ..VoteTally::default()
            });

        tx.commit().await?;

        tracing::debug!(
            user_id,
            target = %target,
            ?transition,
            likes = tally.likes,
            dislikes = tally.dislikes,
            "Vote applied",
        );

        Ok(Some(VoteOutcome { transition, tally }))
    }

    /// Tallies for many targets of one type. Targets without votes are absent.
    pub async fn tally_for_targets(
        pool: &PgPool,
        kind: TargetType,
        target_ids: &[DbId],
        viewer_id: Option<DbId>,
    ) -> Result<Vec<VoteTally>, sqlx::Error> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, VoteTally>(TALLY_QUERY)
            .bind(kind.as_str())
            .bind(target_ids)
            .bind(viewer_id)
            .fetch_all(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Table holding the targets of the given kind.
fn target_table(kind: TargetType) -> &'static str {
    match kind {
        TargetType::Question => "questions",
        TargetType::Answer => "answers",
    }
}

/// Advisory-lock key text for one (user, target) pair.
fn lock_key(user_id: DbId, target: VoteTarget) -> String {
    format!("vote:{user_id}:{target}")
}
