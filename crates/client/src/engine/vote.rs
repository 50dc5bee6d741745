//! Vote reconciliation.
//!
//! A submission names only the button pressed. The store resolves it
//! against the user's current vote (see
//! [`qaforum_core::vote::VoteState::submit`]) and the engine reports the
//! counts the store confirmed. Nothing is applied optimistically: a
//! failed submission leaves every displayed count untouched.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use qaforum_core::error::CoreError;
use qaforum_core::session::Session;
use qaforum_core::types::DbId;
use qaforum_core::vote::{AggregateCounts, VoteKey, VoteTarget, VoteType};

use crate::backend::ForumBackend;

pub struct VoteEngine {
    backend: Arc<dyn ForumBackend>,
    in_flight: Mutex<HashSet<VoteKey>>,
}

impl VoteEngine {
    pub fn new(backend: Arc<dyn ForumBackend>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Submit a like or dislike on `target` for the signed-in user.
    ///
    /// Returns the target's counts as committed by the store.
    ///
    /// # Errors
    ///
    /// - `AuthRequired` when the session is anonymous; the store is not called.
    /// - `Conflict` when a submission for the same user and target is
    ///   still in flight; the second one is rejected, not queued.
    /// - Whatever the store reports otherwise (`NotFound`, `Network`, ...).
    pub async fn submit_vote(
        &self,
        session: &Session,
        target: VoteTarget,
        vote_type: VoteType,
    ) -> Result<AggregateCounts, CoreError> {
        let user = session.require_user("vote")?;
        let key = VoteKey {
            user_id: user.id,
            target,
        };

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, key) else {
            tracing::warn!(
                user_id = user.id,
                target = %target,
                %vote_type,
                "Vote rejected: submission already in flight",
            );
            return Err(CoreError::Conflict(format!(
                "A vote on {target} is already being submitted"
            )));
        };

        match self.backend.submit_vote(user.id, target, vote_type).await {
            Ok(receipt) => {
                let mut counts = receipt.counts;
                counts.user_vote = receipt.transition.next_state().vote_type();
                tracing::info!(
                    user_id = user.id,
                    target = %target,
                    transition = ?receipt.transition,
                    likes = counts.likes,
                    dislikes = counts.dislikes,
                    "Vote recorded",
                );
                Ok(counts)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = user.id,
                    target = %target,
                    %vote_type,
                    error = %e,
                    retryable = e.is_transient(),
                    "Vote submission failed",
                );
                Err(e)
            }
        }
    }

    /// Whether a submission for this key is currently awaiting the store.
    pub fn is_in_flight(&self, user_id: DbId, target: VoteTarget) -> bool {
        lock(&self.in_flight).contains(&VoteKey { user_id, target })
    }
}

fn lock(set: &Mutex<HashSet<VoteKey>>) -> std::sync::MutexGuard<'_, HashSet<VoteKey>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a key as in flight; clears it when dropped, on every exit path.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<VoteKey>>,
    key: VoteKey,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<VoteKey>>, key: VoteKey) -> Option<Self> {
        if lock(set).insert(key) {
            Some(Self { set, key })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.key);
    }
}
