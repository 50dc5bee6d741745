//! Per-user vote state machine and aggregate like/dislike counts.
//!
//! A user holds at most one vote per target. Submitting a vote moves the
//! (user, target) pair through three states:
//!
//! | From       | Submit like        | Submit dislike        |
//! |------------|--------------------|-----------------------|
//! | `None`     | create like        | create dislike        |
//! | `Liked`    | delete (toggle-off)| update to dislike     |
//! | `Disliked` | update to like     | delete (toggle-off)   |
//!
//! Stores apply the returned [`VoteTransition`] as a single write keyed on
//! (user, target); an update never goes through a delete + create.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Vote and target discriminators
// ---------------------------------------------------------------------------

/// The kind of vote a user casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Like,
    Dislike,
}

impl VoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Like => "like",
            VoteType::Dislike => "dislike",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteType::Like),
            "dislike" => Ok(VoteType::Dislike),
            other => Err(CoreError::Validation(format!(
                "Invalid vote type '{other}'. Must be one of: like, dislike"
            ))),
        }
    }
}

/// What a vote or comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Question,
    Answer,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Question => "question",
            TargetType::Answer => "answer",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(TargetType::Question),
            "answer" => Ok(TargetType::Answer),
            other => Err(CoreError::Validation(format!(
                "Invalid target type '{other}'. Must be one of: question, answer"
            ))),
        }
    }
}

/// A (type, id) pair identifying a question or an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoteTarget {
    pub kind: TargetType,
    pub id: DbId,
}

impl VoteTarget {
    pub fn question(id: DbId) -> Self {
        Self {
            kind: TargetType::Question,
            id,
        }
    }

    pub fn answer(id: DbId) -> Self {
        Self {
            kind: TargetType::Answer,
            id,
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// The uniqueness key of a vote row: one user, one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoteKey {
    pub user_id: DbId,
    pub target: VoteTarget,
}

/// A persisted vote row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub target: VoteTarget,
    pub vote_type: VoteType,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Vote state of one user on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteState {
    #[default]
    None,
    Liked,
    Disliked,
}

impl VoteState {
    /// The vote type held in this state, if any.
    pub fn vote_type(self) -> Option<VoteType> {
        match self {
            VoteState::None => None,
            VoteState::Liked => Some(VoteType::Like),
            VoteState::Disliked => Some(VoteType::Dislike),
        }
    }

    /// Decide what write a submission of `submitted` requires from this state.
    pub fn submit(self, submitted: VoteType) -> VoteTransition {
        match self.vote_type() {
            None => VoteTransition::Create(submitted),
            Some(current) if current == submitted => VoteTransition::Delete(current),
            Some(current) => VoteTransition::Update {
                from: current,
                to: submitted,
            },
        }
    }
}

impl From<Option<VoteType>> for VoteState {
    fn from(vote: Option<VoteType>) -> Self {
        match vote {
            None => VoteState::None,
            Some(VoteType::Like) => VoteState::Liked,
            Some(VoteType::Dislike) => VoteState::Disliked,
        }
    }
}

/// The single store write a submission maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No row existed; insert one.
    Create(VoteType),
    /// A row of the other type existed; change its `vote_type` in place.
    Update { from: VoteType, to: VoteType },
    /// A row of the same type existed; remove it.
    Delete(VoteType),
}

impl VoteTransition {
    pub fn next_state(self) -> VoteState {
        match self {
            VoteTransition::Create(created) => Some(created).into(),
            VoteTransition::Update { to, .. } => Some(to).into(),
            VoteTransition::Delete(_) => VoteState::None,
        }
    }

    /// Change in (likes, dislikes) this transition causes on the target's tally.
    pub fn tally_delta(self) -> (i64, i64) {
        fn unit(vote: VoteType) -> (i64, i64) {
            match vote {
                VoteType::Like => (1, 0),
                VoteType::Dislike => (0, 1),
            }
        }
        match self {
            VoteTransition::Create(created) => unit(created),
            VoteTransition::Delete(removed) => {
                let (l, d) = unit(removed);
                (-l, -d)
            }
            VoteTransition::Update { from, to } => {
                let (fl, fd) = unit(from);
                let (tl, td) = unit(to);
                (tl - fl, td - fd)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate counts
// ---------------------------------------------------------------------------

/// Derived like/dislike totals for one target plus the viewer's own vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateCounts {
    pub likes: i64,
    pub dislikes: i64,
    pub user_vote: Option<VoteType>,
}

impl AggregateCounts {
    pub fn score(&self) -> i64 {
        self.likes - self.dislikes
    }
}

/// Count the votes on `target`, reporting `viewer`'s own vote if present.
pub fn tally<'a, I>(votes: I, target: VoteTarget, viewer: Option<DbId>) -> AggregateCounts
where
    I: IntoIterator<Item = &'a VoteRecord>,
{
    votes
        .into_iter()
        .filter(|v| v.target == target)
        .fold(AggregateCounts::default(), |mut acc, v| {
            match v.vote_type {
                VoteType::Like => acc.likes += 1,
                VoteType::Dislike => acc.dislikes += 1,
            }
            if viewer == Some(v.user_id) {
                acc.user_vote = Some(v.vote_type);
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn vote(id: DbId, user_id: DbId, target: VoteTarget, vote_type: VoteType) -> VoteRecord {
        VoteRecord {
            id,
            user_id,
            target,
            vote_type,
            created_at: chrono::Utc::now(),
        }
    }

    // -- state machine -------------------------------------------------------

    #[test]
    fn none_creates_submitted_type() {
        assert_eq!(
            VoteState::None.submit(VoteType::Like),
            VoteTransition::Create(VoteType::Like)
        );
        assert_eq!(
            VoteState::None.submit(VoteType::Dislike),
            VoteTransition::Create(VoteType::Dislike)
        );
    }

    #[test]
    fn same_type_toggles_off() {
        let t = VoteState::Liked.submit(VoteType::Like);
        assert_eq!(t, VoteTransition::Delete(VoteType::Like));
        assert_eq!(t.next_state(), VoteState::None);

        let t = VoteState::Disliked.submit(VoteType::Dislike);
        assert_eq!(t.next_state(), VoteState::None);
    }

    #[test]
    fn other_type_updates_in_place() {
        let t = VoteState::Liked.submit(VoteType::Dislike);
        assert_eq!(
            t,
            VoteTransition::Update {
                from: VoteType::Like,
                to: VoteType::Dislike
            }
        );
        assert_eq!(t.next_state(), VoteState::Disliked);
    }

    #[test]
    fn double_submit_nets_to_none() {
        let first = VoteState::None.submit(VoteType::Like);
        let second = first.next_state().submit(VoteType::Like);
        assert_eq!(second.next_state(), VoteState::None);

        let (l1, d1) = first.tally_delta();
        let (l2, d2) = second.tally_delta();
        assert_eq!((l1 + l2, d1 + d2), (0, 0));
    }

    #[test]
    fn switch_moves_one_like_to_dislike() {
        let t = VoteState::Liked.submit(VoteType::Dislike);
        assert_eq!(t.tally_delta(), (-1, 1));
    }

    #[test]
    fn every_sequence_ends_in_at_most_one_vote() {
        let inputs = [
            VoteType::Like,
            VoteType::Like,
            VoteType::Dislike,
            VoteType::Like,
            VoteType::Dislike,
            VoteType::Dislike,
            VoteType::Like,
        ];
        let mut state = VoteState::None;
        let mut rows: i64 = 0;
        for input in inputs {
            let t = state.submit(input);
            rows += match t {
                VoteTransition::Create(_) => 1,
                VoteTransition::Update { .. } => 0,
                VoteTransition::Delete(_) => -1,
            };
            assert!((0..=1).contains(&rows));
            assert_eq!(rows == 1, t.next_state() != VoteState::None);
            state = t.next_state();
        }
    }

    // -- parsing -------------------------------------------------------------

    #[test]
    fn vote_type_round_trips_through_str() {
        assert_eq!("like".parse::<VoteType>().unwrap(), VoteType::Like);
        assert_eq!(VoteType::Dislike.as_str(), "dislike");
        assert_matches!("upvote".parse::<VoteType>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn target_type_rejects_unknown() {
        assert_eq!("answer".parse::<TargetType>().unwrap(), TargetType::Answer);
        assert_matches!("comment".parse::<TargetType>(), Err(CoreError::Validation(_)));
    }

    // -- tally ---------------------------------------------------------------

    #[test]
    fn tally_counts_only_the_target() {
        let q1 = VoteTarget::question(1);
        let a1 = VoteTarget::answer(1);
        let votes = vec![
            vote(1, 10, q1, VoteType::Like),
            vote(2, 11, q1, VoteType::Like),
            vote(3, 12, q1, VoteType::Dislike),
            vote(4, 10, a1, VoteType::Dislike),
        ];

        let counts = tally(&votes, q1, Some(12));
        assert_eq!(counts.likes, 2);
        assert_eq!(counts.dislikes, 1);
        assert_eq!(counts.score(), 1);
        assert_eq!(counts.user_vote, Some(VoteType::Dislike));
    }

    #[test]
    fn tally_without_viewer_has_no_user_vote() {
        let q1 = VoteTarget::question(1);
        let votes = vec![vote(1, 10, q1, VoteType::Like)];
        assert_eq!(tally(&votes, q1, None).user_vote, None);
    }

    #[test]
    fn tally_of_nothing_is_zeroed() {
        let none: Vec<VoteRecord> = Vec::new();
        let counts = tally(&none, VoteTarget::question(7), Some(1));
        assert_eq!(counts, AggregateCounts::default());
    }
}
