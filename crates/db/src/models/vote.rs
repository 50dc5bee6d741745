//! Vote rows and per-target tallies.

use qaforum_core::types::DbId;
use qaforum_core::vote::{AggregateCounts, VoteType};
use sqlx::FromRow;

/// Like/dislike totals for one target, plus the viewer's vote if any.
#[derive(Debug, Clone, Default, FromRow)]
pub struct VoteTally {
    pub target_id: DbId,
    pub likes: i64,
    pub dislikes: i64,
    pub user_vote: Option<String>,
}

impl VoteTally {
    /// Convert to core counts. An unrecognised stored vote type is treated
    /// as no vote; the check constraint makes that unreachable in practice.
    pub fn counts(&self) -> AggregateCounts {
        AggregateCounts {
            likes: self.likes,
            dislikes: self.dislikes,
            user_vote: self
                .user_vote
                .as_deref()
                .and_then(|v| v.parse::<VoteType>().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_converts_to_counts() {
        let tally = VoteTally {
            target_id: 1,
            likes: 3,
            dislikes: 1,
            user_vote: Some("dislike".to_string()),
        };
        let counts = tally.counts();
        assert_eq!(counts.score(), 2);
        assert_eq!(counts.user_vote, Some(VoteType::Dislike));
    }
}
