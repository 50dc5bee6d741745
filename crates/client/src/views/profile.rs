//! The signed-in member's profile page.

use chrono::Utc;
use serde::Serialize;

use qaforum_core::age::format_age;
use qaforum_core::error::CoreError;
use qaforum_core::read_model::{excerpt, EXCERPT_CHARS};
use qaforum_core::records::{RawQuestion, UserActivity};
use qaforum_core::session::{Session, SessionUser};
use qaforum_core::types::{DbId, Timestamp};

use crate::backend::ForumBackend;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub questions_asked: i64,
    pub answers_posted: i64,
    pub comments_posted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileQuestion {
    pub id: DbId,
    pub title: String,
    pub excerpt: String,
    pub views: i64,
    pub created_at: Timestamp,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePage {
    pub user: SessionUser,
    pub stats: ProfileStats,
    /// Newest first.
    pub questions: Vec<ProfileQuestion>,
}

/// Load the profile of whoever is signed in.
pub async fn load_profile(
    backend: &dyn ForumBackend,
    session: &Session,
) -> Result<ProfilePage, CoreError> {
    let user = session.require_user("view your profile")?;
    let activity = backend.user_activity(user.id).await?;
    Ok(build_profile(user.clone(), activity, Utc::now()))
}

pub fn build_profile(user: SessionUser, activity: UserActivity, now: Timestamp) -> ProfilePage {
    let mut questions: Vec<RawQuestion> = activity.questions;
    questions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    ProfilePage {
        user,
        stats: ProfileStats {
            questions_asked: activity.questions_asked.max(0),
            answers_posted: activity.answers_posted.max(0),
            comments_posted: activity.comments_posted.max(0),
        },
        questions: questions
            .into_iter()
            .map(|q| ProfileQuestion {
                id: q.id,
                excerpt: excerpt(&q.description, EXCERPT_CHARS),
                title: q.title,
                views: q.views.max(0),
                age: format_age(q.created_at, now),
                created_at: q.created_at,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn questions_are_listed_newest_first() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let question = |id: DbId, days: i64| RawQuestion {
            id,
            title: format!("Q{id}"),
            description: "body".to_string(),
            author_id: Some(1),
            views: 3,
            created_at: now - Duration::days(days),
        };
        let activity = UserActivity {
            questions_asked: 2,
            answers_posted: 4,
            comments_posted: 0,
            questions: vec![question(1, 3), question(2, 1)],
        };
        let user = SessionUser {
            id: 1,
            username: "ada".to_string(),
            display_name: "Ada".to_string(),
        };

        let page = build_profile(user, activity, now);
        assert_eq!(page.stats.answers_posted, 4);
        let ids: Vec<DbId> = page.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(page.questions[0].age, "1 day ago");
    }
}
