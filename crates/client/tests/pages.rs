//! Integration tests for asking questions, the tag index and profiles.

mod common;

use assert_matches::assert_matches;

use qaforum_client::views::DashboardQuery;
use qaforum_core::error::CoreError;
use qaforum_core::records::CommentTarget;
use qaforum_core::session::Session;
use qaforum_core::submission::NewQuestion;

use common::{ago, user_id, Forum};

// ---------------------------------------------------------------------------
// Test: asking a question
// ---------------------------------------------------------------------------

#[tokio::test]
async fn asked_question_appears_on_dashboard_with_normalized_tags() {
    let forum = Forum::new();

    let id = forum
        .client
        .ask_question(
            &forum.ada,
            NewQuestion::new(" How do I pin? ", "Details", ["Async", "RUST", "async"]),
        )
        .await
        .unwrap();

    let dashboard = forum.client.dashboard();
    dashboard
        .load(&forum.bob, &DashboardQuery::default())
        .await
        .unwrap();
    let page = dashboard.current().await.unwrap();
    assert_eq!(page.questions[0].id, id);
    assert_eq!(page.questions[0].title, "How do I pin?");
    assert_eq!(page.questions[0].tags, vec!["async", "rust"]);
    assert_eq!(page.questions[0].author.display_name, "Ada Lovelace");
    assert_eq!(page.questions[0].age, "just now");
}

#[tokio::test]
async fn invalid_question_never_reaches_the_store() {
    let forum = Forum::new();
    forum.backend.set_offline(true);

    let result = forum
        .client
        .ask_question(&forum.ada, NewQuestion::new("Title", "Body", Vec::<String>::new()))
        .await;

    assert_matches!(result, Err(CoreError::Validation(_)));
}

#[tokio::test]
async fn asking_requires_sign_in() {
    let forum = Forum::new();

    let result = forum
        .client
        .ask_question(&Session::anonymous(), NewQuestion::new("Title", "Body", ["rust"]))
        .await;

    assert_matches!(result, Err(CoreError::AuthRequired(_)));
}

// ---------------------------------------------------------------------------
// Test: tag index
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tag_index_counts_questions_per_tag() {
    let forum = Forum::new();
    forum.question(&forum.ada, "One", &["rust", "async"], 3);
    forum.question(&forum.ada, "Two", &["rust"], 2);
    forum.question(&forum.bob, "Three", &["css"], 1);

    let tags = forum.client.tag_index().await.unwrap();

    let summary: Vec<(&str, i64)> = tags
        .iter()
        .map(|t| (t.name.as_str(), t.question_count))
        .collect();
    assert_eq!(summary, vec![("async", 1), ("css", 1), ("rust", 2)]);
}

// ---------------------------------------------------------------------------
// Test: profile page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_shows_own_activity() {
    let forum = Forum::new();
    let older = forum.question(&forum.ada, "Older", &["rust"], 120);
    let newer = forum.question(&forum.ada, "Newer", &["rust"], 5);
    let bobs = forum.question(&forum.bob, "Bob's", &["rust"], 1);
    forum
        .backend
        .add_answer_at(bobs, Some(user_id(&forum.ada)), "Answer from Ada", ago(1));

    let mut thread = forum.client.open_question(&forum.ada, bobs).await.unwrap();
    thread.set_comment_draft(CommentTarget::Question(bobs), "Nice one");
    thread
        .post_comment(&forum.ada, CommentTarget::Question(bobs))
        .await
        .unwrap();

    let profile = forum.client.profile(&forum.ada).await.unwrap();

    assert_eq!(profile.user.username, "ada");
    assert_eq!(profile.stats.questions_asked, 2);
    assert_eq!(profile.stats.answers_posted, 1);
    assert_eq!(profile.stats.comments_posted, 1);
    let ids: Vec<_> = profile.questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![newer, older]);
    assert_eq!(profile.questions[1].age, "2 hours ago");
}

#[tokio::test]
async fn profile_requires_sign_in() {
    let forum = Forum::new();

    let result = forum.client.profile(&Session::anonymous()).await;

    assert_matches!(result, Err(CoreError::AuthRequired(_)));
}
