//! Integration tests for `VoteEngine` against the in-memory store.
//!
//! Covers the toggle and switch laws, the one-row-per-key invariant over
//! long submission sequences, failure atomicity and the in-flight guard.

mod common;

use assert_matches::assert_matches;

use qaforum_core::error::CoreError;
use qaforum_core::session::Session;
use qaforum_core::vote::{AggregateCounts, VoteTarget, VoteType};

use common::{user_id, Forum};

// ---------------------------------------------------------------------------
// Test: like twice returns to no vote
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_law_restores_counts() {
    let forum = Forum::new();
    let target = VoteTarget::question(forum.question(&forum.bob, "Lifetimes", &["rust"], 5));
    let engine = forum.client.votes();

    let before = engine.submit_vote(&forum.bob, target, VoteType::Dislike).await.unwrap();
    let liked = engine.submit_vote(&forum.ada, target, VoteType::Like).await.unwrap();
    let cleared = engine.submit_vote(&forum.ada, target, VoteType::Like).await.unwrap();

    assert_eq!(liked.likes, before.likes + 1);
    assert_eq!(cleared.likes, before.likes);
    assert_eq!(cleared.dislikes, before.dislikes);
    assert_eq!(cleared.user_vote, None);
    assert_eq!(forum.backend.vote_rows(user_id(&forum.ada), target), 0);
}

// ---------------------------------------------------------------------------
// Test: like then dislike switches the single row
// ---------------------------------------------------------------------------

#[tokio::test]
async fn switch_law_moves_one_vote() {
    let forum = Forum::new();
    let target = VoteTarget::question(forum.question(&forum.bob, "Borrowck", &["rust"], 5));
    let engine = forum.client.votes();

    let liked = engine.submit_vote(&forum.ada, target, VoteType::Like).await.unwrap();
    let switched = engine.submit_vote(&forum.ada, target, VoteType::Dislike).await.unwrap();

    assert_eq!(switched.likes, liked.likes - 1);
    assert_eq!(switched.dislikes, liked.dislikes + 1);
    assert_eq!(liked.score() - switched.score(), 2);
    assert_eq!(switched.user_vote, Some(VoteType::Dislike));
    assert_eq!(forum.backend.vote_rows(user_id(&forum.ada), target), 1);
}

// ---------------------------------------------------------------------------
// Test: at most one row per (user, target) over any sequence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn long_sequences_keep_one_row_per_key() {
    let forum = Forum::new();
    let question = forum.question(&forum.ada, "Pinning", &["async"], 10);
    let answer = forum.backend.add_answer_at(
        question,
        Some(user_id(&forum.bob)),
        "Use Box::pin",
        common::ago(5),
    );
    let targets = [VoteTarget::question(question), VoteTarget::answer(answer)];
    let users = [&forum.ada, &forum.bob];
    let engine = forum.client.votes();

    // Deterministic but irregular walk through users, targets and buttons.
    let mut seed: u32 = 7;
    for _ in 0..60 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let user = users[(seed >> 16) as usize % 2];
        let target = targets[(seed >> 17) as usize % 2];
        let vote = if (seed >> 18) % 2 == 0 {
            VoteType::Like
        } else {
            VoteType::Dislike
        };

        let counts = engine.submit_vote(user, target, vote).await.unwrap();

        for u in users {
            for t in targets {
                assert!(forum.backend.vote_rows(user_id(u), t) <= 1);
            }
        }
        let rows: i64 = users
            .iter()
            .map(|u| forum.backend.vote_rows(user_id(u), target) as i64)
            .sum();
        assert_eq!(counts.likes + counts.dislikes, rows);
    }
}

// ---------------------------------------------------------------------------
// Test: signed-out voting is refused before reaching the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_vote_requires_sign_in() {
    let forum = Forum::new();
    let target = VoteTarget::question(forum.question(&forum.ada, "Traits", &["rust"], 1));

    let result = forum
        .client
        .votes()
        .submit_vote(&Session::anonymous(), target, VoteType::Like)
        .await;

    assert_matches!(result, Err(CoreError::AuthRequired(msg)) if msg.contains("vote"));
    assert_eq!(forum.backend.vote_rows(user_id(&forum.ada), target), 0);
}

// ---------------------------------------------------------------------------
// Test: a failed write leaves the previous vote in place
// ---------------------------------------------------------------------------

#[tokio::test]
async fn network_failure_leaves_vote_unchanged() {
    let forum = Forum::new();
    let target = VoteTarget::question(forum.question(&forum.bob, "Macros", &["rust"], 1));
    let engine = forum.client.votes();

    let liked = engine.submit_vote(&forum.ada, target, VoteType::Like).await.unwrap();

    forum.backend.set_offline(true);
    let result = engine.submit_vote(&forum.ada, target, VoteType::Dislike).await;
    assert_matches!(result, Err(CoreError::Network(_)));
    forum.backend.set_offline(false);

    assert_eq!(forum.backend.vote_rows(user_id(&forum.ada), target), 1);
    let thread = forum.client.open_question(&forum.ada, target.id).await.unwrap();
    let question = &thread.detail().unwrap().question;
    assert_eq!(question.likes, liked.likes);
    assert_eq!(question.dislikes, liked.dislikes);
    assert_eq!(question.user_vote, Some(VoteType::Like));
}

#[tokio::test]
async fn voting_on_a_missing_target_is_not_found() {
    let forum = Forum::new();
    let result = forum
        .client
        .votes()
        .submit_vote(&forum.ada, VoteTarget::answer(9_999), VoteType::Like)
        .await;
    assert_matches!(result, Err(CoreError::NotFound { entity: "answer", id: 9_999 }));
}

// ---------------------------------------------------------------------------
// Test: concurrent submissions for one key
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_double_submit_is_rejected() {
    let forum = Forum::new();
    let target = VoteTarget::question(forum.question(&forum.bob, "Send + Sync", &["rust"], 1));
    let engine = forum.client.votes();
    let ada_id = user_id(&forum.ada);
    let release = forum.backend.hold_next_vote();

    let first = engine.submit_vote(&forum.ada, target, VoteType::Like);
    let second = async {
        while !engine.is_in_flight(ada_id, target) {
            tokio::task::yield_now().await;
        }
        let result = engine.submit_vote(&forum.ada, target, VoteType::Like).await;
        release.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    let committed = first.unwrap();
    assert_matches!(second, Err(CoreError::Conflict(_)));
    assert_eq!(
        committed,
        AggregateCounts {
            likes: 1,
            dislikes: 0,
            user_vote: Some(VoteType::Like),
        }
    );
    assert_eq!(forum.backend.vote_rows(ada_id, target), 1);
    assert!(!engine.is_in_flight(ada_id, target));
}

#[tokio::test]
async fn in_flight_guard_is_per_target() {
    let forum = Forum::new();
    let first_target = VoteTarget::question(forum.question(&forum.bob, "One", &["rust"], 2));
    let other_target = VoteTarget::question(forum.question(&forum.bob, "Two", &["rust"], 1));
    let engine = forum.client.votes();
    let ada_id = user_id(&forum.ada);
    let release = forum.backend.hold_next_vote();

    let first = engine.submit_vote(&forum.ada, first_target, VoteType::Like);
    let second = async {
        while !engine.is_in_flight(ada_id, first_target) {
            tokio::task::yield_now().await;
        }
        let result = engine.submit_vote(&forum.ada, other_target, VoteType::Dislike).await;
        release.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap().likes, 1);
    assert_eq!(second.unwrap().dislikes, 1);
}

// ---------------------------------------------------------------------------
// Test: aggregated score agrees with the engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aggregated_score_matches_engine_counts() {
    let forum = Forum::new();
    let id = forum.question(&forum.ada, "Iterators", &["rust"], 1);
    let target = VoteTarget::question(id);
    let engine = forum.client.votes();

    engine.submit_vote(&forum.ada, target, VoteType::Like).await.unwrap();
    let counts = engine.submit_vote(&forum.bob, target, VoteType::Dislike).await.unwrap();

    let thread = forum.client.open_question(&forum.bob, id).await.unwrap();
    let question = &thread.detail().unwrap().question;
    assert_eq!(question.score, counts.score());
    assert_eq!((question.likes, question.dislikes), (1, 1));
    assert_eq!(question.user_vote, Some(VoteType::Dislike));
}
