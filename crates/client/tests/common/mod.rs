#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};

use qaforum_client::backend::MemoryBackend;
use qaforum_client::views::PageSettings;
use qaforum_client::ForumClient;
use qaforum_core::session::{Session, SessionUser};
use qaforum_core::types::{DbId, Timestamp};

/// A client over a fresh in-memory store, with two registered members.
pub struct Forum {
    pub backend: Arc<MemoryBackend>,
    pub client: ForumClient,
    pub ada: Session,
    pub bob: Session,
}

impl Forum {
    pub fn new() -> Self {
        Self::with_settings(PageSettings::default())
    }

    pub fn with_settings(settings: PageSettings) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let ada = member(&backend, "ada", "Ada Lovelace");
        let bob = member(&backend, "bob", "Bob Stone");
        let client = ForumClient::new(backend.clone(), settings);
        Self {
            backend,
            client,
            ada,
            bob,
        }
    }

    /// Seed a question by `author`, created `minutes_ago` before now.
    pub fn question(&self, author: &Session, title: &str, tags: &[&str], minutes_ago: i64) -> DbId {
        self.backend.add_question_at(
            author.viewer_id(),
            title,
            &format!("Details about {title}"),
            tags,
            ago(minutes_ago),
        )
    }
}

/// Register a profile and return a signed-in session for it.
pub fn member(backend: &MemoryBackend, username: &str, display_name: &str) -> Session {
    let id = backend.add_profile(username, display_name);
    Session::signed_in(SessionUser {
        id,
        username: username.to_string(),
        display_name: display_name.to_string(),
    })
}

pub fn ago(minutes: i64) -> Timestamp {
    Utc::now() - Duration::minutes(minutes)
}

pub fn user_id(session: &Session) -> DbId {
    session.viewer_id().expect("session is signed in")
}
