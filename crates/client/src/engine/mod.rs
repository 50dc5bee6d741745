//! Write-side engines.
//!
//! [`vote::VoteEngine`] drives the like/dislike state machine against a
//! [`crate::backend::ForumBackend`], guarding each (user, target) key so
//! only one submission per key is ever in flight.

pub mod vote;

pub use vote::VoteEngine;
