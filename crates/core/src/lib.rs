//! Domain logic for the Q&A forum read model.
//!
//! Everything in this crate is pure and synchronous: raw records go in,
//! display-ready read models, filtered lists and pagination windows come
//! out. Persistence and orchestration live in `qaforum-db` and
//! `qaforum-client`.

pub mod age;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod read_model;
pub mod records;
pub mod session;
pub mod submission;
pub mod types;
pub mod vote;
