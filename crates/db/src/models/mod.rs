pub mod answer;
pub mod comment;
pub mod profile;
pub mod question;
pub mod tag;
pub mod vote;
