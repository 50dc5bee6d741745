pub mod answer_repo;
pub mod comment_repo;
pub mod profile_repo;
pub mod question_repo;
pub mod tag_repo;
pub mod vote_repo;

pub use answer_repo::AnswerRepo;
pub use comment_repo::CommentRepo;
pub use profile_repo::ProfileRepo;
pub use question_repo::QuestionRepo;
pub use tag_repo::TagRepo;
pub use vote_repo::VoteRepo;
