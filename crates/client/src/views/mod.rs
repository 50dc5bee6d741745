//! View controllers: each one turns backend records into what a page shows.

pub mod dashboard;
pub mod detail;
pub mod profile;
pub mod tags;

pub use dashboard::{Dashboard, DashboardPage, DashboardQuery, LoadOutcome, PageSettings};
pub use detail::{DetailView, QuestionDetail, QuestionThread};
pub use profile::{load_profile, ProfilePage};
pub use tags::load_tag_index;
