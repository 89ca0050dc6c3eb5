pub mod job;
pub mod loaders;
pub mod question;

pub use job::{Job, JobList};
pub use loaders::load_jobs;
pub use question::{normalize_question, QuestionAnswer, QuestionKind};
