pub mod engine;
pub mod parser;
pub mod prompt;
pub mod ranker;
pub mod scorer;

pub use crate::domain::model::{ProjectRecord, Recommendation, RunOutcome, ScoredProject, Stage};
pub use crate::domain::ports::{Display, LanguageModel, ProjectSource};
pub use crate::utils::error::Result;
