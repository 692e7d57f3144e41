pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{AnthropicModel, JsonFileSource, NotionSource, OfflineModel, TerminalDisplay};
pub use config::Settings;
pub use core::engine::{FocusEngine, RunMode};
pub use domain::model::{ProjectRecord, Recommendation, RunOutcome, ScoredProject, Stage};
pub use utils::error::{FocusError, Result};
