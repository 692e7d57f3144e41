use crate::config::Settings;
use crate::core::engine::RunMode;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "weekly-focus")]
#[command(about = "Recommends ONE project to focus on this week")]
#[command(version)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Read projects from a JSON file instead of Notion
    #[arg(long, global = true)]
    pub projects_file: Option<String>,

    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true, global = true)]
    pub notion_api_key: Option<String>,

    #[arg(long, env = "NOTION_DATABASE_ID", global = true)]
    pub notion_database_id: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true, global = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "WEEKLY_FOCUS_MODEL", global = true)]
    pub model: Option<String>,

    /// Show all projects with priority scores
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON instead of formatted text
    #[arg(short, long)]
    pub json: bool,

    /// Rank projects without calling the language model
    #[arg(short, long)]
    pub dry_run: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Recommend this week's project (default)
    Recommend,
    /// Test connections to the project source and the language model
    Check,
}

impl CliConfig {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Recommend)
    }

    pub fn run_mode(&self) -> RunMode {
        RunMode {
            dry_run: self.dry_run,
            verbose: self.verbose,
        }
    }

    /// File settings (or defaults) with command-line values layered on top.
    pub fn load_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                Settings::from_file(path)?
            }
            None => Settings::default(),
        };

        if let Some(key) = &self.notion_api_key {
            settings.notion.api_key = Some(key.clone());
        }
        if let Some(id) = &self.notion_database_id {
            settings.notion.database_id = Some(id.clone());
        }
        if let Some(key) = &self.anthropic_api_key {
            settings.anthropic.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            settings.anthropic.model = model.clone();
        }

        Ok(settings)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }
        if let Some(path) = &self.projects_file {
            validate_path("projects_file", path)?;
        }
        Ok(())
    }
}
