use crate::domain::model::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Invalid project record: {message}")]
    ValidationError { message: String },

    #[error("No projects to rank")]
    NoProjectsError,

    #[error("Model response is missing the '{label}' section")]
    MissingSectionError { label: String },

    #[error("Model response has a malformed completion value: '{value}'")]
    MalformedCompletionError { value: String },

    #[error("Project source unavailable: {message}")]
    SourceUnavailableError { message: String },

    #[error("Language model unavailable: {message}")]
    LlmUnavailableError { message: String },

    #[error("Language model timed out: {message}")]
    LlmTimeoutError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("[{stage}] {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<FocusError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    ModelResponse,
    External,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FocusError {
    pub fn at(stage: Stage, source: FocusError) -> Self {
        // 已經帶有階段的錯誤不重複包裝
        match source {
            FocusError::Stage { .. } => source,
            other => FocusError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            FocusError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error without its stage tag.
    pub fn root(&self) -> &FocusError {
        match self {
            FocusError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            FocusError::ValidationError { .. } | FocusError::NoProjectsError => ErrorCategory::Input,
            FocusError::MissingSectionError { .. } | FocusError::MalformedCompletionError { .. } => {
                ErrorCategory::ModelResponse
            }
            FocusError::SourceUnavailableError { .. }
            | FocusError::LlmUnavailableError { .. }
            | FocusError::LlmTimeoutError { .. } => ErrorCategory::External,
            FocusError::ConfigError { .. }
            | FocusError::InvalidConfigValueError { .. }
            | FocusError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FocusError::IoError(_) | FocusError::SerializationError(_) | FocusError::Stage { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 外部服務錯誤通常可以重試
            ErrorCategory::External | ErrorCategory::ModelResponse => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.root() {
            FocusError::ValidationError { .. } => {
                "Fix the offending project in the source database (completion must be 0-100, names unique)"
            }
            FocusError::NoProjectsError => {
                "Add projects with Name, Completion, Priority, Last Activity, Client Project, Deadline and Next Action properties"
            }
            FocusError::MissingSectionError { .. } | FocusError::MalformedCompletionError { .. } => {
                "Re-run the command; use --dry-run for a model-free recommendation"
            }
            FocusError::SourceUnavailableError { .. } => {
                "Check NOTION_API_KEY, NOTION_DATABASE_ID and that the integration can read the database"
            }
            FocusError::LlmUnavailableError { .. } => {
                "Check ANTHROPIC_API_KEY and network access, or use --dry-run"
            }
            FocusError::LlmTimeoutError { .. } => {
                "Retry later or raise anthropic.timeout_seconds in the config file"
            }
            FocusError::ConfigError { .. }
            | FocusError::InvalidConfigValueError { .. }
            | FocusError::MissingConfigError { .. } => {
                "Review the config file and the NOTION_*/ANTHROPIC_* environment variables"
            }
            FocusError::IoError(_) | FocusError::SerializationError(_) | FocusError::Stage { .. } => {
                "Check file permissions and input file formats"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.stage() {
            Some(stage) => format!("Run failed while {}: {}", stage, self.root()),
            None => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;
