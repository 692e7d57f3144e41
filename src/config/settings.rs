use crate::core::prompt::Persona;
use crate::domain::rules::RuleConfig;
use crate::utils::error::{FocusError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NOTION_URL: &str = "https://api.notion.com";
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Everything a run needs, built once and passed down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notion: NotionSettings,
    pub anthropic: AnthropicSettings,
    pub rules: RuleConfig,
    pub persona: Persona,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    pub api_key: Option<String>,
    pub database_id: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            database_id: None,
            base_url: DEFAULT_NOTION_URL.to_string(),
            page_size: 100,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_ANTHROPIC_URL.to_string(),
            max_tokens: 1024,
            timeout_seconds: 60,
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Settings {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FocusError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FocusError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NOTION_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FocusError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("notion.base_url", &self.notion.base_url)?;
        validate_range("notion.page_size", self.notion.page_size, 1, 100)?;
        validate_url("anthropic.base_url", &self.anthropic.base_url)?;
        validate_non_empty_string("anthropic.model", &self.anthropic.model)?;
        validate_range("anthropic.max_tokens", self.anthropic.max_tokens, 1, 64_000)?;
        validate_range("anthropic.timeout_seconds", self.anthropic.timeout_seconds, 1, 600)?;
        self.rules.validate()?;
        Ok(())
    }
}
