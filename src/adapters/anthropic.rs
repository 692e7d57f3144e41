use crate::config::settings::AnthropicSettings;
use crate::domain::ports::LanguageModel;
use crate::utils::error::{FocusError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_required_field};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Messages API transport. Retries 429/5xx with exponential backoff; the
/// request timeout surfaces as [`FocusError::LlmTimeoutError`].
#[derive(Clone)]
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl AnthropicModel {
    pub fn new(settings: &AnthropicSettings) -> Result<Self> {
        let api_key = validate_required_field("anthropic.api_key", &settings.api_key)?.clone();
        validate_non_empty_string("anthropic.api_key", &api_key)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_tokens: settings.max_tokens,
            retry_attempts: settings.retry_attempts,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        })
    }

    async fn send_once(&self, request: &MessagesRequest<'_>) -> std::result::Result<String, Attempt> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| Attempt::Retryable(transport_error(e)))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Model API returned {}: {}", status, body);
            return Err(Attempt::Retryable(FocusError::LlmUnavailableError {
                message: format!("status {}: {}", status.as_u16(), body),
            }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(Attempt::Fatal(FocusError::LlmUnavailableError {
                message: format!("status {}: {}", status.as_u16(), message),
            }));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(transport_error(e)))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or(Attempt::Fatal(FocusError::LlmUnavailableError {
                message: "response contained no text block".to_string(),
            }))
    }
}

enum Attempt {
    Retryable(FocusError),
    Fatal(FocusError),
}

fn transport_error(e: reqwest::Error) -> FocusError {
    if e.is_timeout() {
        FocusError::LlmTimeoutError {
            message: e.to_string(),
        }
    } else {
        FocusError::LlmUnavailableError {
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    async fn complete(&self, persona: &str, payload: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: persona,
            messages: vec![Message {
                role: "user",
                content: payload,
            }],
        };

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                // 指數退避：delay, 2*delay, 4*delay ...
                let delay = self.retry_delay * 2u32.saturating_pow(attempt - 1);
                tracing::warn!(
                    "Model call attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&request).await {
                Ok(text) => {
                    tracing::debug!(model = %self.model, attempt, "Model call succeeded");
                    return Ok(text);
                }
                Err(Attempt::Retryable(e)) if attempt < self.retry_attempts => {
                    tracing::debug!("Retryable model error: {}", e);
                    attempt += 1;
                }
                Err(Attempt::Retryable(e)) | Err(Attempt::Fatal(e)) => return Err(e),
            }
        }
    }
}
