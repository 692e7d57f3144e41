use crate::domain::ports::LanguageModel;
use crate::utils::error::{FocusError, Result};
use async_trait::async_trait;

/// Stands in for the model when no API key is configured; any call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn complete(&self, _persona: &str, _payload: &str) -> Result<String> {
        Err(FocusError::MissingConfigError {
            field: "anthropic.api_key".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_model_refuses_calls() {
        let err = OfflineModel.complete("persona", "payload").await.unwrap_err();
        assert!(matches!(err, FocusError::MissingConfigError { .. }));
    }
}
