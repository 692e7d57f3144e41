use crate::domain::model::{ProjectRecord, RunOutcome};
use crate::utils::error::{FocusError, Result};
use async_trait::async_trait;

/// Where the project batch comes from (Notion, a JSON file, a test double).
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRecord>>;
}

/// Text-in, text-out model transport. Retries and timeouts live behind this trait.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, persona: &str, payload: &str) -> Result<String>;
}

pub trait Display {
    fn show_outcome(&self, outcome: &RunOutcome) -> Result<()>;
    fn show_error(&self, error: &FocusError);
}

#[async_trait]
impl<T: ProjectSource + ?Sized> ProjectSource for Box<T> {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRecord>> {
        (**self).fetch_projects().await
    }
}

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    async fn complete(&self, persona: &str, payload: &str) -> Result<String> {
        (**self).complete(persona, payload).await
    }
}
