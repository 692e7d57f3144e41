use crate::domain::model::ProjectRecord;
use crate::domain::ports::ProjectSource;
use crate::utils::error::{FocusError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Loads a JSON array of project records from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProjectSource for JsonFileSource {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRecord>> {
        tracing::debug!("Reading projects from {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FocusError::SourceUnavailableError {
                message: format!("cannot read {}: {}", self.path.display(), e),
            }
        })?;

        serde_json::from_str(&content).map_err(|e| FocusError::SourceUnavailableError {
            message: format!("invalid project file {}: {}", self.path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reads_project_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "Ledger", "completion": 90, "priority": "Medium", "nextAction": "fix bug"}},
                {{"name": "Portal", "completion": 50, "priority": "High", "isClientProject": true, "deadline": "2026-11-01"}}
            ]"#
        )
        .unwrap();

        let projects = JsonFileSource::new(file.path()).fetch_projects().await.unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].next_action.as_deref(), Some("fix bug"));
        assert!(projects[1].deadline.is_some());
        assert!(projects[1].last_activity.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let source = JsonFileSource::new("/nonexistent/weekly-focus/projects.json");
        let err = source.fetch_projects().await.unwrap_err();
        assert!(matches!(err, FocusError::SourceUnavailableError { .. }));
    }

    #[test]
    fn test_malformed_json_is_source_unavailable() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let source = JsonFileSource::new(file.path());
        let err = tokio_test::block_on(source.fetch_projects()).unwrap_err();
        assert!(matches!(err, FocusError::SourceUnavailableError { .. }));
    }
}
