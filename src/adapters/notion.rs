use crate::config::settings::NotionSettings;
use crate::domain::model::{parse_date, Priority, ProjectRecord};
use crate::domain::ports::ProjectSource;
use crate::utils::error::{FocusError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_required_field};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;

const NOTION_VERSION: &str = "2022-06-28";

/// Reads the project database through the Notion query API, following pagination.
pub struct NotionSource {
    client: Client,
    api_key: String,
    database_id: String,
    base_url: String,
    page_size: u32,
}

impl NotionSource {
    pub fn new(settings: &NotionSettings) -> Result<Self> {
        let api_key = validate_required_field("notion.api_key", &settings.api_key)?.clone();
        let database_id =
            validate_required_field("notion.database_id", &settings.database_id)?.clone();
        validate_non_empty_string("notion.api_key", &api_key)?;
        validate_non_empty_string("notion.database_id", &database_id)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(unavailable)?;

        Ok(Self {
            client,
            api_key,
            database_id,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            page_size: settings.page_size,
        })
    }

    async fn query_page(&self, start_cursor: Option<&str>) -> Result<Value> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, self.database_id);

        let mut body = json!({ "page_size": self.page_size });
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = Value::String(cursor.to_string());
        }

        tracing::debug!("Querying Notion database: {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(unavailable)?;

        let status = response.status();
        tracing::debug!("Notion response status: {}", status);
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FocusError::SourceUnavailableError {
                message: format!("Notion returned {}: {}", status, detail),
            });
        }

        response.json().await.map_err(unavailable)
    }
}

#[async_trait]
impl ProjectSource for NotionSource {
    async fn fetch_projects(&self) -> Result<Vec<ProjectRecord>> {
        let mut projects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.query_page(cursor.as_deref()).await?;

            if let Some(results) = page.get("results").and_then(Value::as_array) {
                projects.extend(results.iter().filter_map(parse_page));
            }

            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            cursor = page
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);

            // has_more 但沒有 cursor 時停止，避免無限迴圈
            if !has_more || cursor.is_none() {
                break;
            }
        }

        tracing::debug!("Parsed {} projects from Notion", projects.len());
        Ok(projects)
    }
}

fn unavailable(e: reqwest::Error) -> FocusError {
    FocusError::SourceUnavailableError {
        message: e.to_string(),
    }
}

/// Maps one database row; rows without a name are skipped.
pub fn parse_page(page: &Value) -> Option<ProjectRecord> {
    let empty = Map::new();
    let props = page
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let prop = |name: &str| props.get(name);

    let name = match prop("Name").and_then(title) {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            let id = page.get("id").and_then(Value::as_str).unwrap_or("unknown");
            tracing::warn!(page = id, "⚠️ Skipping Notion page without a name");
            return None;
        }
    };

    // 數值直接截斷為整數，超出範圍交給 scorer 拒絕
    let completion = prop("Completion").and_then(number).map_or(0, |n| n as i64);

    let priority = match prop("Priority").and_then(select) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!(project = %name, "{}; treating as Medium", e);
            Priority::Medium
        }),
        None => Priority::Medium,
    };

    Some(ProjectRecord {
        completion,
        priority,
        last_activity: prop("Last Activity").and_then(date),
        is_client_project: prop("Client Project").map(checkbox).unwrap_or(false),
        deadline: prop("Deadline").and_then(date),
        next_action: prop("Next Action").and_then(rich_text),
        notes: prop("Notes").and_then(rich_text),
        name,
    })
}

fn title(prop: &Value) -> Option<String> {
    prop.get("title")?
        .as_array()?
        .first()?
        .get("plain_text")?
        .as_str()
        .map(str::to_string)
}

fn number(prop: &Value) -> Option<f64> {
    prop.get("number")?.as_f64()
}

fn select(prop: &Value) -> Option<String> {
    prop.get("select")?.get("name")?.as_str().map(str::to_string)
}

fn checkbox(prop: &Value) -> bool {
    prop.get("checkbox").and_then(Value::as_bool).unwrap_or(false)
}

fn date(prop: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    let start = prop.get("date")?.get("start")?.as_str()?;
    parse_date(start)
}

fn rich_text(prop: &Value) -> Option<String> {
    let blocks = prop.get("rich_text")?.as_array()?;
    if blocks.is_empty() {
        return None;
    }
    Some(
        blocks
            .iter()
            .filter_map(|block| block.get("plain_text").and_then(Value::as_str))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(properties: Value) -> Value {
        json!({ "id": "page-1", "properties": properties })
    }

    #[test]
    fn test_parse_full_page() {
        let page = page(json!({
            "Name": { "title": [{ "plain_text": "Ledger Sync" }] },
            "Completion": { "number": 85 },
            "Priority": { "select": { "name": "High" } },
            "Last Activity": { "date": { "start": "2026-10-01" } },
            "Client Project": { "checkbox": true },
            "Deadline": { "date": { "start": "2026-11-01T17:00:00.000Z" } },
            "Next Action": { "rich_text": [{ "plain_text": "Write " }, { "plain_text": "docs" }] },
            "Notes": { "rich_text": [] }
        }));

        let record = parse_page(&page).unwrap();

        assert_eq!(record.name, "Ledger Sync");
        assert_eq!(record.completion, 85);
        assert_eq!(record.priority, Priority::High);
        assert!(record.last_activity.is_some());
        assert!(record.is_client_project);
        assert!(record.deadline.is_some());
        assert_eq!(record.next_action.as_deref(), Some("Write docs"));
        assert!(record.notes.is_none());
    }

    #[test]
    fn test_page_without_name_is_skipped() {
        let page = page(json!({
            "Name": { "title": [] },
            "Completion": { "number": 50 }
        }));
        assert!(parse_page(&page).is_none());
    }

    #[test]
    fn test_missing_properties_use_defaults() {
        let page = page(json!({
            "Name": { "title": [{ "plain_text": "Bare" }] },
            "Priority": { "select": null }
        }));

        let record = parse_page(&page).unwrap();

        assert_eq!(record.completion, 0);
        assert_eq!(record.priority, Priority::Medium);
        assert!(!record.is_client_project);
        assert!(record.last_activity.is_none());
    }

    #[test]
    fn test_out_of_range_completion_passes_through() {
        let page = page(json!({
            "Name": { "title": [{ "plain_text": "Overflow" }] },
            "Completion": { "number": 150 }
        }));
        assert_eq!(parse_page(&page).unwrap().completion, 150);
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = NotionSource::new(&NotionSettings::default()).err().unwrap();
        assert!(matches!(err, FocusError::MissingConfigError { .. }));
    }
}
