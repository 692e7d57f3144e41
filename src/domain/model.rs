use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(label)
    }
}

/// One project's health snapshot for a single run.
///
/// `completion` is kept signed and unclamped on purpose: the scorer is the
/// one place that rejects out-of-range values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    pub completion: i64,
    pub priority: Priority,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_client_project: bool,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Parses `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Renders a date as `YYYY-MM-DD` when it falls on midnight UTC, RFC 3339 otherwise.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleTag {
    NearCompletion,
    ClientDeadline,
    StaleHighPriority,
    Actionable,
}

impl RuleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleTag::NearCompletion => "near-completion",
            RuleTag::ClientDeadline => "client-deadline",
            RuleTag::StaleHighPriority => "stale-high-priority",
            RuleTag::Actionable => "actionable",
        }
    }
}

impl fmt::Display for RuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProject {
    pub project: ProjectRecord,
    pub score: u32,
    pub matched_rules: Vec<RuleTag>,
}

impl ScoredProject {
    pub fn name(&self) -> &str {
        &self.project.name
    }

    pub fn completion(&self) -> i64 {
        self.project.completion
    }

    pub fn matched(&self, tag: RuleTag) -> bool {
        self.matched_rules.contains(&tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub project: String,
    pub completion: u8,
    pub why_this_week: String,
    pub first_action: String,
    pub what_shipping_enables: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionMismatch {
    pub claimed: u8,
    pub authoritative: u8,
}

/// The model named a project other than the selected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectMismatch {
    pub claimed: String,
    pub authoritative: String,
}

/// Result of one successful run, handed to the display collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub recommendation: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Vec<ScoredProject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_mismatch: Option<CompletionMismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_mismatch: Option<ProjectMismatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetching,
    Scoring,
    Ranking,
    BuildingPrompt,
    Calling,
    Parsing,
    DryRunSynthesis,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Fetching => "fetching",
            Stage::Scoring => "scoring",
            Stage::Ranking => "ranking",
            Stage::BuildingPrompt => "building-prompt",
            Stage::Calling => "calling",
            Stage::Parsing => "parsing",
            Stage::DryRunSynthesis => "dry-run-synthesis",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}
