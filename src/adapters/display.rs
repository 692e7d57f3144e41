use crate::domain::model::{Recommendation, RunOutcome, ScoredProject};
use crate::domain::ports::Display;
use crate::utils::error::{FocusError, Result};
use std::fmt::Write;

/// Prints to stdout as labeled text or JSON; errors go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalDisplay {
    pub json: bool,
}

impl TerminalDisplay {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render(&self, outcome: &RunOutcome) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(outcome)?)
        } else {
            Ok(render_text(outcome))
        }
    }
}

impl Display for TerminalDisplay {
    fn show_outcome(&self, outcome: &RunOutcome) -> Result<()> {
        println!("{}", self.render(outcome)?);
        Ok(())
    }

    fn show_error(&self, error: &FocusError) {
        eprintln!("❌ {}", error.user_friendly_message());
        eprintln!("💡 Suggestion: {}", error.recovery_suggestion());
    }
}

pub fn render_text(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    if let Some(ranking) = &outcome.ranking {
        out.push_str(&render_ranking(ranking));
        out.push('\n');
    }
    out.push_str("This Week's Focus\n\n");
    out.push_str(&render_recommendation(&outcome.recommendation));
    out
}

pub fn render_recommendation(rec: &Recommendation) -> String {
    format!(
        "Project: {}\nCompletion: {}%\nWhy This Week: {}\nFirst Action: {}\nWhat Shipping Enables: {}",
        rec.project, rec.completion, rec.why_this_week, rec.first_action, rec.what_shipping_enables
    )
}

pub fn render_ranking(ranking: &[ScoredProject]) -> String {
    let name_width = ranking
        .iter()
        .map(|entry| entry.name().chars().count())
        .max()
        .unwrap_or(0)
        .max("Project".len());

    let mut out = String::from("All Projects (by priority)\n");
    let _ = writeln!(
        out,
        "{:>2}  {:<name_width$}  {:>10}  {:<8}  {:>5}  Rules",
        "#", "Project", "Completion", "Priority", "Score"
    );
    for (idx, entry) in ranking.iter().enumerate() {
        let rules = if entry.matched_rules.is_empty() {
            "-".to_string()
        } else {
            entry
                .matched_rules
                .iter()
                .map(|tag| tag.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let _ = writeln!(
            out,
            "{:>2}  {:<name_width$}  {:>9}%  {:<8}  {:>5}  {}",
            idx + 1,
            entry.name(),
            entry.completion(),
            entry.project.priority.to_string(),
            entry.score,
            rules
        );
    }
    out
}
