use crate::core::parser::SECTION_LABELS;
use crate::domain::model::{format_date, ScoredProject};
use crate::domain::rules::RuleConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const NOT_SET: &str = "(not set)";

/// Who the recommendation is written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub assistant_name: String,
    pub owner: String,
    pub personality_type: String,
    pub working_style: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            assistant_name: "Weekly Focus".to_string(),
            owner: "the project owner".to_string(),
            personality_type: "ENTP".to_string(),
            working_style: vec![
                "Loves starting new things, struggles to finish them".to_string(),
                "Thrives on novelty and challenge".to_string(),
                "75-80% completion is the danger zone for abandonment".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub persona: String,
    pub payload: String,
}

pub struct PromptBuilder {
    persona: Persona,
    rules: RuleConfig,
}

impl PromptBuilder {
    pub fn new(persona: Persona, rules: RuleConfig) -> Self {
        Self { persona, rules }
    }

    pub fn build(&self, selected: &ScoredProject, ranking: Option<&[ScoredProject]>) -> Prompt {
        Prompt {
            persona: self.persona_text(),
            payload: self.payload(selected, ranking),
        }
    }

    pub fn persona_text(&self) -> String {
        let persona = &self.persona;
        let rules = &self.rules;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "You are {}, a project oversight system for {}.",
            persona.assistant_name, persona.owner
        );
        out.push_str("\n## Your Role\n");
        out.push_str(
            "The project for this week has already been chosen by fixed rules. \
             Write the case for focusing on it, grounded only in the data you are given.\n",
        );

        let _ = writeln!(out, "\n## Working Style ({})", persona.personality_type);
        for line in &persona.working_style {
            let _ = writeln!(out, "- {}", line);
        }

        out.push_str("\n## Prioritization Rules\n");
        let _ = writeln!(
            out,
            "- Projects more than {}% complete: finish these first (+{})",
            rules.near_completion_threshold, rules.near_completion_bonus
        );
        let _ = writeln!(
            out,
            "- Client projects with deadlines: revenue depends on delivery (+{})",
            rules.client_deadline_bonus
        );
        let _ = writeln!(
            out,
            "- High-priority projects inactive for more than {} days (+{})",
            rules.stale_after_days, rules.stale_high_priority_bonus
        );
        let _ = writeln!(
            out,
            "- Projects with a clear next action defined (+{})",
            rules.actionable_bonus
        );

        out.push_str("\n## Reframing Strategy\n");
        out.push_str("Don't say \"grind through the remaining work\".\n");
        out.push_str(
            "Say \"Ship [PROJECT] this week - it's a new challenge: the challenge of finishing\".\n",
        );

        out.push_str("\n## Output Format\n");
        out.push_str(&response_format());
        out
    }

    /// Every field of the selected project is written out verbatim.
    pub fn payload(&self, selected: &ScoredProject, ranking: Option<&[ScoredProject]>) -> String {
        let project = &selected.project;
        let mut out = String::new();

        out.push_str("Recommend the project below as this week's single focus.\n\n");
        out.push_str("# Selected Project\n");
        let _ = writeln!(out, "- Name: {}", project.name);
        let _ = writeln!(out, "- Completion: {}%", project.completion);
        let _ = writeln!(out, "- Priority: {}", project.priority);
        let _ = writeln!(
            out,
            "- Last Activity: {}",
            project.last_activity.as_ref().map_or(NOT_SET.to_string(), format_date)
        );
        let _ = writeln!(
            out,
            "- Client Project: {}",
            if project.is_client_project { "yes" } else { "no" }
        );
        let _ = writeln!(
            out,
            "- Deadline: {}",
            project.deadline.as_ref().map_or(NOT_SET.to_string(), format_date)
        );
        let _ = writeln!(out, "- Next Action: {}", optional_text(&project.next_action));
        let _ = writeln!(out, "- Notes: {}", optional_text(&project.notes));
        let _ = writeln!(out, "- Priority Score: {}", selected.score);
        let _ = writeln!(out, "- Matched Rules: {}", rule_list(selected));

        if let Some(ranking) = ranking {
            out.push_str("\n# Full Ranking\n");
            for (idx, entry) in ranking.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} (score {}, {}% complete, rules: {})",
                    idx + 1,
                    entry.name(),
                    entry.score,
                    entry.completion(),
                    rule_list(entry)
                );
            }
        }

        out.push('\n');
        out.push_str(&response_format());
        out
    }
}

// 缺值與空字串要分開呈現
fn optional_text(value: &Option<String>) -> String {
    match value.as_deref() {
        None => NOT_SET.to_string(),
        Some("") => "\"\"".to_string(),
        Some(text) => text.to_string(),
    }
}

fn rule_list(entry: &ScoredProject) -> String {
    if entry.matched_rules.is_empty() {
        "none".to_string()
    } else {
        entry
            .matched_rules
            .iter()
            .map(|tag| tag.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn response_format() -> String {
    let hints = [
        "<project name>",
        "<completion as an integer percent>",
        "<1-2 sentences, emphasize what finishing unlocks>",
        "<specific, concrete next step>",
        "<what becomes possible after shipping>",
    ];
    let mut out = String::from(
        "Respond with exactly these five labeled sections, in this order, as plain text:\n",
    );
    for (label, hint) in SECTION_LABELS.iter().zip(hints) {
        let _ = writeln!(out, "{}: {}", label, hint);
    }
    out
}
