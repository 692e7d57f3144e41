use crate::domain::model::{CompletionMismatch, ProjectMismatch, Recommendation, ScoredProject};
use crate::utils::error::{FocusError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Section labels, in the order the model must emit them.
pub const SECTION_LABELS: [&str; 5] = [
    "Project",
    "Completion",
    "Why This Week",
    "First Action",
    "What Shipping Enables",
];

/// The model's answer as written, before ground truth is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub project: String,
    pub completion: u8,
    pub why_this_week: String,
    pub first_action: String,
    pub what_shipping_enables: String,
}

fn label_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SECTION_LABELS
            .iter()
            .map(|label| {
                // 行首標籤，可帶 markdown 粗體：Project: / **Project**: / **Project:**
                let pattern = format!(
                    r"(?m)^[ \t]*(?:\*\*)?{}(?:\*\*)?[ \t]*:(?:\*\*)?",
                    regex::escape(label)
                );
                Regex::new(&pattern).expect("section label pattern is valid")
            })
            .collect()
    })
}

fn completion_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{1,3})[ \t]*%?$").expect("completion pattern is valid"))
}

/// Parses the five labeled sections. Each label must appear exactly once, at
/// the start of a line, in order. A missing, repeated or misplaced label, or
/// an empty section, is a [`FocusError::MissingSectionError`].
pub fn parse_response(raw: &str) -> Result<ParsedResponse> {
    let text = strip_code_fence(raw);

    // 所有行首標籤：(label 起點, 內容起點, label 序號)
    let mut found: Vec<(usize, usize, usize)> = label_patterns()
        .iter()
        .enumerate()
        .flat_map(|(idx, pattern)| pattern.find_iter(text).map(move |m| (m.start(), m.end(), idx)))
        .collect();
    found.sort_unstable();

    for (position, &(_, _, idx)) in found.iter().enumerate() {
        if idx != position {
            let expected = SECTION_LABELS.get(position).copied().unwrap_or(SECTION_LABELS[idx]);
            tracing::warn!(
                expected,
                found = SECTION_LABELS[idx],
                "model response has a repeated or out-of-order section label"
            );
            return Err(FocusError::MissingSectionError {
                label: expected.to_string(),
            });
        }
    }
    if let Some(label) = SECTION_LABELS.get(found.len()) {
        return Err(FocusError::MissingSectionError {
            label: label.to_string(),
        });
    }

    let spans: Vec<(usize, usize)> = found.iter().map(|&(start, end, _)| (start, end)).collect();

    let mut values = Vec::with_capacity(spans.len());
    for (idx, &(_, value_start)) in spans.iter().enumerate() {
        let value_end = spans.get(idx + 1).map_or(text.len(), |&(next_start, _)| next_start);
        let value = text[value_start..value_end].trim();
        if value.is_empty() {
            return Err(FocusError::MissingSectionError {
                label: SECTION_LABELS[idx].to_string(),
            });
        }
        values.push(value.to_string());
    }

    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    let project = next();
    let completion = parse_completion(&next())?;

    Ok(ParsedResponse {
        project,
        completion,
        why_this_week: next(),
        first_action: next(),
        what_shipping_enables: next(),
    })
}

/// Accepts `85` or `85%`; anything else, or a value above 100, is malformed.
pub fn parse_completion(value: &str) -> Result<u8> {
    let malformed = || FocusError::MalformedCompletionError {
        value: value.to_string(),
    };

    let caps = completion_pattern().captures(value.trim()).ok_or_else(malformed)?;
    let percent: u8 = caps[1].parse().map_err(|_| malformed())?;
    if percent > 100 {
        return Err(malformed());
    }
    Ok(percent)
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // 去掉 ```lang 這一行
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// A parsed response with ground truth applied, plus any disagreements found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedResponse {
    pub recommendation: Recommendation,
    pub completion_mismatch: Option<CompletionMismatch>,
    pub project_mismatch: Option<ProjectMismatch>,
}

impl ParsedResponse {
    /// Builds the final recommendation from the selected project's name and
    /// recorded completion. Disagreeing model values are kept as mismatches.
    pub fn into_recommendation(self, selected: &ScoredProject) -> GroundedResponse {
        // scorer 已驗證 0..=100
        let authoritative = selected.completion().clamp(0, 100) as u8;

        let completion_mismatch = (self.completion != authoritative).then(|| {
            tracing::warn!(
                project = %selected.name(),
                claimed = self.completion,
                authoritative,
                "model completion disagrees with the project record; using the record"
            );
            CompletionMismatch {
                claimed: self.completion,
                authoritative,
            }
        });

        let project_mismatch = (self.project != selected.name()).then(|| {
            tracing::warn!(
                expected = %selected.name(),
                named = %self.project,
                "model named a different project than the one selected"
            );
            ProjectMismatch {
                claimed: self.project,
                authoritative: selected.name().to_string(),
            }
        });

        let recommendation = Recommendation {
            project: selected.name().to_string(),
            completion: authoritative,
            why_this_week: self.why_this_week,
            first_action: self.first_action,
            what_shipping_enables: self.what_shipping_enables,
        };
        GroundedResponse {
            recommendation,
            completion_mismatch,
            project_mismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Priority, ProjectRecord};

    const WELL_FORMED: &str = "Project: Ledger Sync
Completion: 85%
Why This Week: You're one push from done.
Finishing it frees the whole of next month.
First Action: Write the migration guide.
What Shipping Enables: Billing for the new tier can start.";

    fn selected(completion: i64) -> ScoredProject {
        ScoredProject {
            project: ProjectRecord {
                name: "Ledger Sync".to_string(),
                completion,
                priority: Priority::High,
                last_activity: None,
                is_client_project: false,
                deadline: None,
                next_action: None,
                notes: None,
            },
            score: 1000,
            matched_rules: vec![],
        }
    }

    #[test]
    fn test_parses_all_five_sections() {
        let parsed = parse_response(WELL_FORMED).unwrap();

        assert_eq!(parsed.project, "Ledger Sync");
        assert_eq!(parsed.completion, 85);
        assert_eq!(
            parsed.why_this_week,
            "You're one push from done.\nFinishing it frees the whole of next month."
        );
        assert_eq!(parsed.first_action, "Write the migration guide.");
        assert_eq!(parsed.what_shipping_enables, "Billing for the new tier can start.");
    }

    #[test]
    fn test_missing_first_action_label() {
        let broken = WELL_FORMED.replace("First Action:", "");
        let err = parse_response(&broken).unwrap_err();
        assert!(matches!(err, FocusError::MissingSectionError { label } if label == "First Action"));
    }

    #[test]
    fn test_out_of_order_labels_are_missing() {
        let swapped = "Completion: 85
Project: Ledger Sync
Why This Week: a
First Action: b
What Shipping Enables: c";
        assert!(matches!(
            parse_response(swapped).unwrap_err(),
            FocusError::MissingSectionError { .. }
        ));
    }

    #[test]
    fn test_empty_section_is_missing() {
        let empty = WELL_FORMED.replace("Write the migration guide.", "   ");
        let err = parse_response(&empty).unwrap_err();
        assert!(matches!(err, FocusError::MissingSectionError { label } if label == "First Action"));
    }

    #[test]
    fn test_markdown_bold_labels_and_code_fence() {
        let text = "```text
**Project**: Ledger Sync
**Completion:** 85
**Why This Week**: Momentum.
**First Action**: Tag the release.
**What Shipping Enables**: A clean slate.
```";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.project, "Ledger Sync");
        assert_eq!(parsed.completion, 85);
        assert_eq!(parsed.what_shipping_enables, "A clean slate.");
    }

    #[test]
    fn test_label_inside_a_sentence_is_not_a_section() {
        let text = "Project: Ledger Sync
Completion: 85
Why This Week: The First Action: matters less than momentum.
First Action: Tag it.
What Shipping Enables: Rest.";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.why_this_week, "The First Action: matters less than momentum.");
        assert_eq!(parsed.first_action, "Tag it.");
    }

    #[test]
    fn test_malformed_completion_values() {
        for bad in ["eighty", "85.5", "-3", "101", "250%", "about 80%"] {
            let text = WELL_FORMED.replace("85%", bad);
            let err = parse_response(&text).unwrap_err();
            assert!(
                matches!(err, FocusError::MalformedCompletionError { .. }),
                "{} should be malformed",
                bad
            );
        }
    }

    #[test]
    fn test_parse_completion_accepts_bounds() {
        assert_eq!(parse_completion("0").unwrap(), 0);
        assert_eq!(parse_completion("100 %").unwrap(), 100);
    }

    #[test]
    fn test_completion_override_uses_record() {
        let text = WELL_FORMED.replace("85%", "99%");
        let parsed = parse_response(&text).unwrap();

        let grounded = parsed.into_recommendation(&selected(85));

        assert_eq!(grounded.recommendation.completion, 85);
        assert_eq!(
            grounded.completion_mismatch,
            Some(CompletionMismatch {
                claimed: 99,
                authoritative: 85
            })
        );
    }

    #[test]
    fn test_matching_completion_has_no_mismatch() {
        let parsed = parse_response(WELL_FORMED).unwrap();
        let grounded = parsed.into_recommendation(&selected(85));
        assert_eq!(grounded.recommendation.project, "Ledger Sync");
        assert!(grounded.completion_mismatch.is_none());
        assert!(grounded.project_mismatch.is_none());
    }

    #[test]
    fn test_other_project_name_uses_record() {
        let text = WELL_FORMED.replace("Project: Ledger Sync", "Project: Billing Portal");
        let grounded = parse_response(&text).unwrap().into_recommendation(&selected(85));

        assert_eq!(grounded.recommendation.project, "Ledger Sync");
        assert_eq!(grounded.recommendation.completion, 85);
        assert_eq!(
            grounded.project_mismatch,
            Some(ProjectMismatch {
                claimed: "Billing Portal".to_string(),
                authoritative: "Ledger Sync".to_string(),
            })
        );
    }

    #[test]
    fn test_label_inside_another_section_is_rejected() {
        let text = "Project: Ledger Sync
Completion: 85
Why This Week: a
Project: Other
First Action: b
What Shipping Enables: c";
        let err = parse_response(text).unwrap_err();
        assert!(matches!(err, FocusError::MissingSectionError { label } if label == "First Action"));
    }

    #[test]
    fn test_repeated_block_after_last_section_is_rejected() {
        let text = format!("{}\nProject: Other\nCompletion: 10", WELL_FORMED);
        assert!(matches!(
            parse_response(&text).unwrap_err(),
            FocusError::MissingSectionError { .. }
        ));
    }
}
