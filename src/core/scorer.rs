use crate::domain::model::{Priority, ProjectRecord, RuleTag, ScoredProject};
use crate::domain::rules::RuleConfig;
use crate::utils::error::{FocusError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Scores every record against the additive rule set. Output order matches input order.
///
/// Fails on an out-of-range rule set, or on the first record whose completion
/// is outside 0..=100 or whose name repeats an earlier one; nothing is clamped.
pub fn score_projects(
    projects: &[ProjectRecord],
    now: DateTime<Utc>,
    rules: &RuleConfig,
) -> Result<Vec<ScoredProject>> {
    rules.validate()?;
    validate_batch(projects)?;

    Ok(projects
        .iter()
        .map(|project| score_project(project, now, rules))
        .collect())
}

fn validate_batch(projects: &[ProjectRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for project in projects {
        if !(0..=100).contains(&project.completion) {
            return Err(FocusError::ValidationError {
                message: format!(
                    "project '{}' has completion {} outside 0-100",
                    project.name, project.completion
                ),
            });
        }
        if !seen.insert(project.name.as_str()) {
            return Err(FocusError::ValidationError {
                message: format!("project name '{}' appears more than once", project.name),
            });
        }
    }
    Ok(())
}

pub fn score_project(project: &ProjectRecord, now: DateTime<Utc>, rules: &RuleConfig) -> ScoredProject {
    let mut score = 0u32;
    let mut matched_rules = Vec::new();

    if project.completion > rules.near_completion_threshold {
        score = score.saturating_add(rules.near_completion_bonus);
        matched_rules.push(RuleTag::NearCompletion);
    }

    if project.is_client_project && project.deadline.is_some() {
        score = score.saturating_add(rules.client_deadline_bonus);
        matched_rules.push(RuleTag::ClientDeadline);
    }

    if project.priority == Priority::High && is_stale(project, now, rules) {
        score = score.saturating_add(rules.stale_high_priority_bonus);
        matched_rules.push(RuleTag::StaleHighPriority);
    }

    if project
        .next_action
        .as_deref()
        .is_some_and(|action| !action.trim().is_empty())
    {
        score = score.saturating_add(rules.actionable_bonus);
        matched_rules.push(RuleTag::Actionable);
    }

    tracing::debug!(
        project = %project.name,
        score,
        rules = ?matched_rules,
        "scored project"
    );

    ScoredProject {
        project: project.clone(),
        score,
        matched_rules,
    }
}

/// No recorded activity counts as stale.
pub fn is_stale(project: &ProjectRecord, now: DateTime<Utc>, rules: &RuleConfig) -> bool {
    match project.last_activity {
        // 天數大到無法表示時，視為永不過期
        Some(last) => Duration::try_days(rules.stale_after_days)
            .is_some_and(|limit| now.signed_duration_since(last) > limit),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::MAX_BONUS;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn project(name: &str, completion: i64) -> ProjectRecord {
        ProjectRecord {
            name: name.to_string(),
            completion,
            priority: Priority::Medium,
            last_activity: Some(now() - Duration::days(2)),
            is_client_project: false,
            deadline: None,
            next_action: None,
            notes: None,
        }
    }

    #[test]
    fn test_near_completion_plus_actionable() {
        let mut p = project("Ledger", 90);
        p.next_action = Some("fix bug".to_string());

        let scored = score_project(&p, now(), &RuleConfig::default());

        assert_eq!(scored.score, 1100);
        assert_eq!(scored.matched_rules, vec![RuleTag::NearCompletion, RuleTag::Actionable]);
    }

    #[test]
    fn test_client_deadline_plus_stale_high_priority() {
        let mut p = project("Client Portal", 50);
        p.is_client_project = true;
        p.deadline = Some(now() + Duration::days(5));
        p.priority = Priority::High;
        p.last_activity = Some(now() - Duration::days(10));

        let scored = score_project(&p, now(), &RuleConfig::default());

        assert_eq!(scored.score, 750);
        assert!(scored.matched(RuleTag::ClientDeadline));
        assert!(scored.matched(RuleTag::StaleHighPriority));
    }

    #[test]
    fn test_no_matching_rules_scores_zero() {
        let scored = score_project(&project("Idle", 40), now(), &RuleConfig::default());
        assert_eq!(scored.score, 0);
        assert!(scored.matched_rules.is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let scored = score_project(&project("Edge", 75), now(), &RuleConfig::default());
        assert!(!scored.matched(RuleTag::NearCompletion));

        let scored = score_project(&project("Edge", 76), now(), &RuleConfig::default());
        assert!(scored.matched(RuleTag::NearCompletion));
    }

    #[test]
    fn test_missing_last_activity_is_stale() {
        let mut p = project("Forgotten", 10);
        p.priority = Priority::High;
        p.last_activity = None;

        let scored = score_project(&p, now(), &RuleConfig::default());
        assert_eq!(scored.score, 250);
    }

    #[test]
    fn test_stale_rule_needs_high_priority() {
        let mut p = project("Old but low", 10);
        p.priority = Priority::Low;
        p.last_activity = None;

        assert!(is_stale(&p, now(), &RuleConfig::default()));
        assert_eq!(score_project(&p, now(), &RuleConfig::default()).score, 0);
    }

    #[test]
    fn test_exactly_seven_days_is_not_stale() {
        let mut p = project("Borderline", 10);
        p.last_activity = Some(now() - Duration::days(7));
        assert!(!is_stale(&p, now(), &RuleConfig::default()));
    }

    #[test]
    fn test_whitespace_next_action_is_not_actionable() {
        let mut p = project("Blank", 10);
        p.next_action = Some("   ".to_string());
        assert_eq!(score_project(&p, now(), &RuleConfig::default()).score, 0);
    }

    #[test]
    fn test_client_without_deadline_gets_no_bonus() {
        let mut p = project("Retainer", 10);
        p.is_client_project = true;
        assert_eq!(score_project(&p, now(), &RuleConfig::default()).score, 0);
    }

    #[test]
    fn test_score_is_monotonic_in_matched_rules() {
        let rules = RuleConfig::default();
        let mut p = project("Growing", 50);
        p.priority = Priority::High;
        let mut last = score_project(&p, now(), &rules).score;

        p.next_action = Some("ship it".to_string());
        let s = score_project(&p, now(), &rules).score;
        assert!(s >= last);
        last = s;

        p.last_activity = Some(now() - Duration::days(30));
        let s = score_project(&p, now(), &rules).score;
        assert!(s >= last);
        last = s;

        p.is_client_project = true;
        p.deadline = Some(now());
        let s = score_project(&p, now(), &rules).score;
        assert!(s >= last);
        last = s;

        p.completion = 99;
        let s = score_project(&p, now(), &rules).score;
        assert!(s >= last);
        assert_eq!(s, 1850);
    }

    #[test]
    fn test_custom_rule_config() {
        let rules = RuleConfig {
            near_completion_threshold: 50,
            near_completion_bonus: 10,
            ..RuleConfig::default()
        };
        assert_eq!(score_project(&project("Half", 60), now(), &rules).score, 10);
    }

    #[test]
    fn test_out_of_range_completion_is_rejected() {
        let batch = vec![project("Ok", 20), project("Broken", 120)];
        let err = score_projects(&batch, now(), &RuleConfig::default()).unwrap_err();
        assert!(matches!(err, FocusError::ValidationError { .. }));

        let batch = vec![project("Negative", -1)];
        assert!(score_projects(&batch, now(), &RuleConfig::default()).is_err());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let batch = vec![project("Twin", 20), project("Twin", 30)];
        let err = score_projects(&batch, now(), &RuleConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Twin"));
    }

    #[test]
    fn test_order_is_preserved() {
        let batch = vec![project("B", 10), project("A", 90), project("C", 50)];
        let scored = score_projects(&batch, now(), &RuleConfig::default()).unwrap();
        let names: Vec<&str> = scored.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    fn all_rules_match() -> ProjectRecord {
        let mut p = project("Everything", 99);
        p.priority = Priority::High;
        p.last_activity = None;
        p.is_client_project = true;
        p.deadline = Some(now());
        p.next_action = Some("go".to_string());
        p
    }

    #[test]
    fn test_huge_bonuses_saturate_instead_of_overflowing() {
        let rules = RuleConfig {
            near_completion_bonus: u32::MAX,
            client_deadline_bonus: u32::MAX,
            stale_high_priority_bonus: u32::MAX,
            actionable_bonus: u32::MAX,
            ..RuleConfig::default()
        };

        let scored = score_project(&all_rules_match(), now(), &rules);
        assert_eq!(scored.score, u32::MAX);
        assert_eq!(scored.matched_rules.len(), 4);
    }

    #[test]
    fn test_oversized_bonus_fails_batch_scoring() {
        let rules = RuleConfig {
            near_completion_bonus: u32::MAX,
            ..RuleConfig::default()
        };
        let err = score_projects(&[project("Ledger", 90)], now(), &rules).unwrap_err();
        assert!(matches!(err, FocusError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_monotonic_under_maximum_bonuses() {
        let rules = RuleConfig {
            near_completion_bonus: MAX_BONUS,
            client_deadline_bonus: MAX_BONUS,
            stale_high_priority_bonus: MAX_BONUS,
            actionable_bonus: MAX_BONUS,
            ..RuleConfig::default()
        };
        let full = score_project(&all_rules_match(), now(), &rules).score;
        assert_eq!(full, 4 * MAX_BONUS);

        let mut fewer = all_rules_match();
        fewer.next_action = None;
        assert!(score_project(&fewer, now(), &rules).score <= full);
    }

    #[test]
    fn test_unrepresentable_stale_window_does_not_panic() {
        let rules = RuleConfig {
            stale_after_days: i64::MAX,
            ..RuleConfig::default()
        };
        let mut p = project("Old", 10);
        p.last_activity = Some(now() - Duration::days(5000));
        assert!(!is_stale(&p, now(), &rules));

        let err = score_projects(&[p], now(), &rules).unwrap_err();
        assert!(matches!(err, FocusError::InvalidConfigValueError { .. }));
    }
}
