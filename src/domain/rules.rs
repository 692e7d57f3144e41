use crate::utils::error::Result;
use crate::utils::validation::{validate_range, Validate};
use serde::{Deserialize, Serialize};

/// Upper bound for any single bonus; four of them still fit in a `u32` score.
pub const MAX_BONUS: u32 = 1_000_000;

/// Thresholds and bonuses for the additive scoring rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Completion strictly above this counts as near completion.
    pub near_completion_threshold: i64,
    pub near_completion_bonus: u32,
    pub client_deadline_bonus: u32,
    /// Days without activity after which a project is stale.
    pub stale_after_days: i64,
    pub stale_high_priority_bonus: u32,
    pub actionable_bonus: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            near_completion_threshold: 75,
            near_completion_bonus: 1000,
            client_deadline_bonus: 500,
            stale_after_days: 7,
            stale_high_priority_bonus: 250,
            actionable_bonus: 100,
        }
    }
}

impl Validate for RuleConfig {
    fn validate(&self) -> Result<()> {
        validate_range(
            "rules.near_completion_threshold",
            self.near_completion_threshold,
            0,
            100,
        )?;
        validate_range("rules.stale_after_days", self.stale_after_days, 1, 3650)?;
        validate_range("rules.near_completion_bonus", self.near_completion_bonus, 0, MAX_BONUS)?;
        validate_range("rules.client_deadline_bonus", self.client_deadline_bonus, 0, MAX_BONUS)?;
        validate_range(
            "rules.stale_high_priority_bonus",
            self.stale_high_priority_bonus,
            0,
            MAX_BONUS,
        )?;
        validate_range("rules.actionable_bonus", self.actionable_bonus, 0, MAX_BONUS)?;
        Ok(())
    }
}
