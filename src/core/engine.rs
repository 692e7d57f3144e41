use crate::core::parser::{parse_response, GroundedResponse};
use crate::core::prompt::{Persona, PromptBuilder};
use crate::core::ranker::Ranking;
use crate::core::scorer::score_projects;
use crate::domain::model::{Recommendation, RunOutcome, ScoredProject, Stage};
use crate::domain::ports::{LanguageModel, ProjectSource};
use crate::domain::rules::RuleConfig;
use crate::utils::error::{FocusError, Result};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    /// Skip the model and fill the recommendation from a fixed template.
    pub dry_run: bool,
    /// Return the full ranking and include it in the model payload.
    pub verbose: bool,
}

pub struct FocusEngine<S: ProjectSource, L: LanguageModel> {
    source: S,
    model: L,
    rules: RuleConfig,
    prompts: PromptBuilder,
    mode: RunMode,
}

impl<S: ProjectSource, L: LanguageModel> FocusEngine<S, L> {
    pub fn new(source: S, model: L, rules: RuleConfig, persona: Persona, mode: RunMode) -> Self {
        let prompts = PromptBuilder::new(persona, rules.clone());
        Self {
            source,
            model,
            rules,
            prompts,
            mode,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    /// One all-or-nothing pass. Errors come back tagged with the stage they came from.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let mut stage = Stage::Fetching;

        match self.execute(now, &mut stage).await {
            Ok(outcome) => {
                tracing::debug!(from = %stage, to = %Stage::Done, "stage transition");
                tracing::info!(
                    project = %outcome.recommendation.project,
                    dry_run = self.mode.dry_run,
                    "✅ Recommendation ready"
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!(from = %stage, to = %Stage::Failed, "stage transition");
                tracing::error!(stage = %stage, error = %e, "❌ Run failed");
                Err(FocusError::at(stage, e))
            }
        }
    }

    async fn execute(&self, now: DateTime<Utc>, stage: &mut Stage) -> Result<RunOutcome> {
        let projects = self.source.fetch_projects().await?;
        tracing::info!("📥 Fetched {} projects", projects.len());

        enter(stage, Stage::Scoring);
        let scored = score_projects(&projects, now, &self.rules)?;

        enter(stage, Stage::Ranking);
        let ranking = Ranking::new(scored)?;
        let top = ranking.top_candidate();
        tracing::info!(
            project = %top.name(),
            score = top.score,
            "🏆 Top candidate selected"
        );

        let grounded = if self.mode.dry_run {
            enter(stage, Stage::DryRunSynthesis);
            GroundedResponse {
                recommendation: synthesize_dry_run(top),
                completion_mismatch: None,
                project_mismatch: None,
            }
        } else {
            enter(stage, Stage::BuildingPrompt);
            let view = self.mode.verbose.then(|| ranking.full_view());
            let prompt = self.prompts.build(top, view);

            enter(stage, Stage::Calling);
            let response = self.model.complete(&prompt.persona, &prompt.payload).await?;
            tracing::debug!("Model response: {} bytes", response.len());

            enter(stage, Stage::Parsing);
            parse_response(&response)?.into_recommendation(top)
        };

        Ok(RunOutcome {
            recommendation: grounded.recommendation,
            ranking: self.mode.verbose.then(|| ranking.into_full_view()),
            completion_mismatch: grounded.completion_mismatch,
            project_mismatch: grounded.project_mismatch,
        })
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "stage transition");
    *stage = next;
}

/// Fixed template used instead of the model; same input always gives the same text.
pub fn synthesize_dry_run(top: &ScoredProject) -> Recommendation {
    let project = &top.project;
    let rules = if top.matched_rules.is_empty() {
        "no rule matched".to_string()
    } else {
        top.matched_rules
            .iter()
            .map(|tag| tag.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let first_action = project
        .next_action
        .as_deref()
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .unwrap_or("Define the next concrete action for this project.")
        .to_string();

    Recommendation {
        project: project.name.clone(),
        completion: project.completion.clamp(0, 100) as u8,
        why_this_week: format!(
            "This is your top priority by the rules: score {} ({}) at {}% complete.",
            top.score, rules, project.completion
        ),
        first_action,
        what_shipping_enables: "Moving forward on your highest-impact work.".to_string(),
    }
}
