use crate::domain::model::ScoredProject;
use crate::utils::error::{FocusError, Result};
use std::cmp::Ordering;

/// Scored projects in their final order: score desc, completion desc, name asc.
#[derive(Debug, Clone)]
pub struct Ranking {
    ranked: Vec<ScoredProject>,
}

impl Ranking {
    pub fn new(mut scored: Vec<ScoredProject>) -> Result<Self> {
        if scored.is_empty() {
            return Err(FocusError::NoProjectsError);
        }

        scored.sort_by(compare);
        Ok(Self { ranked: scored })
    }

    pub fn top_candidate(&self) -> &ScoredProject {
        // new() 保證至少有一筆
        &self.ranked[0]
    }

    pub fn full_view(&self) -> &[ScoredProject] {
        &self.ranked
    }

    pub fn into_full_view(self) -> Vec<ScoredProject> {
        self.ranked
    }
}

fn compare(a: &ScoredProject, b: &ScoredProject) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.completion().cmp(&a.completion()))
        .then_with(|| a.name().cmp(b.name()))
}
