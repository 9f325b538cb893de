//! Compatibility scoring — pluggable, trait-based candidate/vacancy scorer.
//!
//! Default backend: `HeuristicCompatScorer` (pure-Rust, deterministic).
//! With an API key configured: `LlmCompatScorer`, which degrades to the
//! heuristic on any LLM failure. `AppState` holds an `Arc<dyn CompatScorer>`.

pub mod cache;
pub mod handlers;
pub mod heuristic;
pub mod llm;
pub mod profile;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::entity::EntityRow;
use crate::models::vacancy::VacancyRow;

pub const MAX_STRENGTHS: usize = 5;
pub const MAX_WEAKNESSES: usize = 4;
pub const MAX_KEY_FACTORS: usize = 3;

/// Hiring recommendation derived from the overall score. The 70/40
/// thresholds are relied on by `min_score` filters downstream — do not
/// change them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Hire,
    Maybe,
    Reject,
}

impl Recommendation {
    pub fn from_score(overall: u8) -> Self {
        if overall >= 70 {
            Recommendation::Hire
        } else if overall >= 40 {
            Recommendation::Maybe
        } else {
            Recommendation::Reject
        }
    }
}

/// Multi-factor candidate/vacancy fit estimate. All sub-scores in [0,100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityScore {
    pub overall_score: u8,
    pub skills_score: u8,
    pub experience_score: u8,
    pub salary_score: u8,
    pub culture_fit_score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub key_factors: Vec<String>,
    pub summary: String,
    pub recommendation: Recommendation,
}

impl CompatibilityScore {
    /// Neutral score used when every scoring path has failed.
    pub fn unavailable(reason: &str) -> Self {
        CompatibilityScore {
            overall_score: 50,
            skills_score: 50,
            experience_score: 50,
            salary_score: 50,
            culture_fit_score: 50,
            strengths: vec![],
            weaknesses: vec![],
            key_factors: vec![],
            summary: format!("Compatibility analysis unavailable: {reason}"),
            recommendation: Recommendation::Maybe,
        }
    }
}

/// Tagged scoring result. A degraded outcome still carries a valid score —
/// callers cannot forget the fallback path because there is no error arm.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "quality", rename_all = "snake_case")]
pub enum ScoringOutcome {
    Full { score: CompatibilityScore },
    Degraded { score: CompatibilityScore, reason: String },
}

impl ScoringOutcome {
    pub fn score(&self) -> &CompatibilityScore {
        match self {
            ScoringOutcome::Full { score } => score,
            ScoringOutcome::Degraded { score, .. } => score,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ScoringOutcome::Degraded { .. })
    }
}

/// The compatibility scorer seam. Infallible by contract: user-facing flows
/// must never hard-fail because the LLM is unreachable.
#[async_trait]
pub trait CompatScorer: Send + Sync {
    async fn score(&self, entity: &EntityRow, vacancy: &VacancyRow) -> ScoringOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_score(100), Recommendation::Hire);
        assert_eq!(Recommendation::from_score(70), Recommendation::Hire);
        assert_eq!(Recommendation::from_score(69), Recommendation::Maybe);
        assert_eq!(Recommendation::from_score(40), Recommendation::Maybe);
        assert_eq!(Recommendation::from_score(39), Recommendation::Reject);
        assert_eq!(Recommendation::from_score(0), Recommendation::Reject);
    }

    #[test]
    fn test_unavailable_is_neutral_maybe() {
        let score = CompatibilityScore::unavailable("LLM timeout");
        assert_eq!(score.overall_score, 50);
        assert_eq!(score.recommendation, Recommendation::Maybe);
        assert!(score.summary.contains("LLM timeout"));
    }

    #[test]
    fn test_outcome_accessors() {
        let full = ScoringOutcome::Full {
            score: CompatibilityScore::unavailable("x"),
        };
        let degraded = ScoringOutcome::Degraded {
            score: CompatibilityScore::unavailable("y"),
            reason: "LLM unreachable".to_string(),
        };
        assert!(!full.is_degraded());
        assert!(degraded.is_degraded());
        assert_eq!(degraded.score().overall_score, 50);
    }
}
