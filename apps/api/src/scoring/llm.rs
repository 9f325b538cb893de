//! LLM-backed compatibility scorer. Sends both rendered profiles to the
//! model, extracts the first JSON object from the response, and clamps
//! every field defensively. Any failure degrades to the heuristic scorer —
//! an unreachable LLM must never fail the caller.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::llm_client::LlmClient;
use crate::models::entity::EntityRow;
use crate::models::vacancy::VacancyRow;

use super::heuristic::heuristic_score;
use super::profile::{render_candidate_profile, render_vacancy_profile};
use super::prompts::{COMPAT_SCORE_PROMPT_TEMPLATE, COMPAT_SCORE_SYSTEM};
use super::{
    CompatScorer, CompatibilityScore, Recommendation, ScoringOutcome, MAX_KEY_FACTORS,
    MAX_STRENGTHS, MAX_WEAKNESSES,
};

/// Raw model payload. Every field is defensive: missing lists default to
/// empty, scores arrive as floats and get clamped.
#[derive(Debug, Deserialize)]
struct LlmScorePayload {
    overall_score: f64,
    skills_score: f64,
    experience_score: f64,
    culture_fit_score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    key_factors: Vec<String>,
    #[serde(default)]
    summary: String,
}

pub struct LlmCompatScorer {
    llm: LlmClient,
}

impl LlmCompatScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn try_llm_score(
        &self,
        entity: &EntityRow,
        vacancy: &VacancyRow,
    ) -> Result<CompatibilityScore, String> {
        let prompt = COMPAT_SCORE_PROMPT_TEMPLATE
            .replace("{candidate_profile}", &render_candidate_profile(entity))
            .replace("{vacancy_profile}", &render_vacancy_profile(vacancy));

        let text = self
            .llm
            .call_text(&prompt, COMPAT_SCORE_SYSTEM)
            .await
            .map_err(|e| format!("LLM call failed: {e}"))?;

        let json = extract_first_json(&text).ok_or("no JSON object in LLM response")?;
        let payload: LlmScorePayload =
            serde_json::from_str(json).map_err(|e| format!("unparseable LLM JSON: {e}"))?;

        Ok(payload_to_score(payload, entity, vacancy))
    }
}

#[async_trait]
impl CompatScorer for LlmCompatScorer {
    async fn score(&self, entity: &EntityRow, vacancy: &VacancyRow) -> ScoringOutcome {
        match self.try_llm_score(entity, vacancy).await {
            Ok(score) => ScoringOutcome::Full { score },
            Err(reason) => {
                warn!(
                    "Compatibility scoring degraded for entity {} / vacancy {}: {reason}",
                    entity.id, vacancy.id
                );
                ScoringOutcome::Degraded {
                    score: heuristic_score(entity, vacancy),
                    reason,
                }
            }
        }
    }
}

/// First `{...}` block in the text, tolerant of leading/trailing prose and
/// code fences.
fn extract_first_json(text: &str) -> Option<&str> {
    // Greedy across lines: first `{` through the last `}`. Compiled once.
    static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();
    let re = JSON_BLOCK.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));
    re.find(text).map(|m| m.as_str())
}

fn clamp_score(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}

fn payload_to_score(
    payload: LlmScorePayload,
    entity: &EntityRow,
    vacancy: &VacancyRow,
) -> CompatibilityScore {
    let overall = clamp_score(payload.overall_score);

    let mut strengths = payload.strengths;
    strengths.truncate(MAX_STRENGTHS);
    let mut weaknesses = payload.weaknesses;
    weaknesses.truncate(MAX_WEAKNESSES);
    let mut key_factors = payload.key_factors;
    key_factors.truncate(MAX_KEY_FACTORS);

    // The salary sub-score is computed locally: the model never sees a more
    // reliable signal than the two ranges themselves.
    let profile = entity.profile();
    let salary_score = if crate::matching::similarity::salary_ranges_overlap(
        profile.expected_salary_min(),
        profile.expected_salary_max(),
        vacancy.salary_min,
        vacancy.salary_max,
    ) {
        100
    } else {
        0
    };

    CompatibilityScore {
        overall_score: overall,
        skills_score: clamp_score(payload.skills_score),
        experience_score: clamp_score(payload.experience_score),
        salary_score,
        culture_fit_score: clamp_score(payload.culture_fit_score),
        strengths,
        weaknesses,
        key_factors,
        summary: payload.summary,
        // Always derived from the clamped overall so downstream min_score
        // filters and the recommendation can never disagree.
        recommendation: Recommendation::from_score(overall),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn make_entity() -> EntityRow {
        EntityRow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Candidate".to_string(),
            entity_type: "candidate".to_string(),
            status: "new".to_string(),
            email: None,
            phone: None,
            phones: vec![],
            emails: vec![],
            telegram_usernames: vec![],
            tags: vec![],
            extra_data: json!({}),
            ai_summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_vacancy() -> VacancyRow {
        VacancyRow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            title: "Engineer".to_string(),
            description: None,
            requirements: None,
            responsibilities: None,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            location: None,
            employment_type: None,
            experience_level: None,
            status: "open".to_string(),
            tags: vec![],
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_json_from_prose() {
        let text = "Sure! Here is the assessment:\n{\"overall_score\": 80}\nHope that helps.";
        assert_eq!(extract_first_json(text), Some("{\"overall_score\": 80}"));
    }

    #[test]
    fn test_extract_json_from_code_fence() {
        let text = "```json\n{\"overall_score\": 80}\n```";
        assert_eq!(extract_first_json(text), Some("{\"overall_score\": 80}"));
    }

    #[test]
    fn test_extract_json_none_when_absent() {
        assert_eq!(extract_first_json("no json here"), None);
    }

    #[test]
    fn test_clamp_out_of_range_scores() {
        let payload: LlmScorePayload = serde_json::from_str(
            r#"{"overall_score": 150, "skills_score": -20,
                "experience_score": 70.6, "culture_fit_score": 65}"#,
        )
        .unwrap();
        let score = payload_to_score(payload, &make_entity(), &make_vacancy());
        assert_eq!(score.overall_score, 100);
        assert_eq!(score.skills_score, 0);
        assert_eq!(score.experience_score, 71);
        assert_eq!(score.recommendation, Recommendation::Hire);
    }

    #[test]
    fn test_lists_truncated() {
        let strengths: Vec<String> = (0..10).map(|i| format!("s{i}")).collect();
        let payload = LlmScorePayload {
            overall_score: 50.0,
            skills_score: 50.0,
            experience_score: 50.0,
            culture_fit_score: 50.0,
            strengths,
            weaknesses: (0..10).map(|i| format!("w{i}")).collect(),
            key_factors: (0..10).map(|i| format!("k{i}")).collect(),
            summary: String::new(),
        };
        let score = payload_to_score(payload, &make_entity(), &make_vacancy());
        assert_eq!(score.strengths.len(), MAX_STRENGTHS);
        assert_eq!(score.weaknesses.len(), MAX_WEAKNESSES);
        assert_eq!(score.key_factors.len(), MAX_KEY_FACTORS);
    }

    #[test]
    fn test_recommendation_derived_from_overall() {
        let payload: LlmScorePayload = serde_json::from_str(
            r#"{"overall_score": 35, "skills_score": 90,
                "experience_score": 90, "culture_fit_score": 90}"#,
        )
        .unwrap();
        let score = payload_to_score(payload, &make_entity(), &make_vacancy());
        assert_eq!(score.recommendation, Recommendation::Reject);
    }
}
