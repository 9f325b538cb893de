//! Heuristic compatibility scorer — keyword overlap against a fixed
//! vocabulary. Deterministic and LLM-free; serves as the primary backend
//! when LLM scoring is disabled and as the degraded path when it fails.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::matching::similarity::salary_ranges_overlap;
use crate::models::entity::EntityRow;
use crate::models::vacancy::VacancyRow;

use super::{
    CompatScorer, CompatibilityScore, Recommendation, ScoringOutcome, MAX_STRENGTHS,
    MAX_WEAKNESSES,
};

/// Fixed technology/role vocabulary the keyword extractor recognizes.
const SKILL_VOCABULARY: &[&str] = &[
    "python", "django", "flask", "fastapi", "java", "spring", "kotlin", "rust", "go", "c++",
    "c#", ".net", "javascript", "typescript", "react", "vue", "angular", "node", "php",
    "laravel", "ruby", "rails", "swift", "scala", "sql", "postgres", "postgresql", "mysql",
    "mongodb", "redis", "kafka", "rabbitmq", "elasticsearch", "clickhouse", "docker",
    "kubernetes", "terraform", "ansible", "aws", "gcp", "azure", "linux", "git", "ci/cd",
    "grpc", "graphql", "rest", "microservices", "ml", "pytorch", "tensorflow", "pandas",
    "airflow", "spark", "hadoop", "devops", "qa", "selenium", "android", "ios", "flutter",
    "frontend", "backend", "fullstack", "data engineer", "data scientist", "analyst",
    "product manager", "project manager", "designer", "recruiter",
];

/// Weights of the composite: skills dominate, salary compatibility and
/// location agreement fill the rest.
const SKILLS_SHARE: f64 = 0.60;
const SALARY_SHARE: f64 = 0.25;
const LOCATION_SHARE: f64 = 0.15;

const NEUTRAL_SCORE: u8 = 50;

/// Vocabulary terms present in a free-text blob. Single-word terms match on
/// token boundaries (so "go" never fires inside "django"); multi-word terms
/// match as substrings.
fn vocabulary_hits(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    let mut tokens: HashSet<&str> = HashSet::new();
    for token in lower
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '/')))
        .filter(|t| !t.is_empty())
    {
        tokens.insert(token);
        // sentence-final "python." should still match "python"
        tokens.insert(token.trim_matches('.'));
    }
    SKILL_VOCABULARY
        .iter()
        .filter(|term| {
            if term.contains(' ') {
                lower.contains(*term)
            } else {
                tokens.contains(*term)
            }
        })
        .map(|term| term.to_string())
        .collect()
}

fn candidate_keywords(entity: &EntityRow) -> HashSet<String> {
    let mut keywords: HashSet<String> = entity
        .profile()
        .skills()
        .into_iter()
        .filter(|s| SKILL_VOCABULARY.contains(&s.as_str()))
        .collect();
    if let Some(summary) = entity.ai_summary.as_deref() {
        keywords.extend(vocabulary_hits(summary));
    }
    if let Some(position) = entity.profile().position() {
        keywords.extend(vocabulary_hits(position));
    }
    keywords
}

fn vacancy_keywords(vacancy: &VacancyRow) -> HashSet<String> {
    let mut text = vacancy.title.clone();
    for part in [
        vacancy.requirements.as_deref(),
        vacancy.responsibilities.as_deref(),
        vacancy.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        text.push('\n');
        text.push_str(part);
    }
    text.push('\n');
    text.push_str(&vacancy.tags.join("\n"));
    vocabulary_hits(&text)
}

/// Pure scoring function, exposed for tests. `overall` is the fixed
/// 60/25/15 weighting over skills, salary compatibility, and location.
pub fn heuristic_score(entity: &EntityRow, vacancy: &VacancyRow) -> CompatibilityScore {
    let candidate = candidate_keywords(entity);
    let required = vacancy_keywords(vacancy);

    let matched: Vec<String> = {
        let mut m: Vec<String> = candidate.intersection(&required).cloned().collect();
        m.sort();
        m
    };
    let missing: Vec<String> = {
        let mut m: Vec<String> = required.difference(&candidate).cloned().collect();
        m.sort();
        m
    };

    let skills_score: u8 = if required.is_empty() {
        NEUTRAL_SCORE
    } else {
        ((matched.len() as f64 / required.len() as f64) * 100.0).round() as u8
    };

    let profile = entity.profile();
    let salary_compatible = salary_ranges_overlap(
        profile.expected_salary_min(),
        profile.expected_salary_max(),
        vacancy.salary_min,
        vacancy.salary_max,
    );
    let salary_score: u8 = if salary_compatible { 100 } else { 0 };

    // Missing location on either side defaults to compatible.
    let location_score: u8 = match (profile.location(), vacancy.location.as_deref()) {
        (Some(a), Some(b)) => {
            let a = a.to_lowercase();
            let b = b.to_lowercase();
            if a == b || a.contains(&b) || b.contains(&a) {
                100
            } else {
                0
            }
        }
        _ => 100,
    };

    let overall = (SKILLS_SHARE * skills_score as f64
        + SALARY_SHARE * salary_score as f64
        + LOCATION_SHARE * location_score as f64)
        .round() as u8;

    let mut strengths: Vec<String> = matched
        .iter()
        .map(|skill| format!("Covers required skill: {skill}"))
        .collect();
    strengths.truncate(MAX_STRENGTHS);

    let mut weaknesses: Vec<String> = missing
        .iter()
        .map(|skill| format!("Missing required skill: {skill}"))
        .collect();
    if !salary_compatible {
        weaknesses.push("Salary expectations outside the vacancy range".to_string());
    }
    weaknesses.truncate(MAX_WEAKNESSES);

    let summary = if required.is_empty() {
        "Vacancy lists no recognizable skills; scored on salary and location only.".to_string()
    } else {
        format!(
            "Keyword match: {} of {} required skills covered.",
            matched.len(),
            required.len()
        )
    };

    CompatibilityScore {
        overall_score: overall,
        skills_score,
        experience_score: NEUTRAL_SCORE,
        salary_score,
        culture_fit_score: NEUTRAL_SCORE,
        strengths,
        weaknesses,
        key_factors: vec![],
        summary,
        recommendation: Recommendation::from_score(overall),
    }
}

pub struct HeuristicCompatScorer;

#[async_trait]
impl CompatScorer for HeuristicCompatScorer {
    async fn score(&self, entity: &EntityRow, vacancy: &VacancyRow) -> ScoringOutcome {
        ScoringOutcome::Full {
            score: heuristic_score(entity, vacancy),
        }
    }
}
