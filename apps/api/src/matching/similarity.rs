//! Similarity Engine — weighted multi-factor comparison of two entities.
//!
//! Fixed 50/20/15/15 split: skills Jaccard, experience proximity, salary
//! expectation overlap, location match. Match reasons are generated in that
//! order because callers display them positionally.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entity::EntityRow;

const SKILLS_WEIGHT: f64 = 50.0;
const EXPERIENCE_WEIGHT: u32 = 20;
const SALARY_WEIGHT: u32 = 15;
const LOCATION_WEIGHT: u32 = 15;

/// Years of experience two candidates may differ by and still count similar.
const EXPERIENCE_TOLERANCE_YEARS: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// Composite 0–100 similarity.
    pub score: u8,
    /// Human-readable reasons, ordered skills → experience → salary → location.
    pub match_reasons: Vec<String>,
    pub common_skills: Vec<String>,
}

/// One entry of a similar-candidates listing.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarCandidate {
    pub entity_id: Uuid,
    pub name: String,
    pub score: u8,
    pub match_reasons: Vec<String>,
    pub common_skills: Vec<String>,
}

/// Jaccard index over two skill sets plus the sorted common skills.
/// Either side empty → `(0.0, [])`.
pub fn skills_similarity(a: &HashSet<String>, b: &HashSet<String>) -> (f64, Vec<String>) {
    if a.is_empty() || b.is_empty() {
        return (0.0, Vec::new());
    }
    let intersection: Vec<String> = a.intersection(b).cloned().collect();
    let union = a.union(b).count();
    let ratio = intersection.len() as f64 / union as f64;
    let mut common = intersection;
    common.sort();
    (ratio, common)
}

/// True iff both values are present and within the tolerance window.
pub fn experience_similar(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() <= EXPERIENCE_TOLERANCE_YEARS,
        _ => false,
    }
}

/// Interval overlap test with an optimistic default: a missing bound on
/// either side counts as compatible.
pub fn salary_ranges_overlap(
    min1: Option<i64>,
    max1: Option<i64>,
    min2: Option<i64>,
    max2: Option<i64>,
) -> bool {
    match (min1, max1, min2, max2) {
        (Some(min1), Some(max1), Some(min2), Some(max2)) => max1 >= min2 && max2 >= min1,
        _ => true,
    }
}

/// Case-insensitive equality or substring containment either direction.
pub fn location_similar(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let a = a.trim().to_lowercase();
            let b = b.trim().to_lowercase();
            !a.is_empty() && !b.is_empty() && (a == b || a.contains(&b) || b.contains(&a))
        }
        _ => false,
    }
}

/// Scores two entities against each other. Weights and reason order are
/// fixed; the composite is capped at 100.
pub fn similarity_report(a: &EntityRow, b: &EntityRow) -> SimilarityReport {
    let pa = a.profile();
    let pb = b.profile();

    let mut score = 0u32;
    let mut match_reasons = Vec::new();

    let (jaccard, common_skills) = skills_similarity(&pa.skills(), &pb.skills());
    score += (jaccard * SKILLS_WEIGHT).round() as u32;
    if !common_skills.is_empty() {
        match_reasons.push(format!(
            "{} shared skills: {}",
            common_skills.len(),
            common_skills.join(", ")
        ));
    }

    if experience_similar(pa.experience_years(), pb.experience_years()) {
        score += EXPERIENCE_WEIGHT;
        match_reasons.push("Similar experience level".to_string());
    }

    let both_expect_salary = (pa.expected_salary_min().is_some()
        || pa.expected_salary_max().is_some())
        && (pb.expected_salary_min().is_some() || pb.expected_salary_max().is_some());
    if both_expect_salary
        && salary_ranges_overlap(
            pa.expected_salary_min(),
            pa.expected_salary_max(),
            pb.expected_salary_min(),
            pb.expected_salary_max(),
        )
    {
        score += SALARY_WEIGHT;
        match_reasons.push("Overlapping salary expectations".to_string());
    }

    if location_similar(pa.location(), pb.location()) {
        score += LOCATION_WEIGHT;
        match_reasons.push("Same location".to_string());
    }

    SimilarityReport {
        score: score.min(100) as u8,
        match_reasons,
        common_skills,
    }
}

/// Scans same-org, same-type entities and returns those scoring at least
/// `min_score`, best first.
pub async fn find_similar(
    pool: &PgPool,
    entity: &EntityRow,
    min_score: u8,
    limit: usize,
) -> Result<Vec<SimilarCandidate>, AppError> {
    let pool_rows: Vec<EntityRow> = sqlx::query_as(
        r#"
        SELECT * FROM entities
        WHERE org_id = $1
          AND entity_type = $2
          AND id != $3
          AND status != 'merged'
        ORDER BY created_at DESC
        "#,
    )
    .bind(entity.org_id)
    .bind(&entity.entity_type)
    .bind(entity.id)
    .fetch_all(pool)
    .await?;

    let mut results: Vec<SimilarCandidate> = pool_rows
        .iter()
        .map(|other| {
            let report = similarity_report(entity, other);
            SimilarCandidate {
                entity_id: other.id,
                name: other.name.clone(),
                score: report.score,
                match_reasons: report.match_reasons,
                common_skills: report.common_skills,
            }
        })
        .filter(|c| c.score >= min_score)
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(limit);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};

    fn make_entity(extra_data: Value) -> EntityRow {
        EntityRow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Test Person".to_string(),
            entity_type: "candidate".to_string(),
            status: "new".to_string(),
            email: None,
            phone: None,
            phones: vec![],
            emails: vec![],
            telegram_usernames: vec![],
            tags: vec![],
            extra_data,
            ai_summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn skill_set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaccard_identical_sets() {
        let a = skill_set(&["python", "django"]);
        let (ratio, common) = skills_similarity(&a, &a.clone());
        assert_eq!(ratio, 1.0);
        assert_eq!(common, vec!["django", "python"]);
    }

    #[test]
    fn test_jaccard_empty_side_is_zero() {
        let a = skill_set(&["python"]);
        let empty = HashSet::new();
        assert_eq!(skills_similarity(&a, &empty), (0.0, vec![]));
        assert_eq!(skills_similarity(&empty, &a), (0.0, vec![]));
    }

    #[test]
    fn test_jaccard_symmetric() {
        let a = skill_set(&["python", "django", "redis"]);
        let b = skill_set(&["python", "go"]);
        assert_eq!(skills_similarity(&a, &b).0, skills_similarity(&b, &a).0);
    }

    #[test]
    fn test_experience_within_tolerance() {
        assert!(experience_similar(Some(5.0), Some(7.0)));
        assert!(!experience_similar(Some(5.0), Some(8.0)));
        assert!(!experience_similar(Some(5.0), None));
        assert!(!experience_similar(None, None));
    }

    #[test]
    fn test_salary_overlap_optimistic_on_missing() {
        assert!(salary_ranges_overlap(None, None, Some(100), Some(200)));
        assert!(salary_ranges_overlap(Some(100), None, Some(300), Some(400)));
    }

    #[test]
    fn test_salary_overlap_intervals() {
        assert!(salary_ranges_overlap(Some(100), Some(200), Some(150), Some(250)));
        assert!(!salary_ranges_overlap(Some(100), Some(200), Some(201), Some(300)));
    }

    #[test]
    fn test_location_substring_match() {
        assert!(location_similar(Some("Moscow"), Some("moscow")));
        assert!(location_similar(Some("Moscow, Russia"), Some("Moscow")));
        assert!(!location_similar(Some("Moscow"), Some("Kazan")));
        assert!(!location_similar(Some("Moscow"), None));
    }

    #[test]
    fn test_composite_score_full_match() {
        let data = json!({
            "skills": ["python", "django"],
            "experience_years": 5,
            "expected_salary_min": 100, "expected_salary_max": 200,
            "location": "Moscow"
        });
        let a = make_entity(data.clone());
        let b = make_entity(data);
        let report = similarity_report(&a, &b);
        // 50 + 20 + 15 + 15
        assert_eq!(report.score, 100);
        assert_eq!(report.match_reasons.len(), 4);
    }

    #[test]
    fn test_composite_score_bounds() {
        let a = make_entity(json!({}));
        let b = make_entity(json!({}));
        assert_eq!(similarity_report(&a, &b).score, 0);
    }

    #[test]
    fn test_no_salary_points_without_expectations() {
        // Both sides missing salary: overlap is "optimistic" but no points
        // are awarded because neither expressed an expectation.
        let data = json!({"skills": ["python"], "location": "Moscow"});
        let a = make_entity(data.clone());
        let b = make_entity(data);
        let report = similarity_report(&a, &b);
        assert_eq!(report.score, 50 + 15);
    }

    #[test]
    fn test_reason_order_skills_first_location_last() {
        let data = json!({
            "skills": ["python"],
            "experience_years": 3,
            "expected_salary_min": 100, "expected_salary_max": 200,
            "location": "Kazan"
        });
        let a = make_entity(data.clone());
        let b = make_entity(data);
        let report = similarity_report(&a, &b);
        assert!(report.match_reasons[0].contains("shared skills"));
        assert_eq!(report.match_reasons[1], "Similar experience level");
        assert_eq!(report.match_reasons[2], "Overlapping salary expectations");
        assert_eq!(report.match_reasons[3], "Same location");
    }

    #[test]
    fn test_partial_jaccard_rounding() {
        let a = make_entity(json!({"skills": ["python", "django"]}));
        let b = make_entity(json!({"skills": ["python", "django", "postgres"]}));
        // jaccard 2/3 → round(33.33) = 33
        assert_eq!(similarity_report(&a, &b).score, 33);
    }
}
