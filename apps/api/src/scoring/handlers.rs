use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entity::EntityRow;
use crate::models::vacancy::{validate_vacancy_fields, VacancyRow};
use crate::state::AppState;

use super::CompatibilityScore;

#[derive(Deserialize)]
pub struct OrgQuery {
    pub org_id: Uuid,
}

#[derive(Serialize)]
pub struct CompatibilityResponse {
    pub entity_id: Uuid,
    pub vacancy_id: Uuid,
    pub score: CompatibilityScore,
    pub cached: bool,
    pub degraded: bool,
    pub degraded_reason: Option<String>,
}

/// GET /api/v1/entities/:id/compatibility/:vacancy_id
///
/// Cache-first: a fresh cached score short-circuits the scorer entirely.
/// Degraded results are returned but not cached, so a recovered LLM is
/// picked up on the next request instead of after the TTL.
pub async fn handle_compatibility(
    State(state): State<AppState>,
    Path((entity_id, vacancy_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<OrgQuery>,
) -> Result<Json<CompatibilityResponse>, AppError> {
    let entity: EntityRow = sqlx::query_as("SELECT * FROM entities WHERE id = $1 AND org_id = $2")
        .bind(entity_id)
        .bind(params.org_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entity {entity_id} not found")))?;

    let vacancy: VacancyRow = sqlx::query_as("SELECT * FROM vacancies WHERE id = $1 AND org_id = $2")
        .bind(vacancy_id)
        .bind(params.org_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vacancy {vacancy_id} not found")))?;

    if let Some(score) = state.score_cache.get(entity_id, vacancy_id).await {
        return Ok(Json(CompatibilityResponse {
            entity_id,
            vacancy_id,
            score,
            cached: true,
            degraded: false,
            degraded_reason: None,
        }));
    }

    let outcome = state.scorer.score(&entity, &vacancy).await;
    let degraded = outcome.is_degraded();
    let degraded_reason = match &outcome {
        super::ScoringOutcome::Degraded { reason, .. } => Some(reason.clone()),
        super::ScoringOutcome::Full { .. } => None,
    };
    let score = outcome.score().clone();

    if !degraded {
        state
            .score_cache
            .put(entity_id, vacancy_id, score.clone())
            .await;
    }

    Ok(Json(CompatibilityResponse {
        entity_id,
        vacancy_id,
        score,
        cached: false,
        degraded,
        degraded_reason,
    }))
}

/// Partial vacancy update. Every field except `title` is scoring-relevant;
/// changing one drops the vacancy's cached scores.
#[derive(Deserialize, Default)]
pub struct VacancyUpdate {
    pub org_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// PATCH /api/v1/vacancies/:id
///
/// Applies a partial update and drops every cached score for the vacancy
/// when any scoring-relevant field actually changed.
pub async fn handle_update_vacancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<VacancyUpdate>,
) -> Result<Json<VacancyRow>, AppError> {
    let existing: VacancyRow =
        sqlx::query_as("SELECT * FROM vacancies WHERE id = $1 AND org_id = $2")
            .bind(id)
            .bind(req.org_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vacancy {id} not found")))?;

    let title = req.title.clone().unwrap_or_else(|| existing.title.clone());
    let salary_min = req.salary_min.or(existing.salary_min);
    let salary_max = req.salary_max.or(existing.salary_max);
    validate_vacancy_fields(&title, salary_min, salary_max)?;

    let scoring_relevant_changed = req.description.is_some()
        || req.requirements.is_some()
        || req.responsibilities.is_some()
        || req.salary_min.is_some()
        || req.salary_max.is_some()
        || req.salary_currency.is_some()
        || req.location.is_some()
        || req.experience_level.is_some()
        || req.tags.is_some();

    let updated: VacancyRow = sqlx::query_as(
        r#"
        UPDATE vacancies
        SET title = $1, description = $2, requirements = $3, responsibilities = $4,
            salary_min = $5, salary_max = $6, salary_currency = $7, location = $8,
            experience_level = $9, tags = $10, updated_at = now()
        WHERE id = $11
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(req.description.as_deref().or(existing.description.as_deref()))
    .bind(req.requirements.as_deref().or(existing.requirements.as_deref()))
    .bind(
        req.responsibilities
            .as_deref()
            .or(existing.responsibilities.as_deref()),
    )
    .bind(salary_min)
    .bind(salary_max)
    .bind(
        req.salary_currency
            .as_deref()
            .or(existing.salary_currency.as_deref()),
    )
    .bind(req.location.as_deref().or(existing.location.as_deref()))
    .bind(
        req.experience_level
            .as_deref()
            .or(existing.experience_level.as_deref()),
    )
    .bind(req.tags.as_ref().unwrap_or(&existing.tags))
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    if scoring_relevant_changed {
        state.score_cache.invalidate_vacancy(id).await;
    }

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct EntityUpdate {
    pub org_id: Uuid,
    pub name: Option<String>,
    pub ai_summary: Option<String>,
    /// Replaces the profile map wholesale; partial profile edits are merged
    /// client-side.
    pub extra_data: Option<Value>,
    pub tags: Option<Vec<String>>,
}

/// PATCH /api/v1/entities/:id
pub async fn handle_update_entity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EntityUpdate>,
) -> Result<Json<EntityRow>, AppError> {
    let existing: EntityRow =
        sqlx::query_as("SELECT * FROM entities WHERE id = $1 AND org_id = $2")
            .bind(id)
            .bind(req.org_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entity {id} not found")))?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Entity name must not be empty".into()));
        }
    }

    // Profile and summary feed the scorer; their change stales every score.
    let scoring_relevant_changed = req.extra_data.is_some() || req.ai_summary.is_some();

    let updated: EntityRow = sqlx::query_as(
        r#"
        UPDATE entities
        SET name = $1, ai_summary = $2, extra_data = $3, tags = $4, updated_at = now()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(req.name.as_deref().unwrap_or(&existing.name))
    .bind(req.ai_summary.as_deref().or(existing.ai_summary.as_deref()))
    .bind(req.extra_data.as_ref().unwrap_or(&existing.extra_data))
    .bind(req.tags.as_ref().unwrap_or(&existing.tags))
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    if scoring_relevant_changed {
        state.score_cache.invalidate_entity(id).await;
    }

    Ok(Json(updated))
}
