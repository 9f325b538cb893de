use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entity::{EntityRow, EntityType};
use crate::state::AppState;

use super::duplicates::{
    find_all_duplicates, find_duplicates, DuplicateCandidate, DuplicateGroup, DEFAULT_THRESHOLD,
};
use super::merge::{merge_entities, MergeOutcome};
use super::similarity::{find_similar, SimilarCandidate};

async fn load_entity(state: &AppState, id: Uuid, org_id: Uuid) -> Result<EntityRow, AppError> {
    sqlx::query_as("SELECT * FROM entities WHERE id = $1 AND org_id = $2")
        .bind(id)
        .bind(org_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Entity {id} not found")))
}

#[derive(Deserialize)]
pub struct DuplicatesQuery {
    pub org_id: Uuid,
    pub threshold: Option<f64>,
}

/// GET /api/v1/entities/:id/duplicates
pub async fn handle_find_duplicates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DuplicatesQuery>,
) -> Result<Json<Vec<DuplicateCandidate>>, AppError> {
    let threshold = params.threshold.unwrap_or(DEFAULT_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AppError::Validation(
            "threshold must be between 0.0 and 1.0".into(),
        ));
    }
    let entity = load_entity(&state, id, params.org_id).await?;
    let duplicates = find_duplicates(&state.db, &entity, threshold).await?;
    Ok(Json(duplicates))
}

#[derive(Deserialize)]
pub struct SimilarQuery {
    pub org_id: Uuid,
    pub min_score: Option<u8>,
    pub limit: Option<usize>,
}

/// GET /api/v1/entities/:id/similar
pub async fn handle_find_similar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SimilarQuery>,
) -> Result<Json<Vec<SimilarCandidate>>, AppError> {
    let entity = load_entity(&state, id, params.org_id).await?;
    let similar = find_similar(
        &state.db,
        &entity,
        params.min_score.unwrap_or(30),
        params.limit.unwrap_or(20),
    )
    .await?;
    Ok(Json(similar))
}

#[derive(Deserialize)]
pub struct DuplicateScanQuery {
    pub org_id: Uuid,
    pub entity_type: String,
    pub limit: Option<i64>,
}

/// GET /api/v1/duplicates — organization-wide duplicate group scan.
pub async fn handle_scan_duplicates(
    State(state): State<AppState>,
    Query(params): Query<DuplicateScanQuery>,
) -> Result<Json<Vec<DuplicateGroup>>, AppError> {
    let entity_type = EntityType::parse(&params.entity_type).ok_or_else(|| {
        AppError::Validation(format!("Unknown entity type '{}'", params.entity_type))
    })?;
    let groups = find_all_duplicates(
        &state.db,
        params.org_id,
        entity_type.as_str(),
        params.limit.unwrap_or(200),
    )
    .await?;
    Ok(Json(groups))
}

#[derive(Deserialize)]
pub struct MergeRequest {
    pub org_id: Uuid,
    pub primary_id: Uuid,
    pub duplicate_ids: Vec<Uuid>,
    pub user_id: Option<Uuid>,
}

/// POST /api/v1/entities/merge
pub async fn handle_merge(
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeOutcome>, AppError> {
    let outcome = merge_entities(
        &state.db,
        req.org_id,
        req.primary_id,
        &req.duplicate_ids,
        req.user_id,
    )
    .await?;
    // Merged records can no longer hold cached scores.
    if outcome.success {
        for merged_id in &outcome.merged {
            state.score_cache.invalidate_entity(*merged_id).await;
        }
        state.score_cache.invalidate_entity(outcome.primary_id).await;
    }
    Ok(Json(outcome))
}
