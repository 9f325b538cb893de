use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationStage, VacancyApplicationRow};
use crate::state::AppState;

use super::apply::{create_application, delete_application};
use super::ordering::{bulk_move, move_stage};

fn parse_stage(raw: &str) -> Result<ApplicationStage, AppError> {
    ApplicationStage::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("Unknown stage '{raw}'")))
}

#[derive(Deserialize)]
pub struct CreateApplicationRequest {
    pub org_id: Uuid,
    pub entity_id: Uuid,
    pub notes: Option<String>,
}

/// POST /api/v1/vacancies/:id/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Path(vacancy_id): Path<Uuid>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<VacancyApplicationRow>), AppError> {
    let app = create_application(
        &state.db,
        &state.sync_map,
        req.org_id,
        vacancy_id,
        req.entity_id,
        req.notes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(app)))
}

#[derive(Deserialize)]
pub struct StageChangeRequest {
    pub stage: String,
}

/// PUT /api/v1/applications/:id/stage
pub async fn handle_move_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StageChangeRequest>,
) -> Result<Json<VacancyApplicationRow>, AppError> {
    let stage = parse_stage(&req.stage)?;
    let updated = move_stage(&state.db, &state.sync_map, id, stage).await?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct BulkMoveRequest {
    pub vacancy_id: Uuid,
    pub stage: String,
    pub application_ids: Vec<Uuid>,
}

/// POST /api/v1/applications/bulk-move
pub async fn handle_bulk_move(
    State(state): State<AppState>,
    Json(req): Json<BulkMoveRequest>,
) -> Result<Json<Vec<VacancyApplicationRow>>, AppError> {
    let stage = parse_stage(&req.stage)?;
    let moved = bulk_move(
        &state.db,
        &state.sync_map,
        req.vacancy_id,
        stage,
        &req.application_ids,
    )
    .await?;
    Ok(Json(moved))
}

/// DELETE /api/v1/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_application(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
