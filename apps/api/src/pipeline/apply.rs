//! Application creation and removal.
//!
//! The one-active-application invariant (a candidate holds at most one
//! application whose vacancy is still open) is enforced under a row lock on
//! the entity, so two concurrent applies cannot both pass the check.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationStage, VacancyApplicationRow};
use crate::models::entity::{EntityRow, EntityStatus};
use crate::models::vacancy::{VacancyRow, VacancyStatus};

use super::sync::SyncMap;

/// Adds a candidate to a vacancy pipeline.
///
/// The initial stage comes from the entity's current status when the sync
/// map covers it (a candidate already in "interview" enters at the
/// interview column), otherwise `applied`.
pub async fn create_application(
    pool: &PgPool,
    sync: &SyncMap,
    org_id: Uuid,
    vacancy_id: Uuid,
    entity_id: Uuid,
    notes: Option<String>,
) -> Result<VacancyApplicationRow, AppError> {
    let mut tx = pool.begin().await?;

    let vacancy: VacancyRow =
        sqlx::query_as("SELECT * FROM vacancies WHERE id = $1 AND org_id = $2 FOR UPDATE")
            .bind(vacancy_id)
            .bind(org_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vacancy {vacancy_id} not found")))?;

    if vacancy.status() == Some(VacancyStatus::Closed) {
        return Err(AppError::Validation(format!(
            "Vacancy {vacancy_id} is closed"
        )));
    }

    // Entity row lock serializes concurrent applies for the same candidate.
    let entity: EntityRow =
        sqlx::query_as("SELECT * FROM entities WHERE id = $1 AND org_id = $2 FOR UPDATE")
            .bind(entity_id)
            .bind(org_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entity {entity_id} not found")))?;

    let active: Option<(Uuid, Uuid)> = sqlx::query_as(
        r#"
        SELECT a.id, a.vacancy_id
        FROM vacancy_applications a
        JOIN vacancies v ON v.id = a.vacancy_id
        WHERE a.entity_id = $1
          AND v.status != 'closed'
          AND a.stage NOT IN ('hired', 'rejected', 'withdrawn')
        LIMIT 1
        "#,
    )
    .bind(entity_id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some((existing_id, existing_vacancy)) = active {
        return Err(AppError::Conflict(format!(
            "Entity {entity_id} already has active application {existing_id} for vacancy {existing_vacancy}"
        )));
    }

    let stage = entity
        .status()
        .and_then(|status| sync.stage_for_status(status))
        .unwrap_or(ApplicationStage::Applied);

    let (max,): (Option<i64>,) = sqlx::query_as(
        "SELECT MAX(stage_order) FROM vacancy_applications WHERE vacancy_id = $1 AND stage = $2",
    )
    .bind(vacancy_id)
    .bind(stage.as_str())
    .fetch_one(&mut *tx)
    .await?;
    let stage_order = max.unwrap_or(0) + 1;

    let app: VacancyApplicationRow = sqlx::query_as(
        r#"
        INSERT INTO vacancy_applications
            (id, org_id, vacancy_id, entity_id, stage, stage_order, notes,
             last_stage_change_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(org_id)
    .bind(vacancy_id)
    .bind(entity_id)
    .bind(stage.as_str())
    .bind(stage_order)
    .bind(&notes)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(status) = sync.status_for_stage(stage) {
        if entity.status() != Some(status) {
            sqlx::query("UPDATE entities SET status = $1, updated_at = now() WHERE id = $2")
                .bind(status.as_str())
                .bind(entity_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    info!(
        "Entity {entity_id} entered vacancy {vacancy_id} pipeline at stage {}",
        stage.as_str()
    );
    Ok(app)
}

/// Pulls a candidate from a pipeline: deletes the application and resets
/// the entity status to `new`.
pub async fn delete_application(pool: &PgPool, app_id: Uuid) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let app: VacancyApplicationRow =
        sqlx::query_as("DELETE FROM vacancy_applications WHERE id = $1 RETURNING *")
            .bind(app_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {app_id} not found")))?;

    sqlx::query("UPDATE entities SET status = $1, updated_at = now() WHERE id = $2")
        .bind(EntityStatus::New.as_str())
        .bind(app.entity_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Removed application {app_id}, entity {} reset to new", app.entity_id);
    Ok(())
}
