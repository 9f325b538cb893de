//! Entity merge — irreversible absorption of duplicate records into a
//! primary. Re-parents dependent rows, unions contact identifiers, and marks
//! every duplicate `merged`. All-or-nothing: any failure rolls back.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entity::{stamp_merged, EntityRow, EntityStatus};
use crate::normalize::{normalize_email, normalize_phone};

#[derive(Debug, Serialize)]
pub struct MergeOutcome {
    pub success: bool,
    pub primary_id: Uuid,
    pub merged: Vec<Uuid>,
    pub error: Option<String>,
}

/// Merges `duplicate_ids` into `primary_id` within one transaction.
///
/// Validation failures (missing entity, already-merged primary, circular
/// merge) surface as typed errors before anything is written. Failures
/// during the mutation itself roll back and come back as a failed
/// `MergeOutcome` — never a partial merge.
pub async fn merge_entities(
    pool: &PgPool,
    org_id: Uuid,
    primary_id: Uuid,
    duplicate_ids: &[Uuid],
    merged_by: Option<Uuid>,
) -> Result<MergeOutcome, AppError> {
    if duplicate_ids.is_empty() {
        return Err(AppError::Validation("duplicate_ids must not be empty".into()));
    }
    if duplicate_ids.contains(&primary_id) {
        return Err(AppError::Validation(
            "An entity cannot be merged into itself".into(),
        ));
    }

    let mut tx = pool.begin().await?;

    let primary: EntityRow =
        sqlx::query_as("SELECT * FROM entities WHERE id = $1 AND org_id = $2 FOR UPDATE")
            .bind(primary_id)
            .bind(org_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entity {primary_id} not found")))?;

    if primary.status() == Some(EntityStatus::Merged) {
        return Err(AppError::Conflict(format!(
            "Entity {primary_id} is already merged into another entity"
        )));
    }

    let mut duplicates = Vec::with_capacity(duplicate_ids.len());
    for dup_id in duplicate_ids {
        let dup: EntityRow =
            sqlx::query_as("SELECT * FROM entities WHERE id = $1 AND org_id = $2 FOR UPDATE")
                .bind(dup_id)
                .bind(org_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Entity {dup_id} not found")))?;

        // Circular merge: either side already points at the other.
        if dup.profile().merged_into() == Some(primary.id)
            || primary.profile().merged_into() == Some(dup.id)
        {
            return Err(AppError::Conflict(format!(
                "Circular merge between {primary_id} and {dup_id}"
            )));
        }
        if dup.status() == Some(EntityStatus::Merged) {
            return Err(AppError::Conflict(format!(
                "Entity {dup_id} is already merged"
            )));
        }
        duplicates.push(dup);
    }

    match apply_merge(&mut tx, &primary, &duplicates, merged_by).await {
        Ok(()) => {
            tx.commit().await?;
            info!(
                "Merged {} entities into {}",
                duplicates.len(),
                primary_id
            );
            Ok(MergeOutcome {
                success: true,
                primary_id,
                merged: duplicates.iter().map(|d| d.id).collect(),
                error: None,
            })
        }
        Err(e) => {
            warn!("Merge into {primary_id} failed, rolling back: {e}");
            tx.rollback().await.ok();
            Ok(MergeOutcome {
                success: false,
                primary_id,
                merged: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}

async fn apply_merge(
    tx: &mut Transaction<'_, Postgres>,
    primary: &EntityRow,
    duplicates: &[EntityRow],
    merged_by: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    for dup in duplicates {
        // Re-parent dependent records onto the primary.
        for table in ["chats", "call_recordings", "entity_files"] {
            sqlx::query(&format!(
                "UPDATE {table} SET entity_id = $1 WHERE entity_id = $2"
            ))
            .bind(primary.id)
            .bind(dup.id)
            .execute(&mut **tx)
            .await?;
        }

        // A duplicate's application is dropped when the primary already has
        // one for the same vacancy (one application per entity per vacancy).
        sqlx::query(
            r#"
            DELETE FROM vacancy_applications a
            WHERE a.entity_id = $1
              AND EXISTS (
                SELECT 1 FROM vacancy_applications p
                WHERE p.entity_id = $2 AND p.vacancy_id = a.vacancy_id
              )
            "#,
        )
        .bind(dup.id)
        .bind(primary.id)
        .execute(&mut **tx)
        .await?;
        sqlx::query("UPDATE vacancy_applications SET entity_id = $1 WHERE entity_id = $2")
            .bind(primary.id)
            .bind(dup.id)
            .execute(&mut **tx)
            .await?;
    }

    let contacts = union_contacts(primary, duplicates);
    sqlx::query(
        r#"
        UPDATE entities
        SET phones = $1, emails = $2, telegram_usernames = $3, tags = $4, updated_at = now()
        WHERE id = $5
        "#,
    )
    .bind(&contacts.phones)
    .bind(&contacts.emails)
    .bind(&contacts.telegram_usernames)
    .bind(&contacts.tags)
    .bind(primary.id)
    .execute(&mut **tx)
    .await?;

    for dup in duplicates {
        let mut extra_data = dup.extra_data.clone();
        stamp_merged(&mut extra_data, primary.id, merged_by);
        sqlx::query(
            "UPDATE entities SET status = 'merged', extra_data = $1, updated_at = now() WHERE id = $2",
        )
        .bind(&extra_data)
        .bind(dup.id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
pub struct MergedContacts {
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub telegram_usernames: Vec<String>,
    pub tags: Vec<String>,
}

/// Unions contact identifier lists across the primary and all duplicates,
/// normalizing each value before insertion. Deterministically sorted.
pub fn union_contacts(primary: &EntityRow, duplicates: &[EntityRow]) -> MergedContacts {
    let mut phones = BTreeSet::new();
    let mut emails = BTreeSet::new();
    let mut telegrams = BTreeSet::new();
    let mut tags = BTreeSet::new();

    for entity in std::iter::once(primary).chain(duplicates.iter()) {
        for raw in entity.phone.iter().chain(entity.phones.iter()) {
            if let Some(p) = normalize_phone(raw) {
                phones.insert(p);
            }
        }
        for raw in entity.email.iter().chain(entity.emails.iter()) {
            if let Some(e) = normalize_email(raw) {
                emails.insert(e);
            }
        }
        for raw in &entity.telegram_usernames {
            let username = raw.trim().trim_start_matches('@').to_lowercase();
            if !username.is_empty() {
                telegrams.insert(username);
            }
        }
        for raw in &entity.tags {
            let tag = raw.trim().to_string();
            if !tag.is_empty() {
                tags.insert(tag);
            }
        }
    }

    MergedContacts {
        phones: phones.into_iter().collect(),
        emails: emails.into_iter().collect(),
        telegram_usernames: telegrams.into_iter().collect(),
        tags: tags.into_iter().collect(),
    }
}
