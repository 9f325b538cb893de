//! Bidirectional mapping between application stages and entity statuses.
//!
//! One const pair table is the single source of truth; both lookup
//! directions are derived from it. `validate` runs at startup so a stage
//! added without a mapping fails fast instead of silently not syncing.

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::models::application::ApplicationStage;
use crate::models::entity::EntityStatus;

/// Stage → status pairs. For statuses appearing more than once (several
/// stages collapse onto one status), the FIRST pair defines the reverse
/// direction: the stage a candidate enters when added to a pipeline while
/// already carrying that status.
const STAGE_STATUS_PAIRS: &[(ApplicationStage, EntityStatus)] = &[
    (ApplicationStage::Applied, EntityStatus::New),
    (ApplicationStage::Screening, EntityStatus::Screening),
    (ApplicationStage::PhoneScreen, EntityStatus::Screening),
    (ApplicationStage::Interview, EntityStatus::Interview),
    (ApplicationStage::Assessment, EntityStatus::Interview),
    (ApplicationStage::Offer, EntityStatus::Offer),
    (ApplicationStage::Hired, EntityStatus::Hired),
    (ApplicationStage::Rejected, EntityStatus::Rejected),
    (ApplicationStage::Withdrawn, EntityStatus::New),
];

pub struct SyncMap {
    stage_to_status: HashMap<ApplicationStage, EntityStatus>,
    status_to_stage: HashMap<EntityStatus, ApplicationStage>,
}

impl SyncMap {
    pub fn new() -> Self {
        let mut stage_to_status = HashMap::new();
        let mut status_to_stage = HashMap::new();
        for (stage, status) in STAGE_STATUS_PAIRS {
            stage_to_status.insert(*stage, *status);
            status_to_stage.entry(*status).or_insert(*stage);
        }
        SyncMap {
            stage_to_status,
            status_to_stage,
        }
    }

    /// Entity status a stage change propagates to.
    pub fn status_for_stage(&self, stage: ApplicationStage) -> Option<EntityStatus> {
        self.stage_to_status.get(&stage).copied()
    }

    /// Initial stage for a candidate entering a pipeline with this status.
    pub fn stage_for_status(&self, status: EntityStatus) -> Option<ApplicationStage> {
        self.status_to_stage.get(&status).copied()
    }

    /// Every stage must have a status mapping, and every recruiting-lifecycle
    /// status must have an entry stage — a candidate carrying one of these
    /// statuses always lands in a concrete column when added to a pipeline.
    pub fn validate(&self) -> Result<()> {
        const RECRUITING_STATUSES: &[EntityStatus] = &[
            EntityStatus::New,
            EntityStatus::Screening,
            EntityStatus::Interview,
            EntityStatus::Offer,
            EntityStatus::Hired,
            EntityStatus::Rejected,
        ];

        for stage in ApplicationStage::ALL {
            if !self.stage_to_status.contains_key(&stage) {
                bail!("stage '{}' has no entity status mapping", stage.as_str());
            }
        }
        for status in RECRUITING_STATUSES {
            if !self.status_to_stage.contains_key(status) {
                bail!(
                    "recruiting status '{}' has no entry stage",
                    status.as_str()
                );
            }
        }
        Ok(())
    }
}

impl Default for SyncMap {
    fn default() -> Self {
        Self::new()
    }
}
