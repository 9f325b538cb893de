use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kanban pipeline stage of one candidate's application to one vacancy.
/// `hired`, `rejected` and `withdrawn` are terminal for the application;
/// the candidate entity itself can re-enter a different pipeline afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStage {
    Applied,
    Screening,
    PhoneScreen,
    Interview,
    Assessment,
    Offer,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStage {
    pub const ALL: [ApplicationStage; 9] = [
        ApplicationStage::Applied,
        ApplicationStage::Screening,
        ApplicationStage::PhoneScreen,
        ApplicationStage::Interview,
        ApplicationStage::Assessment,
        ApplicationStage::Offer,
        ApplicationStage::Hired,
        ApplicationStage::Rejected,
        ApplicationStage::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStage::Applied => "applied",
            ApplicationStage::Screening => "screening",
            ApplicationStage::PhoneScreen => "phone_screen",
            ApplicationStage::Interview => "interview",
            ApplicationStage::Assessment => "assessment",
            ApplicationStage::Offer => "offer",
            ApplicationStage::Hired => "hired",
            ApplicationStage::Rejected => "rejected",
            ApplicationStage::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applied" => Some(ApplicationStage::Applied),
            "screening" => Some(ApplicationStage::Screening),
            "phone_screen" => Some(ApplicationStage::PhoneScreen),
            "interview" => Some(ApplicationStage::Interview),
            "assessment" => Some(ApplicationStage::Assessment),
            "offer" => Some(ApplicationStage::Offer),
            "hired" => Some(ApplicationStage::Hired),
            "rejected" => Some(ApplicationStage::Rejected),
            "withdrawn" => Some(ApplicationStage::Withdrawn),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStage::Hired | ApplicationStage::Rejected | ApplicationStage::Withdrawn
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VacancyApplicationRow {
    pub id: Uuid,
    pub org_id: Uuid,
    pub vacancy_id: Uuid,
    pub entity_id: Uuid,
    pub stage: String,
    /// Sort key within the stage column. Non-negative; rebalanced to
    /// multiples of 1000 when spacing runs out.
    pub stage_order: i64,
    pub rating: Option<i32>,
    pub notes: Option<String>,
    pub last_stage_change_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VacancyApplicationRow {
    pub fn stage(&self) -> Option<ApplicationStage> {
        ApplicationStage::parse(&self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in ApplicationStage::ALL {
            assert_eq!(ApplicationStage::parse(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn test_terminal_stages() {
        assert!(ApplicationStage::Hired.is_terminal());
        assert!(ApplicationStage::Rejected.is_terminal());
        assert!(ApplicationStage::Withdrawn.is_terminal());
        assert!(!ApplicationStage::Offer.is_terminal());
        assert!(!ApplicationStage::Applied.is_terminal());
    }
}
