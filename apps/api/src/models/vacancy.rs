use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyStatus {
    Draft,
    Open,
    Closed,
}

impl VacancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VacancyStatus::Draft => "draft",
            VacancyStatus::Open => "open",
            VacancyStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(VacancyStatus::Draft),
            "open" => Some(VacancyStatus::Open),
            "closed" => Some(VacancyStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VacancyRow {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub status: String,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VacancyRow {
    pub fn status(&self) -> Option<VacancyStatus> {
        VacancyStatus::parse(&self.status)
    }
}

/// Rejects invalid vacancy field combinations before any mutation.
pub fn validate_vacancy_fields(
    title: &str,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Vacancy title must not be empty".into()));
    }
    if let (Some(min), Some(max)) = (salary_min, salary_max) {
        if min > max {
            return Err(AppError::Validation(format!(
                "salary_min ({min}) must not exceed salary_max ({max})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range_passes() {
        assert!(validate_vacancy_fields("Backend Engineer", Some(100), Some(200)).is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = validate_vacancy_fields("Backend Engineer", Some(300), Some(200));
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_open_ended_range_passes() {
        assert!(validate_vacancy_fields("Backend Engineer", Some(100), None).is_ok());
        assert!(validate_vacancy_fields("Backend Engineer", None, Some(200)).is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = validate_vacancy_fields("   ", None, None);
        assert!(matches!(err, Err(AppError::Validation(_))));
    }
}
