//! Renders candidate and vacancy records as structured Markdown profiles —
//! the text both scorer backends reason over.

use crate::models::entity::EntityRow;
use crate::models::vacancy::VacancyRow;

fn push_line(out: &mut String, label: &str, value: &str) {
    if !value.trim().is_empty() {
        out.push_str(&format!("- {label}: {value}\n"));
    }
}

pub fn render_candidate_profile(entity: &EntityRow) -> String {
    let profile = entity.profile();
    let mut out = format!("## Candidate: {}\n", entity.name);

    if let Some(position) = profile.position() {
        push_line(&mut out, "Position", position);
    }
    if let Some(company) = profile.company() {
        push_line(&mut out, "Company", company);
    }
    match (profile.expected_salary_min(), profile.expected_salary_max()) {
        (Some(min), Some(max)) => {
            let currency = profile.salary_currency().unwrap_or("");
            push_line(&mut out, "Expected salary", &format!("{min}–{max} {currency}"));
        }
        (Some(min), None) => push_line(&mut out, "Expected salary", &format!("from {min}")),
        (None, Some(max)) => push_line(&mut out, "Expected salary", &format!("up to {max}")),
        (None, None) => {}
    }
    let mut skills: Vec<String> = profile.skills().into_iter().collect();
    if !skills.is_empty() {
        skills.sort();
        push_line(&mut out, "Skills", &skills.join(", "));
    }
    if let Some(years) = profile.experience_years() {
        push_line(&mut out, "Experience", &format!("{years} years"));
    }
    if let Some(location) = profile.location() {
        push_line(&mut out, "Location", location);
    }
    if let Some(education) = profile.education() {
        push_line(&mut out, "Education", education);
    }
    if let Some(languages) = profile.languages() {
        push_line(&mut out, "Languages", languages);
    }
    if let Some(summary) = entity.ai_summary.as_deref() {
        push_line(&mut out, "Summary", summary);
    }

    out
}

pub fn render_vacancy_profile(vacancy: &VacancyRow) -> String {
    let mut out = format!("## Vacancy: {}\n", vacancy.title);

    if let Some(description) = vacancy.description.as_deref() {
        push_line(&mut out, "Description", description);
    }
    if let Some(requirements) = vacancy.requirements.as_deref() {
        push_line(&mut out, "Requirements", requirements);
    }
    if let Some(responsibilities) = vacancy.responsibilities.as_deref() {
        push_line(&mut out, "Responsibilities", responsibilities);
    }
    match (vacancy.salary_min, vacancy.salary_max) {
        (Some(min), Some(max)) => {
            let currency = vacancy.salary_currency.as_deref().unwrap_or("");
            push_line(&mut out, "Salary", &format!("{min}–{max} {currency}"));
        }
        (Some(min), None) => push_line(&mut out, "Salary", &format!("from {min}")),
        (None, Some(max)) => push_line(&mut out, "Salary", &format!("up to {max}")),
        (None, None) => {}
    }
    if let Some(location) = vacancy.location.as_deref() {
        push_line(&mut out, "Location", location);
    }
    if let Some(employment_type) = vacancy.employment_type.as_deref() {
        push_line(&mut out, "Employment type", employment_type);
    }
    if let Some(level) = vacancy.experience_level.as_deref() {
        push_line(&mut out, "Experience level", level);
    }
    if !vacancy.tags.is_empty() {
        push_line(&mut out, "Tags", &vacancy.tags.join(", "));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn make_candidate() -> EntityRow {
        EntityRow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "Ivan Petrov".to_string(),
            entity_type: "candidate".to_string(),
            status: "new".to_string(),
            email: None,
            phone: None,
            phones: vec![],
            emails: vec![],
            telegram_usernames: vec![],
            tags: vec![],
            extra_data: json!({
                "position": "Backend Engineer",
                "skills": ["python", "django"],
                "experience_years": 5,
                "expected_salary_min": 200000,
                "expected_salary_max": 300000,
                "expected_salary_currency": "RUB",
                "location": "Moscow"
            }),
            ai_summary: Some("Strong backend candidate".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_vacancy() -> VacancyRow {
        VacancyRow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            title: "Senior Backend Engineer".to_string(),
            description: Some("Build the core platform".to_string()),
            requirements: Some("Python, Django, PostgreSQL".to_string()),
            responsibilities: None,
            salary_min: Some(250000),
            salary_max: Some(350000),
            salary_currency: Some("RUB".to_string()),
            location: Some("Moscow".to_string()),
            employment_type: Some("full_time".to_string()),
            experience_level: Some("senior".to_string()),
            status: "open".to_string(),
            tags: vec!["backend".to_string()],
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_candidate_profile_contains_key_fields() {
        let profile = render_candidate_profile(&make_candidate());
        assert!(profile.contains("## Candidate: Ivan Petrov"));
        assert!(profile.contains("Backend Engineer"));
        assert!(profile.contains("django, python"));
        assert!(profile.contains("200000–300000 RUB"));
        assert!(profile.contains("Strong backend candidate"));
    }

    #[test]
    fn test_vacancy_profile_contains_key_fields() {
        let profile = render_vacancy_profile(&make_vacancy());
        assert!(profile.contains("## Vacancy: Senior Backend Engineer"));
        assert!(profile.contains("Python, Django, PostgreSQL"));
        assert!(profile.contains("250000–350000 RUB"));
        assert!(profile.contains("Tags: backend"));
    }

    #[test]
    fn test_missing_fields_are_omitted() {
        let mut candidate = make_candidate();
        candidate.extra_data = json!({});
        candidate.ai_summary = None;
        let profile = render_candidate_profile(&candidate);
        assert!(!profile.contains("Salary"));
        assert!(!profile.contains("Skills"));
    }
}
