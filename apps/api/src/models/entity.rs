use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of person record tracked within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Candidate,
    Client,
    Contractor,
    Lead,
    Partner,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Candidate => "candidate",
            EntityType::Client => "client",
            EntityType::Contractor => "contractor",
            EntityType::Lead => "lead",
            EntityType::Partner => "partner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "candidate" => Some(EntityType::Candidate),
            "client" => Some(EntityType::Client),
            "contractor" => Some(EntityType::Contractor),
            "lead" => Some(EntityType::Lead),
            "partner" => Some(EntityType::Partner),
            _ => None,
        }
    }
}

/// Entity lifecycle status. A superset shared across entity types — the
/// recruiting subset (new/screening/interview/offer/hired/rejected) is what
/// the pipeline synchronizer maps application stages onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    New,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
    Active,
    Paused,
    Churned,
    Converted,
    Ended,
    Negotiation,
    /// Logically dead: absorbed into another entity. `extra_data.merged_into`
    /// points at the surviving record.
    Merged,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::New => "new",
            EntityStatus::Screening => "screening",
            EntityStatus::Interview => "interview",
            EntityStatus::Offer => "offer",
            EntityStatus::Hired => "hired",
            EntityStatus::Rejected => "rejected",
            EntityStatus::Active => "active",
            EntityStatus::Paused => "paused",
            EntityStatus::Churned => "churned",
            EntityStatus::Converted => "converted",
            EntityStatus::Ended => "ended",
            EntityStatus::Negotiation => "negotiation",
            EntityStatus::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(EntityStatus::New),
            "screening" => Some(EntityStatus::Screening),
            "interview" => Some(EntityStatus::Interview),
            "offer" => Some(EntityStatus::Offer),
            "hired" => Some(EntityStatus::Hired),
            "rejected" => Some(EntityStatus::Rejected),
            "active" => Some(EntityStatus::Active),
            "paused" => Some(EntityStatus::Paused),
            "churned" => Some(EntityStatus::Churned),
            "converted" => Some(EntityStatus::Converted),
            "ended" => Some(EntityStatus::Ended),
            "negotiation" => Some(EntityStatus::Negotiation),
            "merged" => Some(EntityStatus::Merged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityRow {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub entity_type: String,
    pub status: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Additional identifiers accumulated across channels and merges.
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub telegram_usernames: Vec<String>,
    pub tags: Vec<String>,
    /// Schema-less profile payload: skills, experience, salary, location...
    pub extra_data: Value,
    pub ai_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityRow {
    pub fn profile(&self) -> Profile<'_> {
        Profile(&self.extra_data)
    }

    pub fn status(&self) -> Option<EntityStatus> {
        EntityStatus::parse(&self.status)
    }
}

/// Typed read-only view over an entity's `extra_data` map. Business logic
/// goes through these accessors rather than poking at raw JSON keys.
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a>(pub &'a Value);

const SKILL_KEYS: &[&str] = &["skills", "technologies", "tech_stack", "stack", "competencies"];

impl<'a> Profile<'a> {
    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty())
    }

    fn num_field(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Union of skill tokens across every recognized key. Each key accepts a
    /// JSON array or a comma/semicolon/newline-delimited string; tokens are
    /// trimmed and lowercased.
    pub fn skills(&self) -> std::collections::HashSet<String> {
        let mut out = std::collections::HashSet::new();
        for key in SKILL_KEYS {
            match self.0.get(*key) {
                Some(Value::Array(items)) => {
                    for item in items {
                        if let Some(s) = item.as_str() {
                            push_skill(&mut out, s);
                        }
                    }
                }
                Some(Value::String(s)) => {
                    for token in s.split(|c| c == ',' || c == ';' || c == '\n') {
                        push_skill(&mut out, token);
                    }
                }
                _ => {}
            }
        }
        out
    }

    pub fn experience_years(&self) -> Option<f64> {
        self.num_field("experience_years")
            .or_else(|| self.num_field("experience"))
    }

    pub fn location(&self) -> Option<&'a str> {
        self.str_field("location").or_else(|| self.str_field("city"))
    }

    pub fn expected_salary_min(&self) -> Option<i64> {
        self.num_field("expected_salary_min").map(|v| v as i64)
    }

    pub fn expected_salary_max(&self) -> Option<i64> {
        self.num_field("expected_salary_max").map(|v| v as i64)
    }

    pub fn salary_currency(&self) -> Option<&'a str> {
        self.str_field("expected_salary_currency")
            .or_else(|| self.str_field("salary_currency"))
    }

    pub fn position(&self) -> Option<&'a str> {
        self.str_field("position").or_else(|| self.str_field("title"))
    }

    pub fn company(&self) -> Option<&'a str> {
        self.str_field("company")
    }

    pub fn education(&self) -> Option<&'a str> {
        self.str_field("education")
    }

    pub fn languages(&self) -> Option<&'a str> {
        self.str_field("languages")
    }

    /// Id of the entity this record was merged into, if any.
    pub fn merged_into(&self) -> Option<Uuid> {
        self.str_field("merged_into")
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

fn push_skill(out: &mut std::collections::HashSet<String>, raw: &str) {
    let token = raw.trim().to_lowercase();
    if !token.is_empty() {
        out.insert(token);
    }
}

/// Stamps the merge bookkeeping fields onto a duplicate's `extra_data`.
pub fn stamp_merged(extra_data: &mut Value, primary_id: Uuid, merged_by: Option<Uuid>) {
    if !extra_data.is_object() {
        *extra_data = Value::Object(serde_json::Map::new());
    }
    let map = extra_data.as_object_mut().expect("just ensured object");
    map.insert("merged_into".into(), Value::String(primary_id.to_string()));
    map.insert("merged_at".into(), Value::String(Utc::now().to_rfc3339()));
    if let Some(user) = merged_by {
        map.insert("merged_by".into(), Value::String(user.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skills_from_array() {
        let data = json!({"skills": ["Python", " Django ", ""]});
        let skills = Profile(&data).skills();
        assert!(skills.contains("python"));
        assert!(skills.contains("django"));
        assert_eq!(skills.len(), 2);
    }

    #[test]
    fn test_skills_from_delimited_string() {
        let data = json!({"tech_stack": "Rust, PostgreSQL; Kafka\nRedis"});
        let skills = Profile(&data).skills();
        assert_eq!(skills.len(), 4);
        assert!(skills.contains("postgresql"));
        assert!(skills.contains("redis"));
    }

    #[test]
    fn test_skills_union_across_keys() {
        let data = json!({"skills": ["python"], "technologies": "python, go"});
        let skills = Profile(&data).skills();
        assert_eq!(skills.len(), 2);
    }

    #[test]
    fn test_experience_accepts_string_numbers() {
        let data = json!({"experience_years": "5"});
        assert_eq!(Profile(&data).experience_years(), Some(5.0));
    }

    #[test]
    fn test_merged_into_roundtrip() {
        let primary = Uuid::new_v4();
        let mut data = json!({});
        stamp_merged(&mut data, primary, None);
        assert_eq!(Profile(&data).merged_into(), Some(primary));
        assert!(data.get("merged_at").is_some());
    }

    #[test]
    fn test_entity_type_parse_roundtrip() {
        for raw in ["candidate", "client", "contractor", "lead", "partner"] {
            let parsed = EntityType::parse(raw).expect(raw);
            assert_eq!(parsed.as_str(), raw);
        }
        assert!(EntityType::parse("unicorn").is_none());
        assert!(EntityType::parse("Candidate").is_none());
    }

    #[test]
    fn test_status_parse_covers_all_variants() {
        for status in [
            "new",
            "screening",
            "interview",
            "offer",
            "hired",
            "rejected",
            "active",
            "paused",
            "churned",
            "converted",
            "ended",
            "negotiation",
            "merged",
        ] {
            let parsed = EntityStatus::parse(status).expect(status);
            assert_eq!(parsed.as_str(), status);
        }
    }
}
