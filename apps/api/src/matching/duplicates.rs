//! Duplicate Detector — finds entity records that likely describe the same
//! real person, using normalized contact identifiers and transliteration-
//! aware name comparison.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use sqlx::PgPool;
use strsim::jaro_winkler;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::entity::EntityRow;
use crate::normalize::{
    first_name_token, generate_name_variants, normalize_email, normalize_name, normalize_phone,
    translit::{cyrillic_to_latin, has_cyrillic, has_latin, latin_to_cyrillic},
};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Confidence contributions per matched field. The variant-equivalence tier
/// treats a shared transliterated full-name form as near-exact identity
/// evidence; the Jaccard tiers below it cover partial name overlap.
const EMAIL_WEIGHT: f64 = 0.5;
const PHONE_WEIGHT: f64 = 0.35;
const NAME_VARIANT_WEIGHT: f64 = 0.40;
const NAME_STRONG_WEIGHT: f64 = 0.15;
const NAME_WEAK_WEIGHT: f64 = 0.10;

/// Name-prefix patterns sent to the candidate-pool query are capped so a
/// pathological variant explosion cannot blow up the OR filter.
const MAX_NAME_PREFIXES: usize = 8;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MatchedFields {
    pub email: bool,
    pub phone: bool,
    pub name: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateCandidate {
    pub entity_id: Uuid,
    pub name: String,
    pub confidence: f64,
    pub match_reasons: Vec<String>,
    pub matched_fields: MatchedFields,
}

#[derive(Debug, Serialize)]
pub struct DuplicateGroup {
    pub primary: EntityRow,
    pub duplicates: Vec<DuplicateCandidate>,
}

fn normalized_emails(e: &EntityRow) -> HashSet<String> {
    e.email
        .iter()
        .chain(e.emails.iter())
        .filter_map(|raw| normalize_email(raw))
        .collect()
}

fn normalized_phones(e: &EntityRow) -> HashSet<String> {
    e.phone
        .iter()
        .chain(e.phones.iter())
        .filter_map(|raw| normalize_phone(raw))
        .collect()
}

/// Full-name comparable forms: the whole normalized name, its opposite-script
/// transliteration, and joined spellings — never individual tokens, so a
/// shared first name alone cannot count as full-name identity.
fn full_name_forms(name: &str) -> HashSet<String> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return HashSet::new();
    }
    let mut whole = HashSet::from([normalized.clone()]);
    if has_cyrillic(&normalized) {
        whole.insert(cyrillic_to_latin(&normalized));
    }
    if has_latin(&normalized) {
        whole.insert(latin_to_cyrillic(&normalized));
    }
    let mut forms = HashSet::new();
    for v in whole {
        forms.insert(v.replace(' ', ""));
        forms.insert(v.replace(' ', "-"));
        forms.insert(v.replace(' ', "_"));
        forms.insert(v);
    }
    forms
}

/// Word-set Jaccard between two names, script-aligned: both sides are
/// compared in Latin so "Иван Петров" and "Ivan Petrov" share words.
pub fn name_word_jaccard(a: &str, b: &str) -> f64 {
    let to_words = |name: &str| -> HashSet<String> {
        let normalized = normalize_name(name);
        let aligned = if has_cyrillic(&normalized) {
            cyrillic_to_latin(&normalized)
        } else {
            normalized
        };
        aligned.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect()
    };
    let wa = to_words(a);
    let wb = to_words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let inter = wa.intersection(&wb).count() as f64;
    inter / wa.union(&wb).count() as f64
}

/// Scores one candidate pair. Weighted match bits, capped at 1.0.
pub fn duplicate_confidence(a: &EntityRow, b: &EntityRow) -> (f64, Vec<String>, MatchedFields) {
    let mut confidence = 0.0;
    let mut reasons = Vec::new();
    let mut fields = MatchedFields::default();

    if !normalized_emails(a).is_disjoint(&normalized_emails(b)) {
        confidence += EMAIL_WEIGHT;
        fields.email = true;
        reasons.push("Exact email match".to_string());
    }

    if !normalized_phones(a).is_disjoint(&normalized_phones(b)) {
        confidence += PHONE_WEIGHT;
        fields.phone = true;
        reasons.push("Exact phone match".to_string());
    }

    if !full_name_forms(&a.name).is_disjoint(&full_name_forms(&b.name)) {
        confidence += NAME_VARIANT_WEIGHT;
        fields.name = true;
        reasons.push("Name matches across spellings".to_string());
    } else {
        let jaccard = name_word_jaccard(&a.name, &b.name);
        if jaccard >= 0.8 {
            confidence += NAME_STRONG_WEIGHT;
            fields.name = true;
            reasons.push("Very similar name".to_string());
        } else if jaccard >= 0.5 {
            confidence += NAME_WEAK_WEIGHT;
            fields.name = true;
            reasons.push("Partially matching name".to_string());
        } else if name_token_jaro(&a.name, &b.name) >= 0.95 {
            // Typo-distance backstop for single-token near-misses.
            confidence += NAME_WEAK_WEIGHT;
            fields.name = true;
            reasons.push("Near-identical name spelling".to_string());
        }
    }

    (confidence.min(1.0), reasons, fields)
}

/// Best Jaro-Winkler similarity between the two names' first tokens,
/// compared in Latin script.
fn name_token_jaro(a: &str, b: &str) -> f64 {
    let align = |name: &str| {
        let n = normalize_name(name);
        if has_cyrillic(&n) {
            cyrillic_to_latin(&n)
        } else {
            n
        }
    };
    let a = align(a);
    let b = align(b);
    match (first_name_token(&a), first_name_token(&b)) {
        (Some(ta), Some(tb)) => jaro_winkler(ta, tb),
        _ => 0.0,
    }
}

/// Prefix patterns for the pool query: first token of the normalized name
/// and of each transliteration variant, tokens longer than two characters.
fn name_prefix_patterns(name: &str) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let normalized = normalize_name(name);
    let mut candidates: Vec<String> = Vec::new();
    if let Some(tok) = first_name_token(&normalized) {
        candidates.push(tok.to_string());
    }
    for variant in generate_name_variants(&normalized) {
        if let Some(tok) = first_name_token(&variant) {
            candidates.push(tok.to_string());
        }
    }
    for tok in candidates {
        if tok.chars().count() > 2 && seen.insert(tok.clone()) {
            prefixes.push(format!("{tok}%"));
            if prefixes.len() >= MAX_NAME_PREFIXES {
                break;
            }
        }
    }
    prefixes
}

/// Last ten digits of each normalized phone, used for suffix matching.
fn phone_suffixes(e: &EntityRow) -> Vec<String> {
    normalized_phones(e)
        .into_iter()
        .map(|p| {
            let digits: Vec<char> = p.chars().collect();
            let start = digits.len().saturating_sub(10);
            digits[start..].iter().collect()
        })
        .collect()
}

/// Finds likely duplicates of `entity` within its organization and type.
/// Raising `threshold` can only shrink the result set.
pub async fn find_duplicates(
    pool: &PgPool,
    entity: &EntityRow,
    threshold: f64,
) -> Result<Vec<DuplicateCandidate>, AppError> {
    let emails: Vec<String> = normalized_emails(entity).into_iter().collect();
    let suffixes = phone_suffixes(entity);
    let prefixes = name_prefix_patterns(&entity.name);

    let candidates: Vec<EntityRow> = sqlx::query_as(
        r#"
        SELECT * FROM entities
        WHERE org_id = $1
          AND entity_type = $2
          AND id != $3
          AND status != 'merged'
          AND (
            lower(email) = ANY($4)
            OR emails && $4
            OR EXISTS (
                SELECT 1 FROM unnest($5::text[]) AS s(suffix)
                WHERE phone LIKE '%' || s.suffix
                   OR EXISTS (SELECT 1 FROM unnest(phones) AS p WHERE p LIKE '%' || s.suffix)
            )
            OR name ILIKE ANY($6)
          )
        "#,
    )
    .bind(entity.org_id)
    .bind(&entity.entity_type)
    .bind(entity.id)
    .bind(&emails)
    .bind(&suffixes)
    .bind(&prefixes)
    .fetch_all(pool)
    .await?;

    let mut duplicates: Vec<DuplicateCandidate> = candidates
        .iter()
        .filter_map(|other| {
            let (confidence, match_reasons, matched_fields) =
                duplicate_confidence(entity, other);
            (confidence >= threshold).then(|| DuplicateCandidate {
                entity_id: other.id,
                name: other.name.clone(),
                confidence,
                match_reasons,
                matched_fields,
            })
        })
        .collect();

    duplicates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(duplicates)
}

/// Scans an organization for duplicate groups, most recent entities first.
/// Entities already claimed by an earlier group are skipped; duplicates of
/// duplicates are folded into the same group transitively.
pub async fn find_all_duplicates(
    pool: &PgPool,
    org_id: Uuid,
    entity_type: &str,
    limit: i64,
) -> Result<Vec<DuplicateGroup>, AppError> {
    let entities: Vec<EntityRow> = sqlx::query_as(
        r#"
        SELECT * FROM entities
        WHERE org_id = $1 AND entity_type = $2 AND status != 'merged'
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(org_id)
    .bind(entity_type)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut claimed: HashSet<Uuid> = HashSet::new();
    let mut groups = Vec::new();

    for primary in &entities {
        if claimed.contains(&primary.id) {
            continue;
        }

        let mut group: Vec<DuplicateCandidate> = Vec::new();
        let mut queue: VecDeque<EntityRow> = VecDeque::from([primary.clone()]);
        let mut visited: HashSet<Uuid> = HashSet::from([primary.id]);

        while let Some(current) = queue.pop_front() {
            for dup in find_duplicates(pool, &current, DEFAULT_THRESHOLD).await? {
                if dup.entity_id == primary.id || !visited.insert(dup.entity_id) {
                    continue;
                }
                if let Some(row) = entities.iter().find(|e| e.id == dup.entity_id) {
                    queue.push_back(row.clone());
                }
                group.push(dup);
            }
        }

        if !group.is_empty() {
            claimed.insert(primary.id);
            claimed.extend(group.iter().map(|d| d.entity_id));
            groups.push(DuplicateGroup {
                primary: primary.clone(),
                duplicates: group,
            });
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn make_entity(name: &str, email: Option<&str>, phone: Option<&str>) -> EntityRow {
        EntityRow {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: name.to_string(),
            entity_type: "candidate".to_string(),
            status: "new".to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            phones: vec![],
            emails: vec![],
            telegram_usernames: vec![],
            tags: vec![],
            extra_data: json!({}),
            ai_summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_email_and_phone_match_weights() {
        let a = make_entity("Ivan Petrov", Some("ivan@example.com"), Some("+7 916 123 45 67"));
        let b = make_entity("I. Petrov", Some("IVAN@example.com"), Some("89161234567"));
        let (confidence, _, fields) = duplicate_confidence(&a, &b);
        assert!(fields.email && fields.phone);
        // 0.5 email + 0.35 phone; name tier may add on top, cap at 1.0
        assert!(confidence >= 0.85);
        assert!(confidence <= 1.0);
    }

    #[test]
    fn test_cross_script_name_only_confidence() {
        let a = make_entity("Иван Петров", None, None);
        let b = make_entity("Ivan Petrov", None, None);
        let (ab, _, fields) = duplicate_confidence(&a, &b);
        let (ba, _, _) = duplicate_confidence(&b, &a);
        assert!(fields.name);
        assert!(ab >= 0.40, "expected >= 0.40, got {ab}");
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_shared_first_name_is_not_full_match() {
        let a = make_entity("Ivan Petrov", None, None);
        let b = make_entity("Ivan Sidorov", None, None);
        let (confidence, _, _) = duplicate_confidence(&a, &b);
        // word jaccard 1/3 < 0.5, no full-name variant shared
        assert!(confidence < 0.40, "got {confidence}");
    }

    #[test]
    fn test_name_word_jaccard_cross_script() {
        assert!(name_word_jaccard("Иван Петров", "Ivan Petrov") >= 0.99);
        assert!(name_word_jaccard("Ivan Petrov", "Ivan Petrov Sergeevich") >= 0.5);
    }

    #[test]
    fn test_partial_name_weak_tier() {
        let a = make_entity("Ivan Petrov Sergeevich", None, None);
        let b = make_entity("Ivan Petrov", None, None);
        let (confidence, reasons, _) = duplicate_confidence(&a, &b);
        // jaccard 2/3 → weak tier
        assert!((confidence - NAME_WEAK_WEIGHT).abs() < 1e-9, "got {confidence}");
        assert_eq!(reasons, vec!["Partially matching name"]);
    }

    #[test]
    fn test_confidence_capped_at_one() {
        let a = make_entity("Иван Петров", Some("ivan@example.com"), Some("89161234567"));
        let b = make_entity("Ivan Petrov", Some("ivan@example.com"), Some("+79161234567"));
        let (confidence, _, _) = duplicate_confidence(&a, &b);
        assert!(confidence <= 1.0);
        // 0.5 + 0.35 + 0.40 would be 1.25 uncapped
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let base = make_entity("Иван Петров", Some("ivan@example.com"), None);
        let others = vec![
            make_entity("Ivan Petrov", None, None),
            make_entity("Иван Петров", Some("ivan@example.com"), None),
            make_entity("Ivan Sidorov", None, None),
        ];
        let count_at = |threshold: f64| {
            others
                .iter()
                .filter(|o| duplicate_confidence(&base, o).0 >= threshold)
                .count()
        };
        let mut prev = usize::MAX;
        for threshold in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let n = count_at(threshold);
            assert!(n <= prev, "threshold {threshold} increased result count");
            prev = n;
        }
    }

    #[test]
    fn test_name_prefix_patterns_include_transliteration() {
        let patterns = name_prefix_patterns("Иван Петров");
        assert!(patterns.contains(&"иван%".to_string()));
        assert!(patterns.contains(&"ivan%".to_string()));
        assert!(patterns.len() <= MAX_NAME_PREFIXES);
    }

    #[test]
    fn test_name_prefix_skips_short_tokens() {
        let patterns = name_prefix_patterns("Li Wu");
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_no_match_zero_confidence() {
        let a = make_entity("Anna Karenina", Some("anna@example.com"), None);
        let b = make_entity("Boris Godunov", Some("boris@example.com"), None);
        let (confidence, reasons, _) = duplicate_confidence(&a, &b);
        assert_eq!(confidence, 0.0);
        assert!(reasons.is_empty());
    }
}
