//! Canonical forms for contact identifiers and names. Every comparison in
//! the matching pipeline runs on normalized values, never raw input.

pub mod translit;

pub use translit::generate_name_variants;

/// Normalizes a phone number to its national significant digits.
///
/// Strips everything but digits. An 11-digit result starting with a Russian
/// trunk prefix (`7` or `8`) loses the leading digit. Anything shorter than
/// 10 digits is not a usable phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 11 && (digits.starts_with('7') || digits.starts_with('8')) {
        digits.remove(0);
    }

    if digits.len() < 10 {
        None
    } else {
        Some(digits)
    }
}

/// Lowercases and trims an email address. Empty input normalizes to `None`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        None
    } else {
        Some(email)
    }
}

/// Lowercases a name and collapses runs of whitespace to single spaces.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First whitespace-separated token of a normalized name, if any.
pub fn first_name_token(normalized: &str) -> Option<&str> {
    normalized.split(' ').next().filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_strips_formatting() {
        assert_eq!(
            normalize_phone("+7 (916) 123-45-67"),
            Some("9161234567".to_string())
        );
    }

    #[test]
    fn test_phone_drops_trunk_eight() {
        assert_eq!(normalize_phone("89161234567"), Some("9161234567".to_string()));
    }

    #[test]
    fn test_phone_too_short_is_none() {
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("not a phone"), None);
    }

    #[test]
    fn test_phone_long_international_untouched() {
        // 12 digits, no trunk prefix handling
        assert_eq!(
            normalize_phone("+380 44 123 45 67"),
            Some("380441234567".to_string())
        );
    }

    #[test]
    fn test_phone_idempotent() {
        for raw in ["+7 916 123 45 67", "89161234567", "9161234567"] {
            let once = normalize_phone(raw).unwrap();
            assert_eq!(normalize_phone(&once), Some(once.clone()));
        }
    }

    #[test]
    fn test_email_lowercase_trim() {
        assert_eq!(
            normalize_email("  Ivan.Petrov@Example.COM "),
            Some("ivan.petrov@example.com".to_string())
        );
    }

    #[test]
    fn test_email_empty_is_none() {
        assert_eq!(normalize_email("   "), None);
    }

    #[test]
    fn test_email_idempotent() {
        let once = normalize_email("MiXeD@Case.Org").unwrap();
        assert_eq!(normalize_email(&once), Some(once.clone()));
    }

    #[test]
    fn test_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Ivan\t  Petrov "), "ivan petrov");
    }

    #[test]
    fn test_first_name_token() {
        assert_eq!(first_name_token("ivan petrov"), Some("ivan"));
        assert_eq!(first_name_token(""), None);
    }
}
