//! Cyrillic/Latin transliteration and name-variant generation.
//!
//! Candidate names arrive in mixed scripts across three channels (manual
//! entry, Telegram profiles, imported resumes), so duplicate detection
//! compares sets of transliteration variants instead of exact strings.

use std::collections::HashSet;

use super::normalize_name;

/// Per-character Cyrillic → Latin table (GOST-ish practical romanization).
/// Hard and soft signs transliterate to nothing.
const CYR_TO_LAT: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "kh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "shch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
];

/// Latin → Cyrillic digraphs, ordered longest-first so greedy matching
/// resolves `shch` before `sh` before `s`.
const LAT_DIGRAPHS: &[(&str, char)] = &[
    ("shch", 'щ'),
    ("sh", 'ш'),
    ("ch", 'ч'),
    ("zh", 'ж'),
    ("ts", 'ц'),
    ("kh", 'х'),
    ("ya", 'я'),
    ("yu", 'ю'),
    ("yo", 'ё'),
];

const LAT_SINGLES: &[(char, char)] = &[
    ('a', 'а'),
    ('b', 'б'),
    ('c', 'к'),
    ('d', 'д'),
    ('e', 'е'),
    ('f', 'ф'),
    ('g', 'г'),
    ('h', 'х'),
    ('i', 'и'),
    ('j', 'й'),
    ('k', 'к'),
    ('l', 'л'),
    ('m', 'м'),
    ('n', 'н'),
    ('o', 'о'),
    ('p', 'п'),
    ('q', 'к'),
    ('r', 'р'),
    ('s', 'с'),
    ('t', 'т'),
    ('u', 'у'),
    ('v', 'в'),
    ('w', 'в'),
    ('x', 'к'),
    ('y', 'й'),
    ('z', 'з'),
];

pub fn has_cyrillic(s: &str) -> bool {
    s.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

pub fn has_latin(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_alphabetic())
}

/// Transliterates lowercase Cyrillic text to Latin. Characters outside the
/// table (digits, punctuation, Latin letters) pass through untouched.
pub fn cyrillic_to_latin(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match CYR_TO_LAT.iter().find(|(cyr, _)| *cyr == c) {
            Some((_, lat)) => out.push_str(lat),
            None => out.push(c),
        }
    }
    out
}

/// Transliterates lowercase Latin text to Cyrillic, resolving digraphs
/// greedily from longest to shortest before single-character fallback.
pub fn latin_to_cyrillic(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    'outer: while i < chars.len() {
        for (digraph, cyr) in LAT_DIGRAPHS {
            let len = digraph.chars().count();
            if i + len <= chars.len() && chars[i..i + len].iter().collect::<String>() == *digraph {
                out.push(*cyr);
                i += len;
                continue 'outer;
            }
        }
        let c = chars[i];
        match LAT_SINGLES.iter().find(|(lat, _)| *lat == c) {
            Some((_, cyr)) => out.push(*cyr),
            None => out.push(c),
        }
        i += 1;
    }
    out
}

/// Generates the set of comparable forms for a person name: the normalized
/// name itself, whole-name and per-token transliterations into the other
/// script, and space-removed / hyphenated / underscored spellings of each.
/// All lowercased; usable as an OR-filter or set-intersection test.
pub fn generate_name_variants(name: &str) -> HashSet<String> {
    let normalized = normalize_name(name);
    let mut variants = HashSet::new();
    if normalized.is_empty() {
        return variants;
    }
    variants.insert(normalized.clone());

    if has_cyrillic(&normalized) {
        variants.insert(cyrillic_to_latin(&normalized));
        for token in normalized.split(' ') {
            variants.insert(cyrillic_to_latin(token));
        }
    }
    if has_latin(&normalized) {
        variants.insert(latin_to_cyrillic(&normalized));
        for token in normalized.split(' ') {
            variants.insert(latin_to_cyrillic(token));
        }
    }

    // Joined spellings of every multi-word variant.
    for v in variants.clone() {
        if v.contains(' ') {
            variants.insert(v.replace(' ', ""));
            variants.insert(v.replace(' ', "-"));
            variants.insert(v.replace(' ', "_"));
        }
    }

    variants.retain(|v| !v.is_empty());
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_jaccard(a: &str, b: &str) -> f64 {
        let wa: HashSet<&str> = a.split_whitespace().collect();
        let wb: HashSet<&str> = b.split_whitespace().collect();
        if wa.is_empty() || wb.is_empty() {
            return 0.0;
        }
        let inter = wa.intersection(&wb).count() as f64;
        let union = wa.union(&wb).count() as f64;
        inter / union
    }

    #[test]
    fn test_cyrillic_to_latin_basic() {
        assert_eq!(cyrillic_to_latin("иван петров"), "ivan petrov");
    }

    #[test]
    fn test_cyrillic_to_latin_digraphs() {
        assert_eq!(cyrillic_to_latin("щука"), "shchuka");
        assert_eq!(cyrillic_to_latin("жанна"), "zhanna");
        assert_eq!(cyrillic_to_latin("хорошо"), "khorosho");
    }

    #[test]
    fn test_latin_to_cyrillic_greedy_digraphs() {
        // `shch` must win over `sh` + `ch`
        assert_eq!(latin_to_cyrillic("shchuka"), "щука");
        assert_eq!(latin_to_cyrillic("zhanna"), "жанна");
        assert_eq!(latin_to_cyrillic("ivan"), "иван");
    }

    #[test]
    fn test_variants_include_both_scripts() {
        let variants = generate_name_variants("Иван Петров");
        assert!(variants.contains("иван петров"));
        assert!(variants.contains("ivan petrov"));
        assert!(variants.contains("ivan"));
        assert!(variants.contains("petrov"));
    }

    #[test]
    fn test_variants_joined_forms() {
        let variants = generate_name_variants("Ivan Petrov");
        assert!(variants.contains("ivanpetrov"));
        assert!(variants.contains("ivan-petrov"));
        assert!(variants.contains("ivan_petrov"));
        assert!(variants.contains("иван петров"));
    }

    #[test]
    fn test_cross_script_names_share_a_variant() {
        let a = generate_name_variants("Иван Петров");
        let b = generate_name_variants("Ivan Petrov");
        assert!(a.intersection(&b).next().is_some());
        assert!(a.contains("ivan petrov") && b.contains("ivan petrov"));
    }

    #[test]
    fn test_round_trip_word_jaccard_at_least_half() {
        for name in ["иван петров", "анна щербакова", "жанна кузнецова", "олег ткаченко"] {
            let latin = cyrillic_to_latin(name);
            let back = latin_to_cyrillic(&latin);
            let sim = word_jaccard(name, &back);
            assert!(
                sim >= 0.5,
                "round trip of '{name}' via '{latin}' gave '{back}' (jaccard {sim})"
            );
        }
    }

    #[test]
    fn test_empty_name_yields_no_variants() {
        assert!(generate_name_variants("   ").is_empty());
    }

    #[test]
    fn test_hyphenated_cyrillic_name() {
        let variants = generate_name_variants("Анна-Мария Ковалева");
        assert!(variants.contains("anna-mariya kovaleva"));
    }
}
