//! Deterministic address comparison, used when the AI comparison fails.

/// Phrase-level spellings of Ho Chi Minh City, longest first so that
/// shorter variants never split a longer one.
const CITY_VARIANTS: &[&str] = &[
    "thanh pho ho chi minh",
    "tp. ho chi minh",
    "tp ho chi minh",
    "ho chi minh city",
    "ho chi minh",
];

/// Whole-word abbreviations.
const WORD_ABBREVIATIONS: &[(&str, &str)] = &[
    ("street", "st"),
    ("district", "dist"),
    ("ward", "w"),
    ("avenue", "ave"),
    ("road", "rd"),
    ("quan", "q"),
    ("phuong", "p"),
];

/// Canonical form used for comparison.
pub fn normalize_address(address: &str) -> String {
    let mut normalized = address.trim().to_lowercase();
    for variant in CITY_VARIANTS {
        normalized = normalized.replace(variant, "hcmc");
    }

    let stripped: String = normalized
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | '-' | '_'))
        .collect();

    stripped
        .split_whitespace()
        .map(|word| {
            WORD_ABBREVIATIONS
                .iter()
                .find(|(full, _)| *full == word)
                .map(|(_, short)| *short)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two addresses plausibly name the same place.
///
/// Matches on equality, equality after normalization, containment of one
/// in the other, or more than half of the words (longer than two
/// characters) shared relative to the longer address.
pub fn addresses_match(first: &str, second: &str) -> bool {
    let a = first.trim().to_lowercase();
    let b = second.trim().to_lowercase();
    if a == b {
        return true;
    }

    let a = normalize_address(&a);
    let b = normalize_address(&b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b || a.contains(&b) || b.contains(&a) {
        return true;
    }

    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();

    let shared = words_a
        .iter()
        .filter(|w| w.chars().count() > 2 && words_b.contains(w))
        .count();
    let longest = words_a.len().max(words_b.len());
    shared as f64 / longest as f64 > 0.5
}
