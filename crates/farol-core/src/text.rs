//! Text normalization shared by the ranker and the denial classifier.
//!
//! Queries, document blobs, and identifiers all go through the same
//! normalization so that scoring is case- and accent-insensitive for
//! Latin-script text (the corpus mixes English and Portuguese).

/// Fold common Latin diacritics to their ASCII base letter.
/// Characters outside the fold table pass through unchanged.
pub fn fold_diacritics(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

/// Lowercase and fold diacritics without touching structure.
/// Used for substring matching (denial phrases, keyword heuristics).
pub fn normalize_for_match(input: &str) -> String {
    input
        .chars()
        .flat_map(|c| c.to_lowercase())
        .map(fold_diacritics)
        .collect()
}

/// Normalize text into a searchable blob: lowercase, diacritics folded,
/// everything outside `[a-z0-9 ./_-]` collapsed to single spaces.
/// Path separators, dot, hyphen, and underscore survive so that file
/// identifiers stay matchable as whole words.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_space = true;
    for c in input.chars().flat_map(|c| c.to_lowercase()).map(fold_diacritics) {
        let keep = c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '_' | '-');
        if keep {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(input: &str, max: usize) -> &str {
    match input.char_indices().nth(max) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
