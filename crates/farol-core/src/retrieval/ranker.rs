use regex::Regex;
use serde::Serialize;

use crate::text::normalize;

/// One searchable document: a relative path or skill name, a bounded
/// excerpt for display, and the pre-normalized blob scoring runs over.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub identifier: String,
    pub excerpt: String,
    pub searchable: String,
}

/// A scored hit. Only documents with score > 0 are ever returned.
#[derive(Debug, Clone, Serialize)]
pub struct RelevanceMatch {
    pub identifier: String,
    pub score: u32,
    pub excerpt: String,
}

/// Stop words dropped during tokenization (English + Portuguese).
const STOP_WORDS: &[&str] = &[
    "and", "are", "com", "como", "das", "dos", "for", "from", "how", "para", "sobre", "that",
    "the", "this", "uma", "was", "what", "with", "you",
];

/// Tokenize a query: normalize, split on whitespace, drop short tokens
/// and stop words, dedupe preserving first-seen order.
pub fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in normalize(query).split_whitespace() {
        if word.chars().count() <= 2 || STOP_WORDS.contains(&word) {
            continue;
        }
        if !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

/// Score a single document: whole-word occurrences of each token in the
/// searchable blob, plus `name_bonus` per token appearing as a substring
/// of the normalized identifier.
fn score_document(doc: &IndexedDocument, matchers: &[TokenMatcher], name_bonus: u32) -> u32 {
    let name = normalize(&doc.identifier);
    let mut score = 0u32;

    for matcher in matchers {
        if let Some(re) = &matcher.word_re {
            score += re.find_iter(&doc.searchable).count() as u32;
        }
        if name.contains(matcher.token.as_str()) {
            score += name_bonus;
        }
    }

    score
}

/// One query token with its whole-word pattern, compiled once per query
/// rather than once per (document, token) pair.
struct TokenMatcher {
    token: String,
    word_re: Option<Regex>,
}

fn compile_matchers(tokens: &[String]) -> Vec<TokenMatcher> {
    tokens
        .iter()
        .map(|token| TokenMatcher {
            token: token.clone(),
            word_re: Regex::new(&format!(r"\b{}\b", regex::escape(token))).ok(),
        })
        .collect()
}

/// Rank documents against a token set. Zero tokens means zero matches,
/// never "match everything". Ties keep original enumeration order.
pub fn rank(
    tokens: &[String],
    documents: &[IndexedDocument],
    name_bonus: u32,
    limit: usize,
) -> Vec<RelevanceMatch> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let matchers = compile_matchers(tokens);
    let mut matches: Vec<RelevanceMatch> = documents
        .iter()
        .filter_map(|doc| {
            let score = score_document(doc, &matchers, name_bonus);
            (score > 0).then(|| RelevanceMatch {
                identifier: doc.identifier.clone(),
                score,
                excerpt: doc.excerpt.clone(),
            })
        })
        .collect();

    // sort_by is stable: equal scores preserve enumeration order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(limit);
    matches
}
