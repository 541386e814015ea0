//! Detection of model answers that refuse local filesystem access.
//!
//! String-pattern matching over natural language is fragile, so the
//! classifier sits behind a trait: the phrase list can be swapped or
//! extended without touching orchestration logic.

use crate::text::normalize_for_match;

/// Classifies whether a generated answer reads as a refusal to use the
/// local context it was given.
pub trait DenialClassifier: Send + Sync {
    fn is_denial(&self, text: &str) -> bool;
}

/// Default classifier: accent- and case-insensitive substring match
/// against a fixed multi-language phrase list.
pub struct PhraseListClassifier {
    phrases: Vec<String>,
}

const DEFAULT_PHRASES: &[&str] = &[
    "nao consigo acessar",
    "nao posso acessar",
    "nao inclui nada que me permita acessar",
    "nao me permite acessar",
    "minha capacidade de interacao e restrita",
    "sistema de arquivos local",
    "copiar e colar",
    "copy and paste",
    "cannot access",
    "can't access",
    "unable to access",
    "restricted to text",
];

impl Default for PhraseListClassifier {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PhraseListClassifier {
    pub fn with_phrases(phrases: Vec<String>) -> Self {
        Self { phrases }
    }
}

impl DenialClassifier for PhraseListClassifier {
    fn is_denial(&self, text: &str) -> bool {
        let folded = normalize_for_match(text);
        self.phrases.iter().any(|p| folded.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_english_denials() {
        let c = PhraseListClassifier::default();
        assert!(c.is_denial("I cannot access the local file system."));
        assert!(c.is_denial("I'm unable to access your files."));
    }

    #[test]
    fn matches_portuguese_denials_accent_insensitively() {
        let c = PhraseListClassifier::default();
        assert!(c.is_denial("Não consigo acessar seus arquivos."));
        assert!(c.is_denial("NÃO POSSO ACESSAR o diretório."));
    }

    #[test]
    fn ordinary_answers_pass() {
        let c = PhraseListClassifier::default();
        assert!(!c.is_denial("Here is the workflow you asked for."));
    }

    #[test]
    fn custom_phrase_lists_are_honored() {
        let c = PhraseListClassifier::with_phrases(vec!["no can do".into()]);
        assert!(c.is_denial("Sorry, NO CAN DO."));
        assert!(!c.is_denial("I cannot access the file system."));
    }
}
