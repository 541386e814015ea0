use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::retrieval::ranker::{rank, tokenize, IndexedDocument, RelevanceMatch};
use crate::text::{normalize, truncate_chars};

/// Manifest file each skill directory must contain.
const SKILL_MANIFEST: &str = "SKILL.md";
/// Top-K skills returned per query.
const MAX_SKILLS: usize = 4;
/// Characters of manifest text that participate in scoring.
const SEARCHABLE_CHARS: usize = 6000;
/// Characters of manifest text rendered into the prompt.
const EXCERPT_CHARS: usize = 1400;
/// Name-match bonus for skills (filename relevance beats body relevance).
const NAME_BONUS: u32 = 3;

/// Retrieves "skills": one document per immediate subdirectory of a
/// fixed root, sourced from that directory's `SKILL.md`. The skill set
/// is loaded once per process, single-flight.
pub struct SkillsRetriever {
    root: PathBuf,
    cache: OnceCell<Arc<Vec<IndexedDocument>>>,
}

impl SkillsRetriever {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: OnceCell::new(),
        }
    }

    async fn load_skills(&self) -> Arc<Vec<IndexedDocument>> {
        self.cache
            .get_or_init(|| async {
                let mut docs = Vec::new();

                let mut entries = match tokio::fs::read_dir(&self.root).await {
                    Ok(entries) => entries,
                    Err(_) => return Arc::new(docs),
                };

                while let Ok(Some(entry)) = entries.next_entry().await {
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|ft| ft.is_dir())
                        .unwrap_or(false);
                    if !is_dir {
                        continue;
                    }

                    let name = entry.file_name().to_string_lossy().to_string();
                    let manifest = entry.path().join(SKILL_MANIFEST);
                    // Directories without a manifest are skipped, not errors
                    let content = match tokio::fs::read_to_string(&manifest).await {
                        Ok(content) => content,
                        Err(_) => continue,
                    };

                    let body = truncate_chars(&content, SEARCHABLE_CHARS);
                    docs.push(IndexedDocument {
                        searchable: format!("{} {}", normalize(&name), normalize(body)),
                        excerpt: truncate_chars(body, EXCERPT_CHARS).to_string(),
                        identifier: name,
                    });
                }

                debug!(root = %self.root.display(), skills = docs.len(), "Loaded skill documents");
                Arc::new(docs)
            })
            .await
            .clone()
    }

    /// Top skills for a query, by token overlap with a name bonus.
    pub async fn find_relevant_skills(&self, query: &str) -> Vec<RelevanceMatch> {
        let docs = self.load_skills().await;
        let tokens = tokenize(query);
        rank(&tokens, &docs, NAME_BONUS, MAX_SKILLS)
    }
}

/// Render matched skills into a prompt block. Empty matches produce a
/// fixed sentinel instead of an empty string.
pub fn build_skills_context(matches: &[RelevanceMatch]) -> String {
    if matches.is_empty() {
        return "No relevant local skills were matched for this request.".to_string();
    }

    matches
        .iter()
        .enumerate()
        .map(|(idx, m)| format!("Skill {}: {}\n---\n{}", idx + 1, m.identifier, m.excerpt))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn skills_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("webhook-design", "How to design webhook endpoints with retries."),
            ("sql-tuning", "Index tuning and query plans for Postgres."),
        ] {
            let skill_dir = dir.path().join(name);
            fs::create_dir(&skill_dir).unwrap();
            fs::write(skill_dir.join("SKILL.md"), body).unwrap();
        }
        // No manifest: must be skipped silently
        fs::create_dir(dir.path().join("empty-skill")).unwrap();
        dir
    }

    #[tokio::test]
    async fn finds_skills_by_token_overlap() {
        let dir = skills_fixture();
        let retriever = SkillsRetriever::new(dir.path().to_path_buf());

        let matches = retriever.find_relevant_skills("design a webhook").await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].identifier, "webhook-design");
        assert!(matches[0].score >= NAME_BONUS);
    }

    #[tokio::test]
    async fn unmatched_query_returns_nothing() {
        let dir = skills_fixture();
        let retriever = SkillsRetriever::new(dir.path().to_path_buf());
        assert!(retriever.find_relevant_skills("kubernetes ingress").await.is_empty());
    }

    #[tokio::test]
    async fn missing_root_is_not_an_error() {
        let retriever = SkillsRetriever::new(PathBuf::from("/no/such/skills/root"));
        assert!(retriever.find_relevant_skills("webhook").await.is_empty());
    }

    #[test]
    fn context_renders_sentinel_when_empty() {
        assert_eq!(
            build_skills_context(&[]),
            "No relevant local skills were matched for this request."
        );
    }

    #[test]
    fn context_renders_labeled_blocks() {
        let matches = vec![
            RelevanceMatch {
                identifier: "webhook-design".into(),
                score: 4,
                excerpt: "How to design webhooks.".into(),
            },
            RelevanceMatch {
                identifier: "sql-tuning".into(),
                score: 1,
                excerpt: "Index tuning.".into(),
            },
        ];
        let context = build_skills_context(&matches);
        assert!(context.starts_with("Skill 1: webhook-design\n---\n"));
        assert!(context.contains("\n\nSkill 2: sql-tuning\n---\n"));
    }
}
