use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::retrieval::cache::IndexCache;
use crate::retrieval::ranker::{rank, tokenize, RelevanceMatch};
use crate::text::normalize;

/// Source tag reported for automatically discovered local context.
pub const LOCAL_CONTEXT_SOURCE: &str = "local-auto-context";

/// Matches per winning root.
const MAX_MATCHES: usize = 5;
/// Name-match bonus for local files.
const NAME_BONUS: u32 = 5;

/// Query keywords that pull the domain template roots in, ahead of the
/// configured base roots.
const DOMAIN_KEYWORDS: &[&str] = &["n8n", "workflow", "webhook", "trigger", "cron", "node"];

/// The single best local-context hit across all candidate roots.
#[derive(Debug, Clone)]
pub struct LocalContextResult {
    pub source: String,
    pub root_path: PathBuf,
    pub matches: Vec<RelevanceMatch>,
    pub context: String,
}

#[derive(Debug, Clone)]
pub struct LocalContextConfig {
    /// Feature flag: when false the retriever always returns `None`.
    pub enabled: bool,
    /// Base candidate roots, highest priority last (defaults to `$HOME`).
    pub roots: Vec<PathBuf>,
    /// Domain template roots, prepended only for domain queries.
    pub template_roots: Vec<PathBuf>,
}

/// Scans configured directory roots for files lexically relevant to a
/// query and keeps the root with the strictly highest top-match score.
pub struct LocalContextRetriever {
    config: LocalContextConfig,
    cache: Arc<IndexCache>,
}

impl LocalContextRetriever {
    pub fn new(config: LocalContextConfig, cache: Arc<IndexCache>) -> Self {
        Self { config, cache }
    }

    fn is_domain_query(query: &str) -> bool {
        let q = normalize(query);
        DOMAIN_KEYWORDS.iter().any(|k| q.contains(k))
    }

    /// Candidate roots in priority order, deduplicated.
    fn candidate_roots(&self, query: &str) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        if Self::is_domain_query(query) {
            for root in &self.config.template_roots {
                if !roots.contains(root) {
                    roots.push(root.clone());
                }
            }
        }
        for root in &self.config.roots {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }
        roots
    }

    pub async fn find_auto_local_context(&self, query: &str) -> Option<LocalContextResult> {
        if !self.config.enabled {
            return None;
        }

        let tokens = tokenize(query);
        if tokens.is_empty() {
            // Never scan the filesystem for a context-free query
            return None;
        }

        let mut best: Option<LocalContextResult> = None;

        for root in self.candidate_roots(query) {
            // Invalid roots are skipped, not propagated
            match tokio::fs::metadata(&root).await {
                Ok(meta) if meta.is_dir() => {}
                _ => continue,
            }

            let index = self.cache.get_index(&root).await;
            let matches = rank(&tokens, &index, NAME_BONUS, MAX_MATCHES);
            if matches.is_empty() {
                continue;
            }

            let candidate_score = matches[0].score;
            let best_score = best.as_ref().map(|b| b.matches[0].score).unwrap_or(0);
            // Strictly higher wins; first-seen (priority order) wins ties
            if candidate_score > best_score {
                debug!(root = %root.display(), score = candidate_score, "New best local-context root");
                best = Some(LocalContextResult {
                    source: LOCAL_CONTEXT_SOURCE.to_string(),
                    context: build_local_context(LOCAL_CONTEXT_SOURCE, &matches),
                    root_path: root,
                    matches,
                });
            }
        }

        if let Some(ref result) = best {
            info!(
                root = %result.root_path.display(),
                matches = result.matches.len(),
                "Auto local context selected"
            );
        }
        best
    }
}

fn build_local_context(source: &str, matches: &[RelevanceMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(idx, m)| format!("{} Match {}: {}\n---\n{}", source, idx + 1, m.identifier, m.excerpt))
        .collect::<Vec<_>>()
        .join("\n\n")
}
