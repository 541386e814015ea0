use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::retrieval::indexer::build_index;
use crate::retrieval::ranker::IndexedDocument;

type CachedIndex = Arc<Vec<IndexedDocument>>;

/// Process-wide per-root index cache with single-flight builds: for any
/// root, at most one directory walk runs no matter how many requests
/// arrive concurrently. Once built, an index is immutable and shared.
#[derive(Default)]
pub struct IndexCache {
    entries: DashMap<PathBuf, Arc<OnceCell<CachedIndex>>>,
    walks: AtomicUsize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the index for a root, building it on first use. Concurrent
    /// callers for the same uncached root share one in-flight build.
    pub async fn get_index(&self, root: &Path) -> CachedIndex {
        let cell = self
            .entries
            .entry(root.to_path_buf())
            .or_default()
            .clone();

        cell.get_or_init(|| async {
            self.walks.fetch_add(1, Ordering::Relaxed);
            Arc::new(build_index(root).await)
        })
        .await
        .clone()
    }

    /// Number of directory walks performed since process start.
    pub fn walk_count(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_requests_share_a_single_build() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "retry policy notes").unwrap();

        let cache = Arc::new(IndexCache::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let root = dir.path().to_path_buf();
            handles.push(tokio::spawn(async move { cache.get_index(&root).await }));
        }

        for handle in handles {
            let index = handle.await.unwrap();
            assert_eq!(index.len(), 1);
        }

        assert_eq!(cache.walk_count(), 1);
    }

    #[tokio::test]
    async fn distinct_roots_build_independently() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("a.md"), "alpha").unwrap();
        std::fs::write(b.path().join("b.md"), "beta").unwrap();

        let cache = IndexCache::new();
        let idx_a = cache.get_index(a.path()).await;
        let idx_b = cache.get_index(b.path()).await;

        assert_eq!(idx_a[0].identifier, "a.md");
        assert_eq!(idx_b[0].identifier, "b.md");
        assert_eq!(cache.walk_count(), 2);

        // Cached: no further walks
        cache.get_index(a.path()).await;
        assert_eq!(cache.walk_count(), 2);
    }
}
