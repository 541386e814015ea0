use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::retrieval::ranker::IndexedDocument;
use crate::text::{normalize, truncate_chars};

/// Walk depth bound. Deeper subtrees are not enumerated.
const MAX_DEPTH: usize = 5;
/// Enumeration stops once this many candidate files were collected, so a
/// very large tree yields an incomplete sample.
const MAX_FILES_PER_ROOT: usize = 600;
/// Files above this size are skipped to bound memory.
const MAX_FILE_SIZE: u64 = 120_000;
/// Stored excerpt length in characters.
const EXCERPT_CHARS: usize = 2000;

/// Directories pruned from the walk: version control, dependency and
/// build output trees.
fn is_pruned(name: &str) -> bool {
    name.starts_with(".git")
        || name == "node_modules"
        || name == ".next"
        || name == "dist"
        || name == "build"
}

/// Extension allow-list for text-like formats.
fn is_text_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    matches!(
        ext.as_str(),
        "json" | "md" | "txt" | "yaml" | "yml" | "js" | "ts" | "tsx" | "jsx" | "sql" | "sh"
            | "env" | "py" | "go" | "java" | "rb"
    )
}

fn walk<'a>(dir: &'a Path, depth: usize, out: &'a mut Vec<PathBuf>) -> BoxFuture<'a, ()> {
    async move {
        if depth > MAX_DEPTH || out.len() >= MAX_FILES_PER_ROOT {
            return;
        }

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            // Unreadable subtree: skip, never abort the walk
            Err(_) => return,
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            if out.len() >= MAX_FILES_PER_ROOT {
                break;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if is_pruned(&name) {
                continue;
            }

            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                walk(&path, depth + 1, out).await;
            } else if file_type.is_file() && is_text_file(&path) {
                out.push(path);
            }
        }
    }
    .boxed()
}

/// Build the searchable index for one root. Individual file errors
/// (permissions, races) skip that file; the walk itself never fails.
pub async fn build_index(root: &Path) -> Vec<IndexedDocument> {
    let mut files = Vec::new();
    walk(root, 0, &mut files).await;

    let mut indexed = Vec::with_capacity(files.len());
    for path in files {
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        if meta.len() > MAX_FILE_SIZE {
            continue;
        }

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(_) => continue,
        };

        let excerpt = truncate_chars(&raw, EXCERPT_CHARS).to_string();
        let rel = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();

        indexed.push(IndexedDocument {
            searchable: format!("{} {}", normalize(&rel), normalize(&excerpt)),
            identifier: rel,
            excerpt,
        });
    }

    debug!(root = %root.display(), documents = indexed.len(), "Built lexical index");
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn indexes_text_files_with_relative_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "webhook setup guide").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/flow.json"), "{\"trigger\": \"cron\"}").unwrap();

        let mut docs = build_index(dir.path()).await;
        docs.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].identifier, "notes.md");
        assert_eq!(docs[1].identifier, "sub/flow.json");
        assert!(docs[0].searchable.contains("webhook"));
    }

    #[tokio::test]
    async fn skips_binaries_pruned_dirs_and_large_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(dir.path().join("big.md"), "x".repeat(200_000)).unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/pkg.json"), "{}").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config.txt"), "ignored").unwrap();
        fs::write(dir.path().join("kept.txt"), "small file").unwrap();

        let docs = build_index(dir.path()).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].identifier, "kept.txt");
    }

    #[tokio::test]
    async fn depth_bound_prunes_deep_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        let mut deep = dir.path().to_path_buf();
        for level in 0..8 {
            deep = deep.join(format!("d{level}"));
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("too-deep.md"), "invisible").unwrap();
        fs::write(dir.path().join("shallow.md"), "visible").unwrap();

        let docs = build_index(dir.path()).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].identifier, "shallow.md");
    }

    #[tokio::test]
    async fn excerpt_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("long.md"), "a".repeat(50_000)).unwrap();

        let docs = build_index(dir.path()).await;
        assert_eq!(docs[0].excerpt.chars().count(), 2000);
    }

    #[tokio::test]
    async fn missing_root_yields_empty_index() {
        let docs = build_index(Path::new("/definitely/not/a/real/root")).await;
        assert!(docs.is_empty());
    }
}
