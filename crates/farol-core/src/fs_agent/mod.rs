//! Chat-embedded filesystem command agent.
//!
//! Messages starting with `/` are intercepted before any retrieval or
//! generation. Read-only commands execute immediately; mutating commands
//! (`write`, `append`, `mkdir`) go through a pending-approval queue
//! unless auto-approval is enabled. Every failure is reported as text in
//! the command output; the command channel never fails the request.

pub mod pending;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::text::truncate_chars;
use pending::{ActionKind, PendingAction, PendingStore};

/// Read output cap in characters.
const MAX_READ_CHARS: usize = 20_000;
/// Directory listing cap in entries.
const MAX_LIST_ENTRIES: usize = 300;
/// Characters of queued content shown in the approval prompt.
const PREVIEW_CHARS: usize = 180;

#[derive(Debug, Clone, Default)]
pub struct FsAgentConfig {
    /// Feature flag: when off, any `/` command gets a fixed explanation.
    pub enabled: bool,
    /// When on, mutating commands skip the approval queue.
    pub auto_approve_writes: bool,
}

pub struct FsAgent {
    config: FsAgentConfig,
    pending: Arc<PendingStore>,
}

impl FsAgent {
    pub fn new(config: FsAgentConfig) -> Self {
        Self {
            config,
            pending: Arc::new(PendingStore::default()),
        }
    }

    /// Handle a chat message if it is a `/` command. Returns `None` for
    /// ordinary messages; `Some(output)` when the message was consumed.
    pub async fn handle(&self, message: &str) -> Option<String> {
        let trimmed = message.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        if !self.config.enabled {
            return Some(
                "Local filesystem agent is disabled. Enable it in the config \
                 (or set ENABLE_LOCAL_FS_AGENT=true) and restart the server."
                    .to_string(),
            );
        }

        let mut lines = trimmed.splitn(2, '\n');
        let first_line = lines.next().unwrap_or_default();
        let payload = lines.next().unwrap_or_default().to_string();

        let parts: Vec<&str> = first_line.split_whitespace().collect();
        // Legacy `/fs <command> <path>` is equivalent to `/<command> <path>`
        let legacy = parts.first() == Some(&"/fs");
        let command = if legacy {
            parts.get(1).copied().unwrap_or_default()
        } else {
            parts
                .first()
                .map(|p| p.trim_start_matches('/'))
                .unwrap_or_default()
        };
        let arg_start = if legacy { 2 } else { 1 };
        let argument = parts.get(arg_start..).unwrap_or_default().join(" ");
        let argument = argument.trim().to_string();

        info!(command, "Handling filesystem command");

        let result = match command {
            "ls" => {
                let path = if argument.is_empty() { "." } else { &argument };
                cmd_ls(path).await
            }
            "read" => cmd_read(&argument).await,
            "stat" => cmd_stat(&argument).await,
            "write" => self.queue_or_run(ActionKind::Write, &argument, Some(payload)).await,
            "append" => self.queue_or_run(ActionKind::Append, &argument, Some(payload)).await,
            "mkdir" => self.queue_or_run(ActionKind::Mkdir, &argument, None).await,
            "pending" => Ok(self.list_pending()),
            "approve" => self.approve(&argument).await,
            "reject" => Ok(self.reject(&argument)),
            _ => Ok(help_text()),
        };

        Some(result.unwrap_or_else(|e| {
            warn!(command, error = %e, "Filesystem command failed");
            format!("Filesystem error: {e}")
        }))
    }

    async fn queue_or_run(
        &self,
        kind: ActionKind,
        target_path: &str,
        content: Option<String>,
    ) -> Result<String> {
        // Validate the path before queueing so a bad request fails fast
        resolve_user_path(target_path)?;

        if self.config.auto_approve_writes {
            return execute_mutation(kind, target_path, content.as_deref()).await;
        }

        let action = self
            .pending
            .queue(kind, target_path.to_string(), content);
        Ok(format!(
            "Authorization required before filesystem change.\n{}",
            describe_pending(&action)
        ))
    }

    async fn approve(&self, id: &str) -> Result<String> {
        match self.pending.take(id) {
            Some(action) => {
                execute_mutation(action.kind, &action.target_path, action.content.as_deref()).await
            }
            None => Ok(format!("No pending action found for id: {id}")),
        }
    }

    fn reject(&self, id: &str) -> String {
        match self.pending.take(id) {
            Some(action) => format!("Rejected action {}.", action.id),
            None => format!("No pending action found for id: {id}"),
        }
    }

    fn list_pending(&self) -> String {
        let actions = self.pending.list();
        if actions.is_empty() {
            return "No pending actions.".to_string();
        }
        actions
            .iter()
            .map(|a| format!("{} | {} | {}", a.id, a.kind, a.target_path))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolve a user-supplied path: `~` expands to the home directory,
/// absolute paths pass through, relative paths resolve against CWD.
fn resolve_user_path(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Path is required.");
    }

    let expanded = shellexpand::tilde(trimmed);
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Cannot resolve working directory")?;
        Ok(cwd.join(path))
    }
}

async fn execute_mutation(kind: ActionKind, target_path: &str, content: Option<&str>) -> Result<String> {
    match kind {
        ActionKind::Mkdir => cmd_mkdir(target_path).await,
        ActionKind::Write => cmd_write(target_path, content.unwrap_or_default(), false).await,
        ActionKind::Append => cmd_write(target_path, content.unwrap_or_default(), true).await,
    }
}

async fn cmd_ls(target_path: &str) -> Result<String> {
    let resolved = resolve_user_path(target_path)?;
    let mut entries = tokio::fs::read_dir(&resolved)
        .await
        .context(format!("Cannot list directory: {}", resolved.display()))?;

    let mut lines = Vec::new();
    let mut total = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        total += 1;
        if lines.len() >= MAX_LIST_ENTRIES {
            continue;
        }
        let is_dir = entry
            .file_type()
            .await
            .map(|ft| ft.is_dir())
            .unwrap_or(false);
        let marker = if is_dir { "dir " } else { "file" };
        lines.push(format!("{} {}", marker, entry.file_name().to_string_lossy()));
    }

    let listing = if lines.is_empty() {
        "(empty directory)".to_string()
    } else {
        lines.join("\n")
    };
    let truncated = if total > MAX_LIST_ENTRIES { "\n...truncated" } else { "" };

    Ok(format!("Path: {}\n{}{}", resolved.display(), listing, truncated))
}

async fn cmd_read(target_path: &str) -> Result<String> {
    let resolved = resolve_user_path(target_path)?;
    let content = tokio::fs::read_to_string(&resolved)
        .await
        .context(format!("Cannot read file: {}", resolved.display()))?;

    let sliced = truncate_chars(&content, MAX_READ_CHARS);
    let truncated = if sliced.len() < content.len() { "\n\n...truncated" } else { "" };

    Ok(format!("Path: {}\n\n{}{}", resolved.display(), sliced, truncated))
}

async fn cmd_stat(target_path: &str) -> Result<String> {
    let resolved = resolve_user_path(target_path)?;
    let meta = tokio::fs::metadata(&resolved)
        .await
        .context(format!("Cannot stat: {}", resolved.display()))?;

    let modified = meta
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());

    Ok([
        format!("Path: {}", resolved.display()),
        format!("Type: {}", if meta.is_dir() { "directory" } else { "file" }),
        format!("Size: {} bytes", meta.len()),
        format!("Modified: {}", modified),
    ]
    .join("\n"))
}

async fn cmd_write(target_path: &str, content: &str, append: bool) -> Result<String> {
    let resolved = resolve_user_path(target_path)?;
    if let Some(parent) = resolved.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context(format!("Cannot create parent directories: {}", parent.display()))?;
    }

    let chars = content.chars().count();
    if append {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&resolved)
            .await
            .context(format!("Cannot open for append: {}", resolved.display()))?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(format!("Appended to: {} ({} chars)", resolved.display(), chars))
    } else {
        tokio::fs::write(&resolved, content)
            .await
            .context(format!("Cannot write file: {}", resolved.display()))?;
        Ok(format!("Wrote file: {} ({} chars)", resolved.display(), chars))
    }
}

async fn cmd_mkdir(target_path: &str) -> Result<String> {
    let resolved = resolve_user_path(target_path)?;
    tokio::fs::create_dir_all(&resolved)
        .await
        .context(format!("Cannot create directory: {}", resolved.display()))?;
    Ok(format!("Directory ensured: {}", resolved.display()))
}

fn describe_pending(action: &PendingAction) -> String {
    let mut lines = vec![
        format!("Pending action id: {}", action.id),
        format!("Action: {}", action.kind),
        format!("Target: {}", action.target_path),
    ];
    if let Some(content) = &action.content {
        if !content.is_empty() {
            lines.push(format!("Preview: {}", truncate_chars(content, PREVIEW_CHARS)));
        }
    }
    lines.push(format!("Approve with: /approve {}", action.id));
    lines.push(format!("Reject with: /reject {}", action.id));
    lines.join("\n")
}

fn help_text() -> String {
    [
        "Filesystem commands:",
        "/ls <path>",
        "/read <path>",
        "/stat <path>",
        "/mkdir <path> (asks for authorization)",
        "/write <path> then content on next lines (asks for authorization)",
        "/append <path> then content on next lines (asks for authorization)",
        "/pending",
        "/approve <action-id>",
        "/reject <action-id>",
        "/helpfs",
        "",
        "Legacy format still works: /fs <command> ...",
    ]
    .join("\n")
}
