use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub fs_agent: FsAgentSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Gemini API key; falls back to the GEMINI_API_KEY env var.
    #[serde(default)]
    pub gemini_api_key: String,

    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Skills tree: one subdirectory per skill, each with a SKILL.md.
    #[serde(default = "default_skills_root")]
    pub skills_root: String,

    #[serde(default = "default_enabled")]
    pub auto_local_context: bool,

    /// Candidate roots for auto local context; empty means "$HOME".
    #[serde(default)]
    pub local_context_roots: Vec<String>,

    /// Template roots prepended for workflow-automation queries; empty
    /// means the three conventional subdirectories of CWD.
    #[serde(default)]
    pub n8n_template_roots: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FsAgentSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub auto_approve_writes: bool,
}

fn default_skills_root() -> String {
    "./skills".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            skills_root: default_skills_root(),
            auto_local_context: default_enabled(),
            local_context_roots: Vec::new(),
            n8n_template_roots: Vec::new(),
        }
    }
}

/// Load config from file (or defaults), then apply env overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(path) = path {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).context("Failed to parse TOML config")?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            config.llm.gemini_api_key = key;
        }
    }
    if let Ok(value) = env::var("ENABLE_AUTO_LOCAL_CONTEXT") {
        config.retrieval.auto_local_context = value != "false";
    }
    if let Ok(raw) = env::var("LOCAL_CONTEXT_ROOTS") {
        let roots = split_paths(&raw);
        if !roots.is_empty() {
            config.retrieval.local_context_roots = roots;
        }
    }
    if let Ok(raw) = env::var("N8N_TEMPLATE_ROOTS") {
        let roots = split_paths(&raw);
        if !roots.is_empty() {
            config.retrieval.n8n_template_roots = roots;
        }
    }
    if let Ok(value) = env::var("ENABLE_LOCAL_FS_AGENT") {
        config.fs_agent.enabled = value == "true";
    }
    if let Ok(value) = env::var("AUTO_APPROVE_FS_WRITES") {
        config.fs_agent.auto_approve_writes = value == "true";
    }
}

fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Resolve a configured path: `~` expansion, then absolute or
/// CWD-relative.
pub fn resolve_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw).to_string();
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    }
}

/// Home directory, falling back to CWD.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
