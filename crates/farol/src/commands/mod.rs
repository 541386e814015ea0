pub mod chat;
pub mod init;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use farol_core::{
    ChatOrchestrator, FsAgent, FsAgentConfig, GeminiClient, GenerationProvider, IndexCache,
    LocalContextConfig, LocalContextRetriever, PhraseListClassifier, SkillsRetriever,
};

use crate::config::{home_dir, resolve_path, Config};

const DEFAULT_TEMPLATE_ROOTS: &[&str] = &[
    "./n8n-workflows",
    "./awesome-n8n-templates",
    "./n8n-free-templates",
];

/// Wire the full pipeline from config. No provider when the key is
/// absent; the orchestrator surfaces that as a credential error.
pub fn build_orchestrator(config: &Config) -> Result<ChatOrchestrator> {
    let skills = Arc::new(SkillsRetriever::new(resolve_path(
        &config.retrieval.skills_root,
    )));

    let roots: Vec<PathBuf> = if config.retrieval.local_context_roots.is_empty() {
        vec![home_dir()]
    } else {
        config
            .retrieval
            .local_context_roots
            .iter()
            .map(|r| resolve_path(r))
            .collect()
    };

    let template_roots: Vec<PathBuf> = if config.retrieval.n8n_template_roots.is_empty() {
        DEFAULT_TEMPLATE_ROOTS.iter().map(|r| resolve_path(r)).collect()
    } else {
        config
            .retrieval
            .n8n_template_roots
            .iter()
            .map(|r| resolve_path(r))
            .collect()
    };

    let local_context = Arc::new(LocalContextRetriever::new(
        LocalContextConfig {
            enabled: config.retrieval.auto_local_context,
            roots,
            template_roots,
        },
        Arc::new(IndexCache::new()),
    ));

    let fs_agent = Arc::new(FsAgent::new(FsAgentConfig {
        enabled: config.fs_agent.enabled,
        auto_approve_writes: config.fs_agent.auto_approve_writes,
    }));

    let provider: Option<Arc<dyn GenerationProvider>> =
        if config.llm.gemini_api_key.trim().is_empty() {
            None
        } else {
            let mut client = GeminiClient::new(&config.llm.gemini_api_key);
            if !config.llm.model.is_empty() {
                client = client.with_model(&config.llm.model);
            }
            Some(Arc::new(client))
        };

    Ok(ChatOrchestrator::new(
        skills,
        local_context,
        fs_agent,
        provider,
        Arc::new(PhraseListClassifier::default()),
    ))
}
