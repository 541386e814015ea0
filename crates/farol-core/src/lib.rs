pub mod denial;
pub mod expert;
pub mod fs_agent;
pub mod llm;
pub mod modes;
pub mod orchestrator;
pub mod retrieval;
pub mod text;

pub use denial::{DenialClassifier, PhraseListClassifier};
pub use expert::{is_n8n_enterprise_request, n8n_enterprise_guidelines, N8N_MODE_SOURCE};
pub use fs_agent::{FsAgent, FsAgentConfig};
pub use llm::{ChatPrompt, GeminiClient, GenerationProvider};
pub use modes::ChatMode;
pub use orchestrator::{
    sanitize_history, ChatError, ChatOrchestrator, ChatReply, ChatRequest, HistoryItem, Role,
    FS_AGENT_SOURCE, MAX_HISTORY,
};
pub use retrieval::{
    build_skills_context, IndexCache, IndexedDocument, LocalContextConfig, LocalContextResult,
    LocalContextRetriever, RelevanceMatch, SkillsRetriever, LOCAL_CONTEXT_SOURCE,
};

/// Initialize structured JSON logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
