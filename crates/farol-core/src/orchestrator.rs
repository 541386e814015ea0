//! Per-request chat orchestration: command interception, retrieval,
//! prompt assembly, generation, and answer post-processing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::denial::DenialClassifier;
use crate::expert::{is_n8n_enterprise_request, n8n_enterprise_guidelines, N8N_MODE_SOURCE};
use crate::fs_agent::FsAgent;
use crate::llm::{ChatPrompt, GenerationProvider};
use crate::modes::ChatMode;
use crate::retrieval::{build_skills_context, LocalContextResult, LocalContextRetriever, SkillsRetriever};

/// Source tag reported when a request was consumed by the fs agent.
pub const FS_AGENT_SOURCE: &str = "local-filesystem-agent";

/// Returned when the model produces no usable text (soft-fail).
const EMPTY_ANSWER_FALLBACK: &str =
    "Não consegui gerar uma resposta agora. Tente novamente em instantes.";

/// History window supplied by the caller each request.
pub const MAX_HISTORY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub role: Role,
    pub content: String,
}

/// Drop blank entries, trim content, keep the last [`MAX_HISTORY`].
pub fn sanitize_history(history: Vec<HistoryItem>) -> Vec<HistoryItem> {
    let mut items: Vec<HistoryItem> = history
        .into_iter()
        .filter_map(|item| {
            let content = item.content.trim().to_string();
            (!content.is_empty()).then_some(HistoryItem {
                role: item.role,
                content,
            })
        })
        .collect();
    if items.len() > MAX_HISTORY {
        items.drain(..items.len() - MAX_HISTORY);
    }
    items
}

fn build_history_block(history: &[HistoryItem]) -> String {
    if history.is_empty() {
        return "No prior conversation history.".to_string();
    }
    history
        .iter()
        .map(|item| {
            let role = match item.role {
                Role::User => "USER",
                Role::Assistant => "ASSISTANT",
            };
            format!("{}: {}", role, item.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryItem>,
    pub mode: ChatMode,
}

/// Terminal outcome of one request: the full answer plus every
/// context/mode source that contributed. Never empty sources.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub sources: Vec<String>,
    pub answer: String,
}

/// Request-level failures the transport maps to client vs server errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is required.")]
    EmptyMessage,
    #[error("Generation credential is missing in server environment.")]
    MissingCredential,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Composition root for one process: owns the retrievers, the command
/// agent, the generation provider, and the denial classifier.
pub struct ChatOrchestrator {
    skills: Arc<SkillsRetriever>,
    local_context: Arc<LocalContextRetriever>,
    fs_agent: Arc<FsAgent>,
    provider: Option<Arc<dyn GenerationProvider>>,
    denial: Arc<dyn DenialClassifier>,
}

impl ChatOrchestrator {
    pub fn new(
        skills: Arc<SkillsRetriever>,
        local_context: Arc<LocalContextRetriever>,
        fs_agent: Arc<FsAgent>,
        provider: Option<Arc<dyn GenerationProvider>>,
        denial: Arc<dyn DenialClassifier>,
    ) -> Self {
        Self {
            skills,
            local_context,
            fs_agent,
            provider,
            denial,
        }
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        // Command interception short-circuits retrieval and generation
        if let Some(output) = self.fs_agent.handle(message).await {
            return Ok(ChatReply {
                sources: vec![FS_AGENT_SOURCE.to_string()],
                answer: output,
            });
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or(ChatError::MissingCredential)?;

        // Both retrievers are read-only and independent
        let (skill_matches, local) = tokio::join!(
            self.skills.find_relevant_skills(message),
            self.local_context.find_auto_local_context(message),
        );

        let mut skills_context = build_skills_context(&skill_matches);
        if let Some(ref ctx) = local {
            skills_context.push_str(&format!(
                "\n\nAutomatic local context ({}):\n{}",
                ctx.source, ctx.context
            ));
        }

        let mode = request.mode;
        let n8n_expert_mode = mode == ChatMode::N8n || is_n8n_enterprise_request(message);

        let prompt = ChatPrompt {
            message: message.to_string(),
            skills_context,
            history_context: build_history_block(&request.history),
            mode,
            n8n_expert_mode,
            n8n_guidelines: if n8n_expert_mode {
                n8n_enterprise_guidelines().to_string()
            } else {
                "N/A".to_string()
            },
        };

        info!(
            mode = %mode,
            skills = skill_matches.len(),
            local_context = local.is_some(),
            n8n_expert_mode,
            "Generating chat answer"
        );

        let raw_answer = provider.generate(&prompt).await.map_err(|e| {
            warn!(error = %e, "Generation failed");
            ChatError::Internal(e)
        })?;
        let raw_answer = if raw_answer.trim().is_empty() {
            EMPTY_ANSWER_FALLBACK.to_string()
        } else {
            raw_answer
        };

        let answer = self.post_process(raw_answer, local.as_ref());

        let mut sources: Vec<String> =
            skill_matches.iter().map(|s| s.identifier.clone()).collect();
        if let Some(ref ctx) = local {
            sources.push(ctx.source.clone());
        }
        if n8n_expert_mode {
            sources.push(N8N_MODE_SOURCE.to_string());
        }
        sources.push(format!("mode:{mode}"));

        Ok(ChatReply { sources, answer })
    }

    /// When local context was found, prepend a deterministic summary of
    /// the discovered root; if the model denied having local access,
    /// the summary replaces the denial outright.
    fn post_process(&self, answer: String, local: Option<&LocalContextResult>) -> String {
        let Some(ctx) = local else {
            return answer;
        };

        let files: Vec<&str> = ctx.matches.iter().map(|m| m.identifier.as_str()).collect();
        let prefix = build_local_context_summary(&ctx.root_path.display().to_string(), &files);

        if self.denial.is_denial(&answer) {
            warn!(root = %ctx.root_path.display(), "Model denied local access; substituting context summary");
            prefix
        } else {
            format!("{prefix}\n\n{answer}")
        }
    }
}

fn build_local_context_summary(root_path: &str, files: &[&str]) -> String {
    let file_list = if files.is_empty() {
        "- (nenhum arquivo ranqueado)".to_string()
    } else {
        files
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    [
        format!("Encontrei contexto local automaticamente em: {root_path}."),
        "Arquivos mais relevantes detectados:".to_string(),
        file_list,
        String::new(),
        "Pode pedir a próxima ação direto (ex: explicar, gerar workflow, refatorar, comparar).".to_string(),
        "Se quiser alterar arquivo local, use os comandos: /write, /append, /mkdir e aprove com /approve <id>.".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denial::PhraseListClassifier;
    use crate::fs_agent::FsAgentConfig;
    use crate::retrieval::{IndexCache, LocalContextConfig};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct MockProvider {
        answer: String,
        prompts: Mutex<Vec<ChatPrompt>>,
    }

    impl MockProvider {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerationProvider for MockProvider {
        async fn generate(&self, prompt: &ChatPrompt) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok(self.answer.clone())
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    struct Fixture {
        orchestrator: ChatOrchestrator,
        provider: Arc<MockProvider>,
        _dirs: Vec<tempfile::TempDir>,
    }

    fn fixture(answer: &str, local_roots: Vec<PathBuf>, fs_enabled: bool) -> Fixture {
        let skills_dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new(answer);
        let orchestrator = ChatOrchestrator::new(
            Arc::new(SkillsRetriever::new(skills_dir.path().to_path_buf())),
            Arc::new(LocalContextRetriever::new(
                LocalContextConfig {
                    enabled: !local_roots.is_empty(),
                    roots: local_roots,
                    template_roots: vec![],
                },
                Arc::new(IndexCache::new()),
            )),
            Arc::new(FsAgent::new(FsAgentConfig {
                enabled: fs_enabled,
                auto_approve_writes: false,
            })),
            Some(provider.clone()),
            Arc::new(PhraseListClassifier::default()),
        );
        Fixture {
            orchestrator,
            provider,
            _dirs: vec![skills_dir],
        }
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            history: vec![],
            mode: ChatMode::Coder,
        }
    }

    #[tokio::test]
    async fn empty_message_is_a_client_error() {
        let f = fixture("irrelevant", vec![], false);
        let err = f.orchestrator.handle(request("   ")).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
    }

    #[tokio::test]
    async fn missing_provider_is_a_config_error() {
        let skills_dir = tempfile::tempdir().unwrap();
        let orchestrator = ChatOrchestrator::new(
            Arc::new(SkillsRetriever::new(skills_dir.path().to_path_buf())),
            Arc::new(LocalContextRetriever::new(
                LocalContextConfig {
                    enabled: false,
                    roots: vec![],
                    template_roots: vec![],
                },
                Arc::new(IndexCache::new()),
            )),
            Arc::new(FsAgent::new(FsAgentConfig::default())),
            None,
            Arc::new(PhraseListClassifier::default()),
        );
        let err = orchestrator.handle(request("hello")).await.unwrap_err();
        assert!(matches!(err, ChatError::MissingCredential));
    }

    #[tokio::test]
    async fn commands_short_circuit_generation() {
        let f = fixture("never generated", vec![], true);
        let reply = f.orchestrator.handle(request("/pending")).await.unwrap();
        assert_eq!(reply.sources, vec![FS_AGENT_SOURCE.to_string()]);
        assert_eq!(reply.answer, "No pending actions.");
        assert!(f.provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commands_work_without_a_credential() {
        let mut f = fixture("x", vec![], true);
        f.orchestrator.provider = None;
        let reply = f.orchestrator.handle(request("/pending")).await.unwrap();
        assert_eq!(reply.sources, vec![FS_AGENT_SOURCE.to_string()]);
    }

    #[tokio::test]
    async fn passthrough_when_no_local_context() {
        let f = fixture("plain model answer", vec![], false);
        let reply = f
            .orchestrator
            .handle(request("explain ownership in rust"))
            .await
            .unwrap();
        assert_eq!(reply.answer, "plain model answer");
        assert_eq!(reply.sources, vec!["mode:coder".to_string()]);
    }

    #[tokio::test]
    async fn local_context_prepends_summary() {
        let docs = tempfile::tempdir().unwrap();
        std::fs::write(docs.path().join("billing.md"), "billing export routine").unwrap();

        let f = fixture("model answer", vec![docs.path().to_path_buf()], false);
        let reply = f
            .orchestrator
            .handle(request("billing export"))
            .await
            .unwrap();

        assert!(reply.answer.starts_with("Encontrei contexto local automaticamente em: "));
        assert!(reply.answer.contains("- billing.md"));
        assert!(reply.answer.ends_with("model answer"));
        assert!(reply.sources.contains(&"local-auto-context".to_string()));
    }

    #[tokio::test]
    async fn denial_is_replaced_by_context_summary() {
        let docs = tempfile::tempdir().unwrap();
        std::fs::write(docs.path().join("billing.md"), "billing export routine").unwrap();

        let f = fixture(
            "I cannot access the local file system, please copy and paste.",
            vec![docs.path().to_path_buf()],
            false,
        );
        let reply = f
            .orchestrator
            .handle(request("billing export"))
            .await
            .unwrap();

        assert!(reply.answer.starts_with("Encontrei contexto local automaticamente em: "));
        assert!(!reply.answer.contains("cannot access"));
    }

    #[tokio::test]
    async fn empty_generation_soft_fails_with_fallback() {
        let f = fixture("   ", vec![], false);
        let reply = f.orchestrator.handle(request("anything here")).await.unwrap();
        assert_eq!(reply.answer, EMPTY_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn n8n_keyword_triggers_enterprise_mode() {
        let f = fixture("answer", vec![], false);
        let reply = f
            .orchestrator
            .handle(request("build a webhook integration"))
            .await
            .unwrap();
        assert!(reply.sources.contains(&"n8n-enterprise-mode".to_string()));
        assert_eq!(reply.sources.last().unwrap(), "mode:coder");

        let prompt = f.provider.prompts.lock().unwrap().pop().unwrap();
        assert!(prompt.n8n_expert_mode);
        assert!(prompt.n8n_guidelines.contains("N8N Enterprise Delivery Standard"));
    }

    #[tokio::test]
    async fn explicit_n8n_mode_forces_enterprise_guidelines() {
        let f = fixture("answer", vec![], false);
        let reply = f
            .orchestrator
            .handle(ChatRequest {
                message: "nothing about automation".into(),
                history: vec![],
                mode: ChatMode::N8n,
            })
            .await
            .unwrap();
        assert!(reply.sources.contains(&"n8n-enterprise-mode".to_string()));
        assert_eq!(reply.sources.last().unwrap(), "mode:n8n");
    }

    #[tokio::test]
    async fn non_domain_prompt_gets_na_sentinel() {
        let f = fixture("answer", vec![], false);
        f.orchestrator
            .handle(request("explain rust lifetimes"))
            .await
            .unwrap();
        let prompt = f.provider.prompts.lock().unwrap().pop().unwrap();
        assert!(!prompt.n8n_expert_mode);
        assert_eq!(prompt.n8n_guidelines, "N/A");
    }

    #[tokio::test]
    async fn history_is_rendered_into_the_prompt() {
        let f = fixture("answer", vec![], false);
        f.orchestrator
            .handle(ChatRequest {
                message: "continue please".into(),
                history: vec![
                    HistoryItem {
                        role: Role::User,
                        content: "first question".into(),
                    },
                    HistoryItem {
                        role: Role::Assistant,
                        content: "first answer".into(),
                    },
                ],
                mode: ChatMode::Coder,
            })
            .await
            .unwrap();
        let prompt = f.provider.prompts.lock().unwrap().pop().unwrap();
        assert!(prompt.history_context.contains("USER: first question"));
        assert!(prompt.history_context.contains("ASSISTANT: first answer"));
    }

    #[test]
    fn sanitize_history_trims_filters_and_caps() {
        let mut history = vec![HistoryItem {
            role: Role::User,
            content: "  ".into(),
        }];
        for i in 0..20 {
            history.push(HistoryItem {
                role: Role::Assistant,
                content: format!("  reply {i} "),
            });
        }
        let cleaned = sanitize_history(history);
        assert_eq!(cleaned.len(), MAX_HISTORY);
        assert_eq!(cleaned[0].content, "reply 8");
        assert_eq!(cleaned.last().unwrap().content, "reply 19");
    }
}
