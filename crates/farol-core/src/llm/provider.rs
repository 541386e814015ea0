use anyhow::Result;
use async_trait::async_trait;

use crate::modes::ChatMode;

/// Structured prompt assembled by the orchestrator: the user message
/// plus every context block the generation call receives.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    pub message: String,
    pub skills_context: String,
    pub history_context: String,
    pub mode: ChatMode,
    pub n8n_expert_mode: bool,
    /// Extended enterprise guidelines, or the `"N/A"` sentinel.
    pub n8n_guidelines: String,
}

impl ChatPrompt {
    /// Render the system instruction sent alongside the user message.
    pub fn system_text(&self) -> String {
        [
            "You are a helpful AI assistant with access to locally retrieved context.".to_string(),
            format!("Assistant mode: {}", self.mode),
            self.mode.guidelines().to_string(),
            self.mode.output_contract().to_string(),
            format!("Quality gate: {}", self.mode.quality_gate()),
            format!(
                "Enterprise automation mode: {}",
                if self.n8n_expert_mode { "enabled" } else { "disabled" }
            ),
            format!("Enterprise guidelines:\n{}", self.n8n_guidelines),
            format!("Retrieved context:\n{}", self.skills_context),
            format!("Conversation history:\n{}", self.history_context),
        ]
        .join("\n\n")
    }
}

/// Opaque generation capability: structured prompt in, answer text out.
/// Implemented by the Gemini client and by test mocks.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &ChatPrompt) -> Result<String>;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}
