//! Conversation modes: a closed enum mapping each mode to behavioral
//! guidelines, an output contract, and a completion quality gate. Pure
//! lookups, no state.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    N8n,
    Coder,
    Pesquisa,
    Leitura,
}

impl ChatMode {
    pub const ALL: [ChatMode; 4] = [ChatMode::N8n, ChatMode::Coder, ChatMode::Pesquisa, ChatMode::Leitura];

    /// Strict parse: `None` for unrecognized values, so callers (and
    /// tests) can tell an explicit mode from a defaulted one.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "n8n" => Some(ChatMode::N8n),
            "coder" => Some(ChatMode::Coder),
            "pesquisa" => Some(ChatMode::Pesquisa),
            "leitura" => Some(ChatMode::Leitura),
            _ => None,
        }
    }

    /// Lenient parse with the documented default of `coder`.
    pub fn parse_or_default(value: &str) -> Self {
        Self::from_str(value).unwrap_or(ChatMode::Coder)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::N8n => "n8n",
            ChatMode::Coder => "coder",
            ChatMode::Pesquisa => "pesquisa",
            ChatMode::Leitura => "leitura",
        }
    }

    pub fn guidelines(&self) -> &'static str {
        match self {
            ChatMode::N8n => {
                "Mode n8n: operate as a principal enterprise automation architect.\n\
                 Design production-ready workflows with explicit triggers, branching logic, idempotency, retries/backoff, DLQ strategy, and failure isolation.\n\
                 Always include security controls (credentials scope, input validation, PII handling), and operational controls (alerts, SLO, rollback, runbook).\n\
                 Prefer concrete node-level plans and implementation-ready details over generic advice."
            }
            ChatMode::Coder => {
                "Mode coder: behave like a senior staff software engineer focused on shipping robust code.\n\
                 Return implementation-ready output with clear architecture decisions, constraints, tradeoffs, and safe migration/refactor paths.\n\
                 Include test strategy (unit/integration/e2e) and edge-case handling; avoid vague pseudo-solutions."
            }
            ChatMode::Pesquisa => {
                "Mode pesquisa: act as a research analyst with rigorous comparison and decision quality.\n\
                 Separate facts from assumptions, compare alternatives with objective criteria, and end with ranked recommendation.\n\
                 Be explicit about uncertainty and what additional data would increase confidence."
            }
            ChatMode::Leitura => {
                "Mode leitura: act as an expert reader/editor for dense technical material.\n\
                 Extract key points, terminology, dependencies, risks, and implied actions from provided context.\n\
                 Prefer concise structured summaries with high signal and no fluff."
            }
        }
    }

    pub fn output_contract(&self) -> &'static str {
        match self {
            ChatMode::N8n => {
                "Output Contract (n8n):\n\
                 1. Objective and assumptions\n\
                 2. Node-by-node blueprint (ordered)\n\
                 3. Error handling and resiliency plan\n\
                 4. Security and compliance controls\n\
                 5. Observability and operations (alerts, metrics, runbook)\n\
                 6. Rollout and rollback checklist"
            }
            ChatMode::Coder => {
                "Output Contract (coder):\n\
                 1. Solution overview\n\
                 2. Concrete implementation details (code-level)\n\
                 3. Tradeoffs and risks\n\
                 4. Test plan and validation steps\n\
                 5. Next implementation steps"
            }
            ChatMode::Pesquisa => {
                "Output Contract (pesquisa):\n\
                 1. Problem framing\n\
                 2. Evidence and findings\n\
                 3. Alternatives comparison matrix\n\
                 4. Recommendation with rationale\n\
                 5. Confidence level and open questions"
            }
            ChatMode::Leitura => {
                "Output Contract (leitura):\n\
                 1. Executive summary\n\
                 2. Key points by topic\n\
                 3. Critical terms explained\n\
                 4. Risks/gaps/ambiguities\n\
                 5. Actionable takeaways"
            }
        }
    }

    pub fn quality_gate(&self) -> &'static str {
        match self {
            ChatMode::N8n => "Do not finish without explicit failure-path handling and operational hardening.",
            ChatMode::Coder => "Do not finish without concrete implementation details and test coverage guidance.",
            ChatMode::Pesquisa => "Do not finish without comparing alternatives and making a justified recommendation.",
            ChatMode::Leitura => "Do not finish without extracting key insights, risks, and actionable summary.",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
