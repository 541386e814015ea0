//! Domain guideline injector for workflow-automation (n8n) requests.
//!
//! A keyword heuristic decides when the extended enterprise delivery
//! standard is appended to the prompt. Incidental keyword overlap (the
//! word "node" in an unrelated sentence) also trips it.

const N8N_KEYWORDS: &[&str] = &[
    "n8n",
    "workflow",
    "node",
    "webhook",
    "trigger",
    "cron",
    "queue",
    "retry",
    "postgres",
    "slack",
    "http request",
    "integration",
    "automacao",
    "automação",
];

/// Source tag reported when enterprise guidelines were injected.
pub const N8N_MODE_SOURCE: &str = "n8n-enterprise-mode";

pub fn is_n8n_enterprise_request(message: &str) -> bool {
    let text = message.to_lowercase();
    N8N_KEYWORDS.iter().any(|k| text.contains(k))
}

pub fn n8n_enterprise_guidelines() -> &'static str {
    "N8N Enterprise Delivery Standard:\n\
     1. Architecture: event-driven design, idempotency key, explicit error branches, no hidden side effects.\n\
     2. Reliability: retries with backoff, dead-letter strategy, timeout/limit guardrails, resume-safe execution.\n\
     3. Security: least-privilege credentials, secret management, input validation, PII minimization, auditability.\n\
     4. Observability: structured logs, trace IDs/correlation IDs, execution metrics, alert conditions and SLOs.\n\
     5. Data integrity: dedup rules, transactional boundaries, schema checks, safe upsert patterns.\n\
     6. Operability: environment separation (dev/stage/prod), rollout plan, rollback plan, runbook.\n\
     7. Testing: happy-path + failure-path test matrix, mock strategy, load/rate test notes.\n\
     8. Output quality: always provide a concrete node-by-node workflow plan and production hardening checklist."
}
