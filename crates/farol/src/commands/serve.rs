use std::sync::Arc;

use anyhow::Result;
use farol_gateway::{start_server, AppState};
use tracing::info;

use crate::commands::build_orchestrator;
use crate::config::Config;

pub async fn execute(host: String, port: u16, config: &Config) -> Result<()> {
    info!(host = %host, port, "Starting chat gateway");

    if config.llm.gemini_api_key.trim().is_empty() {
        tracing::warn!(
            "No Gemini API key configured; chat requests will fail until GEMINI_API_KEY is set"
        );
    }

    let orchestrator = Arc::new(build_orchestrator(config)?);
    let state = AppState { orchestrator };

    start_server(state, &host, port).await?;

    Ok(())
}
