use std::io::{self, BufRead, Write};

use anyhow::Result;
use farol_core::{ChatMode, ChatRequest, HistoryItem, Role, MAX_HISTORY};
use tracing::info;

use crate::commands::build_orchestrator;
use crate::config::Config;

/// Interactive terminal chat against the same pipeline the gateway
/// serves. History is kept to the same window the orchestrator uses.
pub async fn execute(mode: String, config: &Config) -> Result<()> {
    let mode = ChatMode::parse_or_default(&mode);
    info!(mode = %mode, "Starting chat session");

    let orchestrator = build_orchestrator(config)?;

    println!("Farol [{}] - Type 'exit' to quit", mode);
    println!("---");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut history: Vec<HistoryItem> = Vec::new();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            break;
        }

        let request = ChatRequest {
            message: input.to_string(),
            history: history.clone(),
            mode,
        };

        match orchestrator.handle(request).await {
            Ok(reply) => {
                println!("\n{}\n", reply.answer);
                println!("[sources: {}]\n", reply.sources.join(", "));

                history.push(HistoryItem {
                    role: Role::User,
                    content: input.to_string(),
                });
                history.push(HistoryItem {
                    role: Role::Assistant,
                    content: reply.answer,
                });
                if history.len() > MAX_HISTORY {
                    history.drain(..history.len() - MAX_HISTORY);
                }
            }
            Err(e) => {
                eprintln!("\nError: {}\n", e);
            }
        }
    }

    Ok(())
}
