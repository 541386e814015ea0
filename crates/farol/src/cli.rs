use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "farol")]
#[command(about = "Farol - retrieval-augmented chat gateway", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new config file
    Init {
        /// Path for new config file
        #[arg(default_value = "farol.toml")]
        path: PathBuf,
    },
    /// Start the HTTP chat gateway
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
    /// Interactive chat against the orchestrator (no HTTP)
    Chat {
        /// Conversation mode: n8n, coder, pesquisa, leitura
        #[arg(long, default_value = "coder")]
        mode: String,
    },
}
