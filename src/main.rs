//! n8n-sync: keep a directory of n8n workflow files and an n8n instance in step
//!
//! Parses the command line, sets up logging and hands off to `commands`.
//! Action lines go to stdout, logs to stderr.

mod commands;

use clap::{Parser, Subcommand};
use commands::workflows::WorkflowsCommand;

/// n8n-sync CLI
#[derive(Parser)]
#[command(name = "n8n-sync", version, about = "Sync n8n workflows between a directory and an n8n instance")]
pub struct Cli {
    /// n8n instance URL (e.g. https://acme.app.n8n.cloud)
    #[arg(long, global = true, env = "N8N_INSTANCE_URL", hide_env_values = true)]
    url: Option<String>,

    /// n8n API key
    #[arg(long, global = true, env = "N8N_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workflows
    Workflows {
        #[command(subcommand)]
        action: WorkflowsCommand,
    },
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "n8n_sync=warn",
        1 => "n8n_sync=debug",
        _ => "n8n_sync=trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Workflows { action } => commands::workflows::run(action, cli.url, cli.api_key).await,
    }
}
