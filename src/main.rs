//! lexchat - legal question answering CLI
//!
//! Main entry point for the lexchat application.

use anyhow::Result;

use lexchat::cli::{Cli, Commands};
use lexchat::commands;
use lexchat::config::Config;
use lexchat::logging::{bootstrap_subscriber, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration under a bootstrap subscriber so its warnings are
    // reported, then initialize logging from the loaded settings
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = tracing::subscriber::with_default(bootstrap_subscriber()?, || {
        Config::load(config_path, &cli)
    })?;
    init_logging(&config.logging)?;

    if let Some(db_path) = &cli.storage_path {
        tracing::info!("Using storage DB override from CLI: {}", db_path);
    }

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Ask {
            question,
            session,
            json,
        } => {
            if let Some(s) = &session {
                tracing::debug!("Continuing conversation: {}", s);
            }
            commands::ask::run_ask(&config, &question, session.as_deref(), json).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::history::handle_history(&config, command).await?;
            Ok(())
        }
        Commands::Segment {
            text,
            citations,
            json,
        } => {
            commands::segment::run_segment(&text, citations, json)?;
            Ok(())
        }
    }
}
