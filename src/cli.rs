//! Command-line interface definition for lexchat
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// lexchat - legal question answering from the terminal
///
/// Ask questions, browse locally cached conversations, and inspect how
/// answers are split into citation segments.
#[derive(Parser, Debug, Clone)]
#[command(name = "lexchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Use this SQLite file for conversation storage
    #[arg(long, env = "LEXCHAT_STORAGE_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a legal question
    Ask {
        /// The question
        question: String,

        /// Continue an existing conversation
        #[arg(short, long)]
        session: Option<String>,

        /// Print the raw answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage locally stored conversations
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Split text into text and citation segments
    Segment {
        /// Answer text containing [N] markers
        text: String,

        /// Number of citations available
        #[arg(short = 'n', long, default_value_t = 0)]
        citations: usize,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Conversation history subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    /// List conversations grouped by recency
    List {
        /// Print groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the cached messages of a conversation
    Show {
        /// Conversation (session) id
        id: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation (session) id
        id: String,

        /// Only delete the local copy, leave the backend session alone
        #[arg(long)]
        local_only: bool,
    },

    /// Delete all locally stored conversations
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::History {
                command: HistoryCommand::List { json: false },
            },
        }
    }
}
