//! lexchat - legal question answering client library
//!
//! This library provides the client-side core of a legal Q&A chat: splitting
//! answers around their `[N]` citation markers, keeping a local history of
//! conversations, and talking to the question-answering backend.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `citation_parser`: Splits answer text into text and citation segments
//! - `store`: Conversation index, bounded message cache and recency grouping
//! - `storage`: Key-value storage backends (SQLite, in-memory)
//! - `backend`: HTTP client for the question-answering service
//! - `chat`: One open conversation tying the above together
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use lexchat::{Config, ConversationStore};
//! use lexchat::storage::open_storage;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = ConversationStore::with_config(open_storage(&config.storage)?, config.cache);
//!     for group in store.list_grouped() {
//!         println!("{}: {}", group.label.label(), group.conversations.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod chat;
pub mod citation_parser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use chat::{ChatSession, LoadSource};
pub use citation_parser::{segment, TextSegment};
pub use config::Config;
pub use error::{LexchatError, Result};
pub use message::{Citation, Message, Role};
pub use store::{ConversationMeta, ConversationStore, RecencyBucket, WriteOutcome};
