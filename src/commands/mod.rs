//! Command handlers for the CLI
//!
//! - `ask`: send a question and print the answer with its citations
//! - `history`: list, show and delete locally stored conversations
//! - `segment`: split text into text and citation segments

use crate::config::Config;
use crate::error::Result;
use crate::storage::{self, KeyValueStorage};
use crate::store::ConversationStore;

pub mod ask;
pub mod history;
pub mod segment;

/// Store type the command handlers work with
pub type CliStore = ConversationStore<Box<dyn KeyValueStorage>>;

/// Open the conversation store described by `config`
///
/// # Errors
///
/// Returns error if the storage backend cannot be opened
pub fn open_store(config: &Config) -> Result<CliStore> {
    let storage = storage::open_storage(&config.storage)?;
    Ok(ConversationStore::with_config(storage, config.cache.clone()))
}
