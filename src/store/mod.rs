//! Conversation store
//!
//! Keeps two independent records in durable key-value storage:
//!
//! - the conversation index: a JSON array of [`ConversationMeta`], newest
//!   additions first
//! - the message cache: a JSON object mapping session id to its
//!   [`StoredMessage`]s, capped by insertion order (see [`cache`])
//!
//! No public operation returns an error. Unreadable data is treated as
//! empty, and failed writes are logged and leave the previous state in place.
//! Every mutation re-reads the persisted record right before changing it.

use crate::config::CacheConfig;
use crate::message::Message;
use crate::storage::KeyValueStorage;
use chrono::{DateTime, Local, TimeZone, Utc};

pub mod cache;
pub mod codec;
pub mod grouping;
pub mod types;

pub use cache::{CachePolicy, MessageCache, WriteOutcome};
pub use grouping::{group_by_recency, ConversationGroup, RecencyBucket};
pub use types::{ConversationMeta, ConversationUpdate, StoredMessage, MAX_TITLE_CHARS};

/// Conversation index and message cache over a [`KeyValueStorage`]
pub struct ConversationStore<S: KeyValueStorage> {
    storage: S,
    config: CacheConfig,
    active: Option<String>,
}

impl<S: KeyValueStorage> ConversationStore<S> {
    /// Create a store with default keys and limits
    ///
    /// # Examples
    ///
    /// ```
    /// use lexchat::storage::MemoryStorage;
    /// use lexchat::store::ConversationStore;
    ///
    /// let mut store = ConversationStore::new(MemoryStorage::new());
    /// store.add_conversation("s-1", "Hak cuti pekerja");
    /// assert_eq!(store.list_grouped()[0].label.label(), "Today");
    /// ```
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, CacheConfig::default())
    }

    /// Create a store with explicit keys and limits
    pub fn with_config(storage: S, config: CacheConfig) -> Self {
        Self {
            storage,
            config,
            active: None,
        }
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// All conversations in index order
    pub fn list(&self) -> Vec<ConversationMeta> {
        self.read_index()
    }

    /// Look up one conversation
    pub fn get_conversation(&self, id: &str) -> Option<ConversationMeta> {
        self.read_index().into_iter().find(|c| c.id == id)
    }

    /// Conversations grouped by recency relative to the local wall clock
    pub fn list_grouped(&self) -> Vec<ConversationGroup> {
        self.list_grouped_at(&Local::now())
    }

    /// Conversations grouped by recency relative to `now`
    pub fn list_grouped_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<ConversationGroup> {
        group_by_recency(&self.read_index(), now)
    }

    /// Record a new conversation and make it active
    ///
    /// Any existing record with the same id is replaced; the new record goes
    /// to the front of the index.
    pub fn add_conversation(&mut self, id: &str, title: &str) -> ConversationMeta {
        let meta = ConversationMeta::new(id, title, Utc::now());

        let mut index = self.read_index();
        index.retain(|c| c.id != id);
        index.insert(0, meta.clone());
        self.write_index(&index);

        tracing::debug!(conversation_id = %id, "Added conversation");
        self.active = Some(id.to_string());
        meta
    }

    /// Merge `update` into an existing conversation and refresh `updated_at`
    ///
    /// Returns the updated record, or `None` (and changes nothing) when `id`
    /// is unknown.
    pub fn update_conversation(
        &mut self,
        id: &str,
        update: ConversationUpdate,
    ) -> Option<ConversationMeta> {
        let mut index = self.read_index();
        let meta = index.iter_mut().find(|c| c.id == id)?;

        if let Some(title) = update.title {
            meta.title = types::truncate_title(&title);
        }
        meta.updated_at = Utc::now();
        let updated = meta.clone();

        self.write_index(&index);
        Some(updated)
    }

    /// Touch an existing conversation, or add it when it does not exist yet
    ///
    /// This is the per-answer lifecycle: the first answer in a session
    /// creates the record, later answers only refresh `updated_at`.
    pub fn touch_or_create(&mut self, id: &str, title: &str) -> ConversationMeta {
        match self.update_conversation(id, ConversationUpdate::touch()) {
            Some(meta) => {
                self.active = Some(id.to_string());
                meta
            }
            None => self.add_conversation(id, title),
        }
    }

    /// Remove a conversation and its cached messages
    pub fn delete_conversation(&mut self, id: &str) {
        let mut index = self.read_index();
        let before = index.len();
        index.retain(|c| c.id != id);
        if index.len() != before {
            self.write_index(&index);
        }

        let mut cache = self.read_cache();
        if cache.remove(id).is_some() {
            if let Err(e) = cache::attempt_write(&self.storage, &self.config.messages_key, &cache) {
                tracing::warn!(conversation_id = %id, "Failed to drop cached messages: {:#}", e);
            }
        }

        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        tracing::debug!(conversation_id = %id, "Deleted conversation");
    }

    /// Select the active conversation (in memory only)
    pub fn set_active_conversation(&mut self, id: Option<&str>) {
        self.active = id.map(str::to_string);
    }

    /// The active conversation, if any
    pub fn active_conversation(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Cache the full message list of a session
    pub fn save_messages(&self, session_id: &str, messages: &[Message]) -> WriteOutcome {
        let mut cache = self.read_cache();
        cache.insert(session_id, messages.iter().map(codec::encode).collect());

        let outcome = cache::persist_cache(
            &self.storage,
            &self.config.messages_key,
            &mut cache,
            self.config.policy(),
        );
        tracing::debug!(
            session_id,
            messages = messages.len(),
            ?outcome,
            "Saved messages"
        );
        outcome
    }

    /// Cached messages of a session; `None` when absent or empty
    pub fn load_messages(&self, session_id: &str) -> Option<Vec<Message>> {
        let mut cache = self.read_cache();
        let stored = cache.remove(session_id)?;
        if stored.is_empty() {
            return None;
        }
        Some(stored.into_iter().map(codec::decode).collect())
    }

    /// Remove both the index and the message cache
    pub fn clear(&mut self) {
        for key in [&self.config.conversations_key, &self.config.messages_key] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key = %key, "Failed to clear storage key: {:#}", e);
            }
        }
        self.active = None;
    }

    fn read_index(&self) -> Vec<ConversationMeta> {
        let key = &self.config.conversations_key;
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %key, "Failed to read conversation index: {:#}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %key, "Conversation index is corrupted, starting empty: {}", e);
            Vec::new()
        })
    }

    fn write_index(&self, index: &[ConversationMeta]) {
        let key = &self.config.conversations_key;
        let result = serde_json::to_string(index)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set(key, &json));
        if let Err(e) = result {
            tracing::warn!(key = %key, "Failed to persist conversation index: {:#}", e);
        }
    }

    fn read_cache(&self) -> MessageCache {
        let key = &self.config.messages_key;
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return MessageCache::new(),
            Err(e) => {
                tracing::warn!(key = %key, "Failed to read message cache: {:#}", e);
                return MessageCache::new();
            }
        };

        MessageCache::from_json(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %key, "Message cache is corrupted, starting empty: {:#}", e);
            MessageCache::new()
        })
    }
}
