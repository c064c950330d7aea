//! Bounded cache of full message histories
//!
//! The cache is a single JSON object mapping session id to its stored
//! messages, kept under one storage key. Key order is insertion order and is
//! what eviction works from: the oldest-inserted sessions go first, however
//! recently they were viewed. Re-saving a session keeps its position.
//!
//! Writing is split into explicit steps so each can be exercised on its own:
//! [`attempt_write`], [`evict_oldest`], [`retry_write`], composed by
//! [`persist_cache`].

use super::types::StoredMessage;
use crate::error::{LexchatError, Result};
use crate::storage::KeyValueStorage;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insertion-ordered mapping from session id to stored messages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageCache {
    entries: Vec<(String, Vec<StoredMessage>)>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached sessions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages cached for `session_id`
    pub fn get(&self, session_id: &str) -> Option<&[StoredMessage]> {
        self.entries
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).is_some()
    }

    /// Store messages for `session_id`
    ///
    /// A new session is appended; an existing one is replaced in place.
    pub fn insert(&mut self, session_id: impl Into<String>, messages: Vec<StoredMessage>) {
        let session_id = session_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == session_id) {
            Some((_, existing)) => *existing = messages,
            None => self.entries.push((session_id, messages)),
        }
    }

    /// Remove a session, returning its messages
    pub fn remove(&mut self, session_id: &str) -> Option<Vec<StoredMessage>> {
        let pos = self.entries.iter().position(|(id, _)| id == session_id)?;
        Some(self.entries.remove(pos).1)
    }

    /// Session ids, oldest-inserted first
    pub fn session_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Parse a serialized cache
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize the cache
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for MessageCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (session_id, messages) in &self.entries {
            map.serialize_entry(session_id, messages)?;
        }
        map.end()
    }
}

struct MessageCacheVisitor;

impl<'de> Visitor<'de> for MessageCacheVisitor {
    type Value = MessageCache;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of session id to message list")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut cache = MessageCache::new();
        while let Some((session_id, messages)) =
            access.next_entry::<String, Vec<StoredMessage>>()?
        {
            // A repeated key keeps its first position and its last value.
            cache.insert(session_id, messages);
        }
        Ok(cache)
    }
}

impl<'de> Deserialize<'de> for MessageCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(MessageCacheVisitor)
    }
}

/// Limits applied when persisting the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Sessions kept on every write
    pub max_sessions: usize,
    /// Sessions kept when retrying after a capacity failure
    pub retry_sessions: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_sessions: 10,
            retry_sessions: 10,
        }
    }
}

/// What happened when the cache was persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written as-is
    Written,
    /// Written after dropping the listed sessions, oldest first
    WrittenAfterEviction { evicted: Vec<String> },
    /// Nothing was written; the previously stored cache is unchanged
    Failed { reason: String },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Serialize `cache` and store it under `key`
pub fn attempt_write<S: KeyValueStorage + ?Sized>(
    storage: &S,
    key: &str,
    cache: &MessageCache,
) -> Result<()> {
    let json = cache.to_json()?;
    storage.set(key, &json)
}

/// Drop all but the `keep` most recently inserted sessions
///
/// Returns the evicted session ids, oldest first.
pub fn evict_oldest(cache: &mut MessageCache, keep: usize) -> Vec<String> {
    let excess = cache.entries.len().saturating_sub(keep);
    cache
        .entries
        .drain(..excess)
        .map(|(session_id, _)| session_id)
        .collect()
}

/// Evict down to `keep` sessions and write once more
///
/// Returns the sessions evicted by this pass.
pub fn retry_write<S: KeyValueStorage + ?Sized>(
    storage: &S,
    key: &str,
    cache: &mut MessageCache,
    keep: usize,
) -> Result<Vec<String>> {
    let evicted = evict_oldest(cache, keep);
    tracing::debug!(
        evicted = evicted.len(),
        remaining = cache.len(),
        "Retrying message cache write"
    );
    attempt_write(storage, key, cache)?;
    Ok(evicted)
}

/// Enforce the session cap and write the cache, retrying once on a
/// capacity failure
///
/// Never returns an error; failures are logged and reported as
/// [`WriteOutcome::Failed`].
pub fn persist_cache<S: KeyValueStorage + ?Sized>(
    storage: &S,
    key: &str,
    cache: &mut MessageCache,
    policy: CachePolicy,
) -> WriteOutcome {
    let mut evicted = evict_oldest(cache, policy.max_sessions);

    let err = match attempt_write(storage, key, cache) {
        Ok(()) if evicted.is_empty() => return WriteOutcome::Written,
        Ok(()) => return WriteOutcome::WrittenAfterEviction { evicted },
        Err(e) => e,
    };

    if !LexchatError::is_quota_exceeded(&err) {
        tracing::warn!(key, "Failed to persist message cache: {:#}", err);
        return WriteOutcome::Failed {
            reason: format!("{:#}", err),
        };
    }

    tracing::warn!(
        key,
        sessions = cache.len(),
        keep = policy.retry_sessions,
        "Message cache exceeds storage quota, evicting oldest sessions"
    );

    match retry_write(storage, key, cache, policy.retry_sessions) {
        Ok(more) => {
            evicted.extend(more);
            WriteOutcome::WrittenAfterEviction { evicted }
        }
        Err(e) => {
            tracing::warn!(key, "Message cache retry failed: {:#}", e);
            WriteOutcome::Failed {
                reason: format!("{:#}", e),
            }
        }
    }
}
