use crate::message::{Citation, Confidence, Role, Validation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a conversation title
pub const MAX_TITLE_CHARS: usize = 60;

/// Metadata for a stored conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMeta {
    /// Session identifier shared with the backend
    pub id: String,
    /// User-facing title, at most [`MAX_TITLE_CHARS`] characters
    pub title: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation last received a turn
    pub updated_at: DateTime<Utc>,
}

impl ConversationMeta {
    /// Create a record stamped with `now` for both timestamps
    pub fn new(id: impl Into<String>, title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: truncate_title(title),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields that may be changed on an existing conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationUpdate {
    pub title: Option<String>,
}

impl ConversationUpdate {
    /// An update that only refreshes `updated_at`
    pub fn touch() -> Self {
        Self::default()
    }

    /// An update that renames the conversation
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }
}

/// Truncate a title to [`MAX_TITLE_CHARS`] characters
///
/// Counts characters, not bytes, so multi-byte titles are never split inside
/// a code point.
pub fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// A chat message in its persisted form
///
/// Field names follow the browser cache layout (camelCase) and the timestamp
/// is an ISO-8601 string; see [`crate::store::codec`] for the conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    /// Backend processing time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
    pub timestamp: String,
}
