//! Chat message types shared by the store, the backend client and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking
    User,
    /// The question-answering backend
    Assistant,
}

impl Role {
    /// Parse a backend role string; unknown roles yield `None`
    pub fn parse(role: &str) -> Option<Self> {
        match role.to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Confidence level reported for an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// Any value this client does not know about
    #[serde(other)]
    Unknown,
}

/// A source referenced by an answer
///
/// Only the commonly used fields are typed; anything else the backend sends
/// is kept in `extra` so it survives a save/load cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based marker number, when the backend numbers citations itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Regulation the citation points into (e.g. "UU 13/2003")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation: Option<String>,
    /// Article within the regulation (e.g. "Pasal 5")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    /// Document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Quoted source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Link to the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Retrieval relevance score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Citation {
    /// Human-readable label, e.g. "UU 13/2003 Pasal 5"
    pub fn label(&self) -> String {
        match (&self.regulation, &self.article, &self.title) {
            (Some(reg), Some(art), _) => format!("{} {}", reg, art),
            (Some(reg), None, _) => reg.clone(),
            (None, _, Some(title)) => title.clone(),
            (None, Some(art), None) => art.clone(),
            (None, None, None) => "Untitled source".to_string(),
        }
    }
}

/// Answer validation details reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A chat message as held in memory by the chat view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    /// Author of the message
    pub role: Role,
    /// Message text (answers may contain `[N]` citation markers)
    pub content: String,
    /// Sources referenced by an assistant answer
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub validation: Option<Validation>,
    /// Backend processing time in milliseconds
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            citations: Vec::new(),
            confidence: None,
            confidence_score: None,
            validation: None,
            processing_time_ms: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use lexchat::message::{Message, Role};
    ///
    /// let msg = Message::user("Apa isi Pasal 5?");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message without answer metadata
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Sets the citations of the message
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// Sets the timestamp of the message
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns true if this message was authored by the backend
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
