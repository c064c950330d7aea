//! Conversion between in-memory [`Message`]s and persisted [`StoredMessage`]s
//!
//! Date handling lives here and nowhere else: timestamps are written as
//! `YYYY-MM-DDTHH:MM:SS.sssZ` (UTC, millisecond precision) and read back from
//! any RFC 3339 string.

use super::types::StoredMessage;
use crate::error::Result;
use crate::message::Message;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way the message cache stores it
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp: {}", raw))
}

/// Convert a message to its persisted form
pub fn encode(message: &Message) -> StoredMessage {
    StoredMessage {
        id: message.id.clone(),
        role: message.role,
        content: message.content.clone(),
        citations: if message.citations.is_empty() {
            None
        } else {
            Some(message.citations.clone())
        },
        confidence: message.confidence,
        confidence_score: message.confidence_score,
        validation: message.validation.clone(),
        processing_time: message.processing_time_ms,
        timestamp: encode_timestamp(&message.timestamp),
    }
}

/// Convert a persisted message back to its in-memory form
///
/// An unreadable timestamp is replaced with the current time; the message
/// itself is kept.
pub fn decode(stored: StoredMessage) -> Message {
    let timestamp = decode_timestamp(&stored.timestamp).unwrap_or_else(|e| {
        tracing::warn!(message_id = %stored.id, "{:#}, using current time", e);
        Utc::now()
    });

    Message {
        id: stored.id,
        role: stored.role,
        content: stored.content,
        citations: stored.citations.unwrap_or_default(),
        confidence: stored.confidence,
        confidence_score: stored.confidence_score,
        validation: stored.validation,
        processing_time_ms: stored.processing_time,
        timestamp,
    }
}
