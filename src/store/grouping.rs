//! Recency grouping for the conversation sidebar

use super::types::ConversationMeta;
use chrono::{DateTime, TimeZone};
use serde::Serialize;

/// Recency bucket a conversation falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RecencyBucket {
    #[serde(rename = "Today")]
    Today,
    #[serde(rename = "Yesterday")]
    Yesterday,
    #[serde(rename = "Last 7 Days")]
    LastSevenDays,
    #[serde(rename = "Older")]
    Older,
}

impl RecencyBucket {
    /// All buckets in display order
    pub const ALL: [RecencyBucket; 4] = [
        RecencyBucket::Today,
        RecencyBucket::Yesterday,
        RecencyBucket::LastSevenDays,
        RecencyBucket::Older,
    ];

    /// Sidebar label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::LastSevenDays => "Last 7 Days",
            Self::Older => "Older",
        }
    }

    /// Bucket for a conversation last updated at `updated_at`, seen at `now`
    ///
    /// Boundaries are calendar days in `now`'s time zone. Timestamps in the
    /// future count as today.
    pub fn classify<Tz: TimeZone, Tz2: TimeZone>(
        updated_at: &DateTime<Tz2>,
        now: &DateTime<Tz>,
    ) -> Self {
        let today = now.date_naive();
        let day = updated_at.with_timezone(&now.timezone()).date_naive();
        match (today - day).num_days() {
            d if d <= 0 => Self::Today,
            1 => Self::Yesterday,
            2..=7 => Self::LastSevenDays,
            _ => Self::Older,
        }
    }
}

/// A labelled group of conversations, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationGroup {
    pub label: RecencyBucket,
    pub conversations: Vec<ConversationMeta>,
}

/// Bucket conversations by recency
///
/// Groups come out in the order Today, Yesterday, Last 7 Days, Older; empty
/// groups are omitted and each group is sorted by `updated_at` descending.
pub fn group_by_recency<Tz: TimeZone>(
    conversations: &[ConversationMeta],
    now: &DateTime<Tz>,
) -> Vec<ConversationGroup> {
    let mut buckets: [Vec<ConversationMeta>; 4] = Default::default();

    for conversation in conversations {
        let bucket = RecencyBucket::classify(&conversation.updated_at, now);
        buckets[bucket as usize].push(conversation.clone());
    }

    RecencyBucket::ALL
        .into_iter()
        .zip(buckets)
        .filter(|(_, conversations)| !conversations.is_empty())
        .map(|(label, mut conversations)| {
            conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            ConversationGroup {
                label,
                conversations,
            }
        })
        .collect()
}
