//! Inline citation parser for answer text.
//!
//! Answers returned by the question-answering backend reference their sources
//! with bracketed 1-based markers such as `[1]` or `[12]`. This module splits
//! such text into an ordered sequence of plain-text and citation segments so
//! the caller can render clickable markers inline.
//!
//! # Marker Syntax
//!
//! - `[N]` where `N` is one or more ASCII digits
//! - `N` must lie in `1..=citation_count`; anything else stays literal text
//!
//! # Examples
//!
//! ```
//! use lexchat::citation_parser::{segment, TextSegment};
//!
//! let segments = segment("Menurut UU [1], Pasal 5 [2].", 2);
//! assert_eq!(segments.len(), 5);
//! assert_eq!(segments[1], TextSegment::citation("1", 0));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// A contiguous run of answer text
///
/// Either plain text or a single citation marker. Citation segments carry the
/// digits exactly as written and the 0-based index into the citation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextSegment {
    /// Plain text
    Text {
        /// The text content
        content: String,
    },
    /// A citation marker
    Citation {
        /// The marker digits as written (without brackets)
        content: String,
        /// 0-based index into the caller's citation list
        citation_index: usize,
    },
}

impl TextSegment {
    /// Creates a plain text segment
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Creates a citation segment
    pub fn citation(content: impl Into<String>, citation_index: usize) -> Self {
        Self::Citation {
            content: content.into(),
            citation_index,
        }
    }

    /// Returns the raw content of the segment
    pub fn content(&self) -> &str {
        match self {
            Self::Text { content } | Self::Citation { content, .. } => content,
        }
    }

    /// Returns the citation index if this is a citation segment
    pub fn citation_index(&self) -> Option<usize> {
        match self {
            Self::Citation { citation_index, .. } => Some(*citation_index),
            Self::Text { .. } => None,
        }
    }

    /// Returns true if this is a citation segment
    pub fn is_citation(&self) -> bool {
        matches!(self, Self::Citation { .. })
    }
}

impl fmt::Display for TextSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { content } => f.write_str(content),
            Self::Citation { content, .. } => write!(f, "[{}]", content),
        }
    }
}

fn citation_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only; `\d` would also accept other Unicode digit classes.
    MARKER.get_or_init(|| Regex::new(r"\[([0-9]+)\]").expect("citation marker regex is valid"))
}

/// Resolve marker digits to a 0-based citation index
///
/// Returns `None` when the number is zero, exceeds `citation_count`, or is
/// too large to represent.
fn resolve_marker(digits: &str, citation_count: usize) -> Option<usize> {
    let num = digits.parse::<usize>().ok()?;
    if num < 1 || num > citation_count {
        return None;
    }
    Some(num - 1)
}

/// Split answer text into text and citation segments
///
/// # Arguments
///
/// * `text` - Answer text potentially containing `[N]` markers
/// * `citation_count` - Number of citations returned alongside the answer
///
/// # Returns
///
/// The ordered segments. Never empty: empty input yields one empty text
/// segment, and input without valid markers yields the whole text as one
/// text segment.
///
/// # Examples
///
/// ```
/// use lexchat::citation_parser::{segment, TextSegment};
///
/// assert_eq!(segment("See [5]", 2), vec![TextSegment::text("See [5]")]);
/// assert_eq!(
///     segment("[1][2]", 2),
///     vec![TextSegment::citation("1", 0), TextSegment::citation("2", 1)]
/// );
/// ```
pub fn segment(text: &str, citation_count: usize) -> Vec<TextSegment> {
    if text.is_empty() || citation_count == 0 {
        return vec![TextSegment::text(text)];
    }

    let mut segments = Vec::new();
    let mut consumed = 0;

    for caps in citation_marker().captures_iter(text) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let Some(citation_index) = resolve_marker(digits.as_str(), citation_count) else {
            continue;
        };

        if whole.start() > consumed {
            segments.push(TextSegment::text(&text[consumed..whole.start()]));
        }
        segments.push(TextSegment::citation(digits.as_str(), citation_index));
        consumed = whole.end();
    }

    if consumed < text.len() {
        segments.push(TextSegment::text(&text[consumed..]));
    }

    if segments.is_empty() {
        segments.push(TextSegment::text(text));
    }

    segments
}

/// Rebuild the source text from a segment sequence
///
/// Citation segments are rendered in their bracketed form, so
/// `reconstruct(&segment(t, n)) == t` for every input.
pub fn reconstruct(segments: &[TextSegment]) -> String {
    segments.iter().map(|s| s.to_string()).collect()
}

/// Distinct citation indices referenced by `text`, in order of first appearance
///
/// Out-of-range markers are ignored, matching [`segment`].
pub fn cited_indices(text: &str, citation_count: usize) -> Vec<usize> {
    let mut indices = Vec::new();
    for index in segment(text, citation_count)
        .iter()
        .filter_map(TextSegment::citation_index)
    {
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    indices
}
