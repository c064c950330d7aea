use crate::message::{Citation, Confidence, Message, Role, Validation};
use serde::{Deserialize, Serialize};

/// Body of a question request
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Answer returned by the question-answering endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswerResponse {
    /// Answer text with `[N]` citation markers
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub validation: Option<Validation>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
    /// Session assigned by the backend when the request carried none
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AnswerResponse {
    /// Build the assistant message shown for this answer
    pub fn to_message(&self) -> Message {
        let mut message = Message::assistant(self.answer.clone()).with_citations(self.citations.clone());
        message.confidence = self.confidence;
        message.confidence_score = self.confidence_score;
        message.validation = self.validation.clone();
        message.processing_time_ms = self.processing_time_ms;
        message
    }
}

/// One entry of a backend chat history
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// Chat history returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatHistoryResponse {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

impl ChatHistoryResponse {
    /// Convert to chat messages, skipping roles the chat view does not show
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
            .into_iter()
            .filter_map(|m| match Role::parse(&m.role) {
                Some(Role::User) => Some(Message::user(m.content)),
                Some(Role::Assistant) => Some(Message::assistant(m.content)),
                None => {
                    tracing::debug!(role = %m.role, "Skipping history message with unknown role");
                    None
                }
            })
            .collect()
    }
}
