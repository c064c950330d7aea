//! Chat view controller
//!
//! Ties the conversation store, the backend client and the citation parser
//! together for one open conversation: loading it, asking questions,
//! recording answers, and tracking which citation is highlighted in the side
//! panel.

use crate::backend::QaBackend;
use crate::citation_parser::{self, TextSegment};
use crate::error::Result;
use crate::message::{Citation, Message};
use crate::storage::KeyValueStorage;
use crate::store::{ConversationStore, WriteOutcome};

/// Where the messages of an opened conversation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The local message cache
    Cache,
    /// The backend chat history
    Backend,
    /// Nothing was available; the conversation starts empty
    Empty,
}

/// One open conversation
pub struct ChatSession<'a, S: KeyValueStorage, B: QaBackend> {
    store: &'a mut ConversationStore<S>,
    backend: &'a B,
    session_id: Option<String>,
    messages: Vec<Message>,
    active_citation: Option<usize>,
}

impl<'a, S: KeyValueStorage, B: QaBackend> ChatSession<'a, S, B> {
    /// Start a new, empty conversation
    ///
    /// The session id is assigned by the backend with the first answer.
    pub fn new(store: &'a mut ConversationStore<S>, backend: &'a B) -> Self {
        store.set_active_conversation(None);
        Self {
            store,
            backend,
            session_id: None,
            messages: Vec::new(),
            active_citation: None,
        }
    }

    /// Open an existing conversation
    ///
    /// Messages come from the local cache when present, otherwise from the
    /// backend history. A backend failure is logged and yields an empty
    /// conversation.
    pub async fn open(
        store: &'a mut ConversationStore<S>,
        backend: &'a B,
        session_id: &str,
    ) -> (Self, LoadSource) {
        store.set_active_conversation(Some(session_id));

        let (messages, source) = match store.load_messages(session_id) {
            Some(messages) => (messages, LoadSource::Cache),
            None => match backend.chat_history(session_id).await {
                Ok(history) => {
                    let messages = history.into_messages();
                    if messages.is_empty() {
                        (messages, LoadSource::Empty)
                    } else {
                        (messages, LoadSource::Backend)
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session_id,
                        "Could not load conversation history, starting empty: {:#}",
                        e
                    );
                    (Vec::new(), LoadSource::Empty)
                }
            },
        };

        tracing::debug!(session_id, ?source, messages = messages.len(), "Opened conversation");

        let session = Self {
            store,
            backend,
            session_id: Some(session_id.to_string()),
            messages,
            active_citation: None,
        };
        (session, source)
    }

    /// Current session id, once known
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Messages of the conversation in display order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Ask a question and record the answer
    ///
    /// On success the full conversation is cached and the conversation
    /// metadata is created (first answer, titled with the first question) or
    /// touched. On failure the question stays in memory only and the error is
    /// returned.
    pub async fn ask(&mut self, question: &str) -> Result<&Message> {
        self.messages.push(Message::user(question));
        self.active_citation = None;

        let answer = self
            .backend
            .ask(question, self.session_id.as_deref())
            .await?;

        let session_id = match (&self.session_id, &answer.session_id) {
            (Some(current), _) => current.clone(),
            (None, Some(assigned)) => assigned.clone(),
            (None, None) => uuid::Uuid::new_v4().to_string(),
        };
        self.session_id = Some(session_id.clone());
        self.messages.push(answer.to_message());

        let outcome = self.store.save_messages(&session_id, &self.messages);
        if let WriteOutcome::Failed { reason } = &outcome {
            tracing::warn!(session_id = %session_id, "Conversation not cached: {}", reason);
        }

        let title = self
            .messages
            .iter()
            .find(|m| !m.is_assistant())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| question.to_string());
        self.store.touch_or_create(&session_id, &title);

        let last = self.messages.len() - 1;
        Ok(&self.messages[last])
    }

    /// Segments of a message for inline rendering
    ///
    /// Returns `None` when `message_index` is out of range.
    pub fn segments(&self, message_index: usize) -> Option<Vec<TextSegment>> {
        let message = self.messages.get(message_index)?;
        Some(citation_parser::segment(
            &message.content,
            message.citations.len(),
        ))
    }

    /// Citations of the latest answer
    pub fn latest_citations(&self) -> &[Citation] {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.citations.as_slice())
            .unwrap_or(&[])
    }

    /// Highlight a citation of the latest answer
    ///
    /// Out-of-range indices are ignored. Returns the highlighted citation.
    pub fn select_citation(&mut self, index: usize) -> Option<&Citation> {
        if index >= self.latest_citations().len() {
            tracing::debug!(index, "Ignoring out-of-range citation selection");
            return None;
        }
        self.active_citation = Some(index);
        self.latest_citations().get(index)
    }

    /// Remove the highlight
    pub fn clear_citation(&mut self) {
        self.active_citation = None;
    }

    /// Index of the highlighted citation
    pub fn active_citation(&self) -> Option<usize> {
        self.active_citation
    }

    /// Delete the conversation on the backend and locally
    ///
    /// A backend failure is logged; the local copy is removed regardless.
    pub async fn delete(self) {
        let Some(session_id) = self.session_id else {
            return;
        };

        if let Err(e) = self.backend.delete_session(&session_id).await {
            tracing::warn!(session_id = %session_id, "Backend session delete failed: {:#}", e);
        }
        self.store.delete_conversation(&session_id);
    }
}
