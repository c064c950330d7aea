//! Client for the legal question-answering backend
//!
//! [`QaBackend`] is the seam the chat session talks to; [`HttpBackend`] is
//! the reqwest implementation.

use crate::config::BackendConfig;
use crate::error::{LexchatError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use std::time::Duration;

pub mod types;
pub use types::{AnswerResponse, AskRequest, ChatHistoryResponse, HistoryMessage};

/// Operations the chat view needs from the backend
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Ask a question, optionally within an existing session
    async fn ask(&self, question: &str, session_id: Option<&str>) -> Result<AnswerResponse>;

    /// Fetch the server-side history of a session
    async fn chat_history(&self, session_id: &str) -> Result<ChatHistoryResponse>;

    /// Delete a session on the server
    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// HTTP implementation of [`QaBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            LexchatError::Config(format!("Invalid backend URL {}: {}", config.base_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(LexchatError::Config(format!(
                "Backend URL cannot be used as a base: {}",
                config.base_url
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("lexchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LexchatError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized backend client: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// The base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LexchatError::Config("Backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check_status(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("{} returned error {}: {}", what, status, error_text);
            return Err(LexchatError::Backend(format!(
                "{} returned error {}: {}",
                what, status, error_text
            ))
            .into());
        }
        Ok(response)
    }
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn ask(&self, question: &str, session_id: Option<&str>) -> Result<AnswerResponse> {
        let url = self.endpoint(&["api", "ask"])?;
        tracing::debug!(session_id = ?session_id, "Sending question to {}", url);

        let response = self
            .client
            .post(url)
            .json(&AskRequest {
                question,
                session_id,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ask request failed: {}", e);
                LexchatError::Backend(format!("Ask request failed: {}", e))
            })?;

        let response = Self::check_status(response, "Ask endpoint").await?;

        let answer: AnswerResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse answer: {}", e);
            LexchatError::Backend(format!("Failed to parse answer: {}", e))
        })?;

        tracing::debug!(
            citations = answer.citations.len(),
            processing_time_ms = ?answer.processing_time_ms,
            "Received answer"
        );
        Ok(answer)
    }

    async fn chat_history(&self, session_id: &str) -> Result<ChatHistoryResponse> {
        let url = self.endpoint(&["api", "chat", "history", session_id])?;
        tracing::debug!("Fetching chat history from {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("Chat history request failed: {}", e);
            LexchatError::Backend(format!("Chat history request failed: {}", e))
        })?;

        let response = Self::check_status(response, "Chat history endpoint").await?;

        response.json().await.map_err(|e| {
            LexchatError::Backend(format!("Failed to parse chat history: {}", e)).into()
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "chat", "sessions", session_id])?;
        tracing::debug!("Deleting session at {}", url);

        let response = self.client.delete(url).send().await.map_err(|e| {
            LexchatError::Backend(format!("Delete session request failed: {}", e))
        })?;

        Self::check_status(response, "Delete session endpoint").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = backend("http://localhost:8000").endpoint(&["api", "ask"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/ask");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_trailing_slash() {
        let url = backend("https://example.id/legal/")
            .endpoint(&["api", "ask"])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.id/legal/api/ask");
    }

    #[test]
    fn test_endpoint_escapes_session_id() {
        let url = backend("http://localhost:8000")
            .endpoint(&["api", "chat", "history", "a/b c"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/chat/history/a%2Fb%20c");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = HttpBackend::new(&BackendConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_non_base_url() {
        let result = HttpBackend::new(&BackendConfig {
            base_url: "mailto:someone@example.id".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
