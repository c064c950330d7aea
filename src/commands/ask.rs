//! `lexchat ask`: one question, one answer

use super::segment::render_segments;
use crate::backend::HttpBackend;
use crate::chat::{ChatSession, LoadSource};
use crate::citation_parser;
use crate::config::Config;
use crate::error::Result;
use crate::message::{Confidence, Message};
use colored::Colorize;

/// Handle the ask command
///
/// With `session` the question continues that conversation (its messages are
/// loaded from the cache or the backend first); otherwise a new conversation
/// is started.
pub async fn run_ask(
    config: &Config,
    question: &str,
    session: Option<&str>,
    json: bool,
) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    let mut store = super::open_store(config)?;

    let mut chat = match session {
        Some(id) => {
            let (chat, source) = ChatSession::open(&mut store, &backend, id).await;
            if source == LoadSource::Empty {
                tracing::info!(session_id = id, "No earlier messages found for session");
            }
            chat
        }
        None => ChatSession::new(&mut store, &backend),
    };

    let answer = chat.ask(question).await?.clone();

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!();
    print_message(&answer);
    if let Some(id) = chat.session_id() {
        println!("{} {}", "Session:".dimmed(), id.cyan());
    }
    println!();

    Ok(())
}

/// Print a message with its citations and answer metadata
pub fn print_message(message: &Message) {
    if !message.is_assistant() {
        println!("{} {}", "You:".bold().green(), message.content);
        return;
    }

    let segments = citation_parser::segment(&message.content, message.citations.len());
    println!("{} {}", "Answer:".bold().blue(), render_segments(&segments));

    if !message.citations.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        let cited = citation_parser::cited_indices(&message.content, message.citations.len());
        for (index, citation) in message.citations.iter().enumerate() {
            let marker = if cited.contains(&index) {
                format!("[{}]", index + 1).cyan()
            } else {
                format!("[{}]", index + 1).dimmed()
            };
            match &citation.url {
                Some(url) => println!("  {} {} {}", marker, citation.label(), url.dimmed()),
                None => println!("  {} {}", marker, citation.label()),
            }
        }
    }

    if let Some(confidence) = message.confidence {
        let label = match confidence {
            Confidence::High => "high".green(),
            Confidence::Medium => "medium".yellow(),
            Confidence::Low => "low".red(),
            Confidence::Unknown => "unknown".normal(),
        };
        match message.confidence_score {
            Some(score) => println!("{} {} ({:.2})", "Confidence:".dimmed(), label, score),
            None => println!("{} {}", "Confidence:".dimmed(), label),
        }
    }

    if let Some(validation) = &message.validation {
        for warning in &validation.warnings {
            println!("{} {}", "Warning:".yellow(), warning);
        }
    }
}
