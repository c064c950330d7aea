use crate::backend::{HttpBackend, QaBackend};
use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use chrono::Local;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub async fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let mut store = super::open_store(config)?;

    match command {
        HistoryCommand::List { json } => {
            let groups = store.list_grouped();

            if json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
                return Ok(());
            }

            if groups.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            for group in groups {
                let mut table = Table::new();
                table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
                table.add_row(prettytable::row![
                    "ID".bold(),
                    "Title".bold(),
                    "Last Updated".bold()
                ]);

                for conversation in group.conversations {
                    let id_short: String = conversation.id.chars().take(8).collect();
                    let updated = conversation
                        .updated_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string();
                    table.add_row(prettytable::row![id_short.cyan(), conversation.title, updated]);
                }

                println!("\n{}:", group.label.label().bold());
                table.printstd();
            }

            println!();
            println!(
                "Use {} to continue a conversation.",
                "lexchat ask --session <ID> <QUESTION>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let Some(messages) = store.load_messages(&id) else {
                println!("{}", format!("No cached messages for {}", id).yellow());
                return Ok(());
            };

            if let Some(meta) = store.get_conversation(&id) {
                println!("\n{}", meta.title.bold());
            }
            println!();
            for message in &messages {
                super::ask::print_message(message);
                println!();
            }
        }
        HistoryCommand::Delete { id, local_only } => {
            let known_locally =
                store.get_conversation(&id).is_some() || store.load_messages(&id).is_some();

            if !local_only {
                let backend = HttpBackend::new(&config.backend)?;
                if let Err(e) = backend.delete_session(&id).await {
                    tracing::warn!(session_id = %id, "Backend session delete failed: {:#}", e);
                    println!(
                        "{}",
                        "Could not delete the session on the server; removing the local copy only."
                            .yellow()
                    );
                }
            }
            if !known_locally {
                println!("{}", format!("Conversation {} not found", id).yellow());
                return Ok(());
            }
            store.delete_conversation(&id);
            println!("{}", format!("Deleted conversation {}", id).green());
        }
        HistoryCommand::Clear => {
            store.clear();
            println!("{}", "Cleared all local conversations.".green());
        }
    }

    Ok(())
}
