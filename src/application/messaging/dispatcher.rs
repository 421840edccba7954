//! Command dispatcher - Runs chat commands against the server and renders replies

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use super::command::{ChatCommand, COMMANDS};
use super::parser::CommandParser;
use crate::application::errors::ChatError;
use crate::application::services::{ChatServer, Participant};
use crate::domain::entities::{Message, User};
use crate::domain::traits::{DeliveryOutcome, Mediator, Registration};

/// Handler result: the text shown to whoever issued the command
pub type HandlerResult = Result<String, ChatError>;

/// Routes parsed commands to the chat server
pub struct CommandDispatcher {
    parser: CommandParser,
    server: Arc<ChatServer>,
}

impl CommandDispatcher {
    pub fn new(prefix: impl Into<String>, server: Arc<ChatServer>) -> Self {
        Self {
            parser: CommandParser::new(prefix),
            server,
        }
    }

    pub fn server(&self) -> &Arc<ChatServer> {
        &self.server
    }

    /// Parse and run one line of console input
    pub fn process_text(&self, line: &str) -> HandlerResult {
        let command = self.parser.parse(line)?;
        self.execute(command)
    }

    pub fn execute(&self, command: ChatCommand) -> HandlerResult {
        tracing::debug!("Executing command: {}", command.name());

        match command {
            ChatCommand::Register { user, name } => {
                let mut entity = User::new(&user);
                if let Some(name) = name {
                    entity = entity.with_display_name(name);
                }
                match self.server.register(entity)? {
                    Registration::Registered => Ok(format!("Registered {}", user)),
                    Registration::Replaced(previous) => Ok(format!(
                        "Replaced {} ({} earlier messages dropped)",
                        user,
                        previous.history().len()
                    )),
                }
            }
            ChatCommand::Unregister { user } => match self.server.unregister(&user)? {
                Some(_) => Ok(format!("Unregistered {}", user)),
                None => Ok(format!("{} was not registered", user)),
            },
            ChatCommand::Send { from, to, body } => {
                let report = self.participant(&from).send(to, body)?;
                let mut reply = match report.outcome() {
                    DeliveryOutcome::Delivered { count } => format!(
                        "{} -> {}: delivered to {}",
                        from,
                        report.message.recipients().join(", "),
                        count
                    ),
                    DeliveryOutcome::NoDelivery => format!("{}: no delivery", from),
                };
                if !report.skipped.is_empty() {
                    let skipped: Vec<String> = report
                        .skipped
                        .iter()
                        .map(|(id, reason)| format!("{} [{}]", id, reason.as_str()))
                        .collect();
                    let _ = write!(reply, " (skipped: {})", skipped.join(", "));
                }
                Ok(reply)
            }
            ChatCommand::Block { user, target } => {
                if self.participant(&user).block(&target)? {
                    Ok(format!("{} blocked {}", user, target))
                } else {
                    Ok(format!("{} already blocks {}", user, target))
                }
            }
            ChatCommand::Unblock { user, target } => {
                if self.participant(&user).unblock(&target)? {
                    Ok(format!("{} unblocked {}", user, target))
                } else {
                    Ok(format!("{} was not blocking {}", user, target))
                }
            }
            ChatCommand::Undo { user } => {
                let report = self.participant(&user).undo_last()?;
                if report.is_empty() {
                    Ok("Nothing to undo".to_string())
                } else {
                    let mut reply = format!("Undo removed {} entries", report.len());
                    for (id, message) in &report.removed {
                        let _ = write!(reply, "\n  {}: {}", id, format_message(message));
                    }
                    Ok(reply)
                }
            }
            ChatCommand::History { user } => {
                let history = self.participant(&user).history()?;
                Ok(render_block(&format!("Chat history for {}:", user), history.iter().map(|m| &**m)))
            }
            ChatCommand::Search { user, correspondent } => {
                let cursor = self.participant(&user).search_by(&correspondent)?;
                let heading = format!("Messages for {} involving {}:", user, correspondent);
                let found: Vec<Arc<Message>> = cursor.collect();
                Ok(render_block(&heading, found.iter().map(|m| &**m)))
            }
            ChatCommand::Export { user } => {
                let history = self.server.history(&user)?;
                let messages: Vec<&Message> = history.iter().map(|m| &**m).collect();
                serde_json::to_string_pretty(&messages)
                    .map_err(|e| ChatError::Internal(format!("Failed to export history: {}", e)))
            }
            ChatCommand::Users => {
                let users = self.server.list_users()?;
                if users.is_empty() {
                    return Ok("No registered users".to_string());
                }
                let mut reply = format!("Registered users ({}):", users.len());
                for user in users {
                    let _ = write!(reply, "\n  {} - {} ({} messages)", user.id, user, user.history().len());
                }
                Ok(reply)
            }
            ChatCommand::Log => {
                let users = self.server.list_users()?;
                Ok(render_block("Chat App Log:", merged_log(&users).into_iter()))
            }
            ChatCommand::Help => {
                let mut help = "Available commands:".to_string();
                for (_, usage, description) in COMMANDS {
                    let _ = write!(help, "\n  {}{} - {}", self.parser.prefix(), usage, description);
                }
                Ok(help)
            }
        }
    }

    fn participant(&self, id: &str) -> Participant<ChatServer> {
        Participant::new(id, Arc::clone(&self.server))
    }
}

/// Every message held by `users`, each shared message once, in time order
fn merged_log(users: &[User]) -> Vec<&Message> {
    let mut seen = HashSet::new();
    let mut messages: Vec<&Message> = users
        .iter()
        .flat_map(|u| u.history().iter())
        .filter(|m| seen.insert(m.id()))
        .map(|m| &**m)
        .collect();
    messages.sort_by_key(|m| m.timestamp());
    messages
}

pub fn format_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp().format("%Y-%m-%d %H:%M:%S"),
        message.sender(),
        message.body()
    )
}

fn render_block<'a>(heading: &str, messages: impl Iterator<Item = &'a Message>) -> String {
    let mut out = heading.to_string();
    let mut empty = true;
    for message in messages {
        empty = false;
        let _ = write!(out, "\n{}", format_message(message));
    }
    if empty {
        out.push_str("\n(no messages)");
    }
    out
}
