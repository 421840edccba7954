//! Command parser - Turns console lines into chat commands

use super::command::ChatCommand;
use crate::application::errors::CommandError;

/// Parses console input such as `/send alice bob,carol hello there`
pub struct CommandParser {
    command_prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse a line; the prefix is optional
    pub fn parse(&self, line: &str) -> Result<ChatCommand, CommandError> {
        let line = line.trim();
        let line = if !self.command_prefix.is_empty() && line.starts_with(&self.command_prefix) {
            &line[self.command_prefix.len()..]
        } else {
            line.trim_start_matches('/')
        };

        let (name, rest) = next_token(line).ok_or(CommandError::Empty)?;

        match name.to_lowercase().as_str() {
            "register" => {
                let (user, rest) = required(rest, "user")?;
                let name = Some(rest.trim()).filter(|s| !s.is_empty()).map(str::to_string);
                Ok(ChatCommand::Register { user: user.to_string(), name })
            }
            "unregister" => Ok(ChatCommand::Unregister { user: single(rest, "user")? }),
            "send" => {
                let (from, rest) = required(rest, "sender")?;
                let (to, rest) = required(rest, "recipients")?;
                let body = rest.trim();
                if body.is_empty() {
                    return Err(CommandError::MissingArgument("body".to_string()));
                }
                let to: Vec<String> = to
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if to.is_empty() {
                    return Err(CommandError::InvalidArgs("no recipients given".to_string()));
                }
                Ok(ChatCommand::Send { from: from.to_string(), to, body: body.to_string() })
            }
            "block" => {
                let (user, target) = pair(rest, "target")?;
                Ok(ChatCommand::Block { user, target })
            }
            "unblock" => {
                let (user, target) = pair(rest, "target")?;
                Ok(ChatCommand::Unblock { user, target })
            }
            "undo" => Ok(ChatCommand::Undo { user: single(rest, "user")? }),
            "history" => Ok(ChatCommand::History { user: single(rest, "user")? }),
            "search" => {
                let (user, correspondent) = pair(rest, "correspondent")?;
                Ok(ChatCommand::Search { user, correspondent })
            }
            "export" => Ok(ChatCommand::Export { user: single(rest, "user")? }),
            "users" => Ok(ChatCommand::Users),
            "log" => Ok(ChatCommand::Log),
            "help" | "?" => Ok(ChatCommand::Help),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Split off the first whitespace-delimited token
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(idx) => Some((&input[..idx], &input[idx..])),
        None => Some((input, "")),
    }
}

fn required<'a>(input: &'a str, what: &str) -> Result<(&'a str, &'a str), CommandError> {
    next_token(input).ok_or_else(|| CommandError::MissingArgument(what.to_string()))
}

fn single(input: &str, what: &str) -> Result<String, CommandError> {
    let (value, rest) = required(input, what)?;
    if !rest.trim().is_empty() {
        return Err(CommandError::InvalidArgs(format!("unexpected '{}'", rest.trim())));
    }
    Ok(value.to_string())
}

fn pair(input: &str, second: &str) -> Result<(String, String), CommandError> {
    let (first, rest) = required(input, "user")?;
    Ok((first.to_string(), single(rest, second)?))
}
