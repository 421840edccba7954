//! Commands understood by the console and by session scripts

use serde::{Deserialize, Serialize};

/// One driver action against the chat server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ChatCommand {
    Register {
        user: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Unregister {
        user: String,
    },
    Send {
        from: String,
        to: Vec<String>,
        body: String,
    },
    Block {
        user: String,
        target: String,
    },
    Unblock {
        user: String,
        target: String,
    },
    Undo {
        user: String,
    },
    History {
        user: String,
    },
    Search {
        user: String,
        correspondent: String,
    },
    Export {
        user: String,
    },
    Users,
    Log,
    Help,
}

/// Name, usage and description for every command, in help order
pub const COMMANDS: &[(&str, &str, &str)] = &[
    ("register", "register <user> [display name]", "Register a user"),
    ("unregister", "unregister <user>", "Remove a user from routing"),
    ("send", "send <from> <to1,to2,...> <body>", "Send a message"),
    ("block", "block <user> <target>", "Stop messages from target reaching user"),
    ("unblock", "unblock <user> <target>", "Lift a block"),
    ("undo", "undo <user>", "Drop the last history entry of every user"),
    ("history", "history <user>", "Show a user's history"),
    ("search", "search <user> <correspondent>", "Show history entries involving a correspondent"),
    ("export", "export <user>", "Print a user's history as JSON"),
    ("users", "users", "List registered users"),
    ("log", "log", "Show every message in time order"),
    ("help", "help", "Show this message"),
];

impl ChatCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ChatCommand::Register { .. } => "register",
            ChatCommand::Unregister { .. } => "unregister",
            ChatCommand::Send { .. } => "send",
            ChatCommand::Block { .. } => "block",
            ChatCommand::Unblock { .. } => "unblock",
            ChatCommand::Undo { .. } => "undo",
            ChatCommand::History { .. } => "history",
            ChatCommand::Search { .. } => "search",
            ChatCommand::Export { .. } => "export",
            ChatCommand::Users => "users",
            ChatCommand::Log => "log",
            ChatCommand::Help => "help",
        }
    }

    pub fn send(from: impl Into<String>, to: &[&str], body: impl Into<String>) -> Self {
        ChatCommand::Send {
            from: from.into(),
            to: to.iter().map(|s| s.to_string()).collect(),
            body: body.into(),
        }
    }
}
