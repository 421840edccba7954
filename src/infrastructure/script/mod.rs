//! Session scripts - YAML lists of chat commands replayed by the `run` command

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::messaging::dispatcher::HandlerResult;
use crate::application::messaging::{ChatCommand, CommandDispatcher};

/// A scripted chat session
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ChatCommand>,
}

/// Counts from a script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
}

impl Script {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse script: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize script: {}", e)))
    }

    /// Three users chatting, one global undo, then a block
    pub fn demo() -> Self {
        let users = ["Michael", "Ashley", "Clay"];
        let show_all = || users.iter().map(|u| ChatCommand::History { user: u.to_string() });

        let mut steps: Vec<ChatCommand> = users
            .iter()
            .map(|u| ChatCommand::Register { user: u.to_string(), name: None })
            .collect();

        steps.extend([
            ChatCommand::send("Michael", &["Ashley", "Clay"], "Hello Ashley and Clay"),
            ChatCommand::send("Ashley", &["Michael"], "Hi Michael"),
            ChatCommand::send("Ashley", &["Clay"], "Hey Clay"),
            ChatCommand::send("Clay", &["Michael"], "Yo Michael"),
            ChatCommand::send("Clay", &["Ashley"], "What's up Ashley"),
            ChatCommand::send("Ashley", &["Michael", "Clay"], "Clay why is Michael messaging us..."),
            ChatCommand::Log,
        ]);
        steps.extend(show_all());

        steps.push(ChatCommand::Undo { user: "Ashley".to_string() });
        steps.extend(show_all());

        steps.extend([
            ChatCommand::send("Ashley", &["Michael", "Clay"], "omg sorry I meant to send that to just Clay"),
            ChatCommand::Block { user: "Michael".to_string(), target: "Ashley".to_string() },
            ChatCommand::send("Ashley", &["Michael", "Clay"], "Clay I think Michael blocked me..."),
            ChatCommand::send("Ashley", &["Michael", "Clay"], "Michael, hello?"),
            ChatCommand::send("Clay", &["Michael", "Ashley"], "Michael did you block Ashley?"),
            ChatCommand::send("Michael", &["Clay"], "Yep"),
        ]);
        steps.extend(show_all());

        Self {
            name: Some("demo".to_string()),
            steps,
        }
    }

    /// Execute every step, handing each reply to `emit`. Failed steps are
    /// reported and skipped; the run continues.
    pub fn run(&self, dispatcher: &CommandDispatcher, mut emit: impl FnMut(&ChatCommand, &HandlerResult)) -> ScriptSummary {
        let mut summary = ScriptSummary::default();

        for step in &self.steps {
            let result = dispatcher.execute(step.clone());
            if let Err(e) = &result {
                tracing::warn!("Step '{}' failed: {}", step.name(), e);
                summary.failed += 1;
            }
            summary.executed += 1;
            emit(step, &result);
        }

        tracing::info!(
            "Script {} finished: {} steps, {} failed",
            self.name.as_deref().unwrap_or("<unnamed>"),
            summary.executed,
            summary.failed
        );
        summary
    }
}
