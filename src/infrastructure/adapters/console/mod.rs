//! Console adapter for local, interactive sessions

use std::io::{self, BufRead, Write};

use crate::application::messaging::CommandDispatcher;

/// Line-oriented console: one command per line, replies written back
pub struct ConsoleAdapter {
    dispatcher: CommandDispatcher,
    prompt: String,
}

impl ConsoleAdapter {
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self {
            dispatcher,
            prompt: "> ".to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Read commands until EOF or `quit`. Command errors are printed and the
    /// session carries on; only I/O errors end it early.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        tracing::info!("Starting console session");
        write!(output, "{}", self.prompt)?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();

            if matches!(trimmed, "quit" | "exit" | "/quit" | "/exit") {
                break;
            }

            if !trimmed.is_empty() {
                match self.dispatcher.process_text(trimmed) {
                    Ok(reply) => writeln!(output, "{}", reply)?,
                    Err(e) => writeln!(output, "error: {}", e)?,
                }
            }

            write!(output, "{}", self.prompt)?;
            output.flush()?;
        }

        writeln!(output)?;
        tracing::info!("Console session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::ChatServer;
    use std::io::Cursor;
    use std::sync::Arc;

    fn console() -> ConsoleAdapter {
        ConsoleAdapter::new(CommandDispatcher::new("/", Arc::new(ChatServer::default()))).with_prompt("")
    }

    #[test]
    fn test_session_transcript() {
        let input = "/register a\n/register b\n\n/send a b hello\n/history b\n";
        let mut out = Vec::new();

        console().run(Cursor::new(input), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Registered a"));
        assert!(text.contains("a -> b: delivered to 1"));
        assert!(text.contains("] a: hello"));
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let input = "/nope\n/history ghost\n/register a\n";
        let mut out = Vec::new();

        console().run(Cursor::new(input), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("error: Command error: Command not found: nope"));
        assert!(text.contains("error: Unknown user: ghost"));
        assert!(text.contains("Registered a"));
    }

    #[test]
    fn test_quit_stops_reading() {
        let input = "/register a\nquit\n/register b\n";
        let mut out = Vec::new();
        let adapter = console();

        adapter.run(Cursor::new(input), &mut out).unwrap();

        assert_eq!(adapter.dispatcher().server().user_count().unwrap(), 1);
    }
}
