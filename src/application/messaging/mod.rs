//! Command handling - Text and scripted commands driving the chat server

pub mod command;
pub mod dispatcher;
pub mod parser;

pub use command::ChatCommand;
pub use dispatcher::CommandDispatcher;
pub use parser::CommandParser;
