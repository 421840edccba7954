//! Application services - Mediator and participant orchestration

pub mod chat_server;
pub mod participant;

pub use chat_server::{ChatServer, DuplicatePolicy};
pub use participant::Participant;
