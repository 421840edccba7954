//! In-memory chat mediator: a routing hub that delivers messages between
//! registered users, keeps per-user histories, supports a global undo,
//! per-user blocking and searching a history by correspondent.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::errors::{ChatError, CommandError, ConfigError};
pub use application::services::{ChatServer, DuplicatePolicy, Participant};
pub use domain::entities::{History, Message, MessageMemento, SearchCursor, User};
pub use domain::traits::{DeliveryOutcome, DeliveryReport, Mediator, Registration, SkipReason, UndoReport};
