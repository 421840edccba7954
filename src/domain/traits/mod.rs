//! Domain traits - Abstractions implemented by application services

pub mod mediator;

pub use mediator::{DeliveryOutcome, DeliveryReport, Mediator, Registration, SkipReason, UndoReport};
