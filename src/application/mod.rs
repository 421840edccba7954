//! Application layer - Use cases and chat orchestration
//! 
//! This layer contains:
//! - Services: The chat server (mediator) and participant handles
//! - Errors: Domain-specific errors
//! - Messaging: Command parsing and dispatching for the drivers

pub mod errors;
pub mod services;
pub mod messaging;
