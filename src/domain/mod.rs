//! Domain layer - Core chat model with no infrastructure dependencies
//! 
//! This layer contains:
//! - Entities: Core chat objects (User, Message, History, SearchCursor)
//! - Traits: The mediator abstraction every participant routes through

pub mod entities;
pub mod traits;
