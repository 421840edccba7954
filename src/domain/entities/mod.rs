//! Domain entities - Core chat objects with no infrastructure dependencies

pub mod user;
pub mod message;
pub mod history;
pub mod search;

pub use user::User;
pub use message::{Message, MessageMemento};
pub use history::History;
pub use search::SearchCursor;
