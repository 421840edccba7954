//! Driver adapters

pub mod console;
