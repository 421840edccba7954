//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Script: Scripted sessions for the `run` command
//! - Adapters: Driver front ends (console)

pub mod config;
pub mod script;
pub mod adapters;
