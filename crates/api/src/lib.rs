//! # Tripline App
//!
//! Composition root and command-line front end.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Command handlers returning JSON
//! - The clap command-line definition
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use cli::{Cli, Command};
pub use context::*;
