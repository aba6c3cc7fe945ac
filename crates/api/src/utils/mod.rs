//! Command plumbing shared by the CLI entry points

pub mod command_helpers;
pub mod logging;
