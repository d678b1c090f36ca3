//! Pulse node library.
//!
//! Command-line parsing, configuration and the interactive prompt used by
//! the `pulse-node` binary. Exposed as a library for testing.

pub mod cli;
pub mod commands;
pub mod config;
pub mod prompt;
pub mod shutdown;
