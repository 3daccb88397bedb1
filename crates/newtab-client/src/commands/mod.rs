//! Subcommand implementations.

pub mod agenda;
pub mod config;
pub mod radio;
pub mod watch;
