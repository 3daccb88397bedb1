//! CLI, configuration, refresh scheduler, agenda rendering
//!
//! This crate provides the `newtab` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod scheduler;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
