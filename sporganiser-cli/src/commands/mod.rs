//! Subcommand implementations.

pub mod cache;
pub mod check;
pub mod common;
pub mod config;
pub mod prompt;
pub mod run;
