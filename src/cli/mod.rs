//! CLI module for routegen.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;
pub mod render;

pub use args::{Cli, Commands};
