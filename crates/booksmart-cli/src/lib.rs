//! CLI, store selection and output rendering
//!
//! This crate provides the `booksmart` command-line interface.

pub mod cli;
pub mod commands;
pub mod error;
pub mod render;

pub use cli::Cli;
pub use error::{CliError, CliResult};
