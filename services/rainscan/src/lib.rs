//! `rainscan` command-line front end.
//!
//! Argument definitions live in [`cli`]; [`commands`] runs them against any
//! archive connector and writes results to a caller-supplied sink.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
pub use commands::{execute, Context};
