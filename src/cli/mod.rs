//! Command line interface for glu.
//!
//! This module parses arguments, dispatches commands, and maps the outcome
//! to a process exit code.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;
use clap::Parser;

/// Main CLI entry point.
///
/// `argv` is the full command line, program name included. Usage errors are
/// printed here and turned into clap's exit code.
pub async fn run(argv: Vec<String>) -> Result<i32> {
    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return Ok(e.exit_code());
        }
    };

    let forwarded = argv.get(1..).unwrap_or_default().to_vec();
    execute_command(args, forwarded).await
}
