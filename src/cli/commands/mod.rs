//! Command execution functions.
//!
//! Each command reports its own progress; failures are printed here with
//! recovery suggestions and turned into exit code 1.

mod build;
mod info;

use crate::cli::{Args, Command, OutputManager};
use crate::error::Result;

use build::execute_build;
use info::execute_info;

/// Execute the command named by `args`.
///
/// `forwarded` is the command line without the program name, replayed when
/// the build is delegated into the container.
pub async fn execute_command(args: Args, forwarded: Vec<String>) -> Result<i32> {
    let output = OutputManager::new(args.quiet);

    let result = match &args.command {
        Command::Build {
            os_list,
            pkgs,
            name,
        } => execute_build(os_list, pkgs.clone(), name.clone(), &forwarded, &output).await,
        Command::Info => execute_info(&output).map(|()| 0),
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            output.error(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.println(&format!("  • {}", suggestion));
                }
            }

            Ok(1)
        }
    }
}
