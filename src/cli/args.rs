//! Command line argument parsing.

use clap::{Parser, Subcommand};

/// Build helper for Go projects
#[derive(Parser, Debug)]
#[command(
    name = "glu",
    version,
    about = "Build helper for Go projects",
    long_about = "Cross-compiles Go projects for a list of target operating systems.

When a container named `glu` is running, commands are re-run inside it and
the outputs are archived into /artifacts.

Usage:
  glu build linux,darwin
  glu build linux,darwin,windows ./cmd/tool tool"
)]
pub struct Args {
    /// Suppress command traces and progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Builds a Go project for every OS in <OS-LIST>
    Build {
        /// Comma-separated target OS list, e.g. linux,darwin
        #[arg(value_name = "OS-LIST")]
        os_list: String,

        /// Packages to build
        #[arg(value_name = "PKGS")]
        pkgs: Option<String>,

        /// Binary name (defaults to the project name)
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },

    /// Prints the project metadata a build would use
    Info,
}

impl Command {
    /// Name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Build { .. } => "build",
            Command::Info => "info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_positionals() {
        let args =
            Args::try_parse_from(["glu", "build", "linux,darwin", "./cmd/tool", "tool"]).unwrap();
        assert_eq!(
            args.command,
            Command::Build {
                os_list: "linux,darwin".to_string(),
                pkgs: Some("./cmd/tool".to_string()),
                name: Some("tool".to_string()),
            }
        );
        assert!(!args.quiet);
    }

    #[test]
    fn test_build_requires_os_list() {
        let err = Args::try_parse_from(["glu", "build"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_quiet_after_subcommand() {
        let args = Args::try_parse_from(["glu", "build", "linux", "-q"]).unwrap();
        assert!(args.quiet);
    }
}
