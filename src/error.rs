//! Error types for glu operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for glu operations
pub type Result<T> = std::result::Result<T, GluError>;

/// Main error type for all glu operations
#[derive(Error, Debug)]
pub enum GluError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// External command errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Build container errors
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Project metadata errors
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Target OS identifier the toolchain does not know
    #[error("Unknown target OS '{name}'")]
    UnknownTarget {
        /// Identifier as given on the command line
        name: String,
    },
}

/// Errors from shelled-out commands and filesystem steps
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command could not be started
    #[error("Failed to start `{command}`: {source}")]
    SpawnFailed {
        /// Traced command line
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Command exited with a non-zero status
    #[error("`{command}` exited with status {code}")]
    Failed {
        /// Traced command line
        command: String,
        /// Exit code (-1 when killed by a signal)
        code: i32,
    },

    /// Filesystem step failed
    #[error("{operation} failed for {path}: {source}")]
    Filesystem {
        /// Step that failed (e.g. "mkdir -p")
        operation: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be written
    #[error("Failed to write archive {path}: {reason}")]
    Archive {
        /// Archive path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Build container errors
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Replacing the process image failed after the binary was found
    #[error("Failed to exec {binary}: {source}")]
    ExecFailed {
        /// Binary that was executed
        binary: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Container runtime answered with something we could not read
    #[error("Unexpected output from `{command}`: {reason}")]
    UnexpectedOutput {
        /// Runtime command
        command: String,
        /// Reason for the error
        reason: String,
    },
}

/// Project metadata errors
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Working directory has no usable basename
    #[error("Cannot derive a project name from {path}")]
    NoName {
        /// Directory inspected
        path: PathBuf,
    },

    /// Git metadata lookup failed
    #[error("Git lookup failed: {reason}")]
    Git {
        /// Reason for the error
        reason: String,
    },
}

impl GluError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            GluError::Cli(CliError::UnknownTarget { .. }) => vec![
                "Use Go's GOOS names, e.g. linux,darwin,windows".to_string(),
                "List them with: go tool dist list".to_string(),
            ],
            GluError::Command(CommandError::SpawnFailed { command, .. }) => vec![format!(
                "Make sure the program for `{}` is installed and on PATH",
                command
            )],
            GluError::Container(ContainerError::ExecFailed { .. }) => vec![
                "Check that the glu container is still running: docker ps".to_string(),
                "Set GLU_CONTAINER=true to skip the container and build locally".to_string(),
            ],
            GluError::Project(ProjectError::Git { .. }) => vec![
                "Run glu from the root of a git checkout".to_string(),
                "Add a VERSION file to pin the embedded version".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
