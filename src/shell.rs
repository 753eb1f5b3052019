//! Traced execution of external commands.
//!
//! Every command is a value carrying its own environment overlay and working
//! directory; the process environment is never mutated. Commands are printed
//! before they run and their output is streamed straight to the terminal.

use crate::cli::OutputManager;
use crate::error::{CommandError, Result};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// A command line plus the environment it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    /// Program to run, resolved through PATH
    pub program: String,
    /// Arguments, passed without shell interpretation
    pub args: Vec<String>,
    /// Variables added to the inherited environment
    pub envs: Vec<(String, String)>,
    /// Working directory; inherited when `None`
    pub cwd: Option<PathBuf>,
}

impl ShellCommand {
    /// Start a command for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a variable, replacing an earlier value for the same key
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.envs.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.envs.push((key, value)),
        }
        self
    }

    /// Add every variable of an overlay
    pub fn envs<'a>(self, overlay: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        overlay
            .into_iter()
            .fold(self, |cmd, (key, value)| cmd.env(key.clone(), value.clone()))
    }

    /// Run in `dir`
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Value of a variable in the overlay
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn quote(word: &str) -> String {
    if word.is_empty() || word.contains(char::is_whitespace) {
        format!("\"{}\"", word)
    } else {
        word.to_string()
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key, quote(value))?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Runs commands, failing on the first non-zero exit.
pub trait CommandRunner {
    /// Trace and run a command to completion
    fn run(&self, command: &ShellCommand) -> impl Future<Output = Result<()>>;

    /// Trace a step that is performed in-process (mkdir, copy, archive)
    fn trace(&self, step: &str);
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    output: OutputManager,
}

impl SystemRunner {
    /// Create a runner that traces through `output`
    pub fn new(output: OutputManager) -> Self {
        Self { output }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, command: &ShellCommand) -> Result<()> {
        let line = command.to_string();
        self.output.trace(&line);

        let mut child = Command::new(&command.program);
        child
            .args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &command.cwd {
            child.current_dir(dir);
        }

        let status = child
            .status()
            .await
            .map_err(|source| CommandError::SpawnFailed {
                command: line.clone(),
                source,
            })?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            log::debug!("`{}` exited with {}", line, code);
            return Err(CommandError::Failed {
                command: line,
                code,
            }
            .into());
        }

        Ok(())
    }

    fn trace(&self, step: &str) {
        self.output.trace(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GluError;

    #[test]
    fn test_display_quotes_words_with_spaces() {
        let cmd = ShellCommand::new("go")
            .args(["build", "-ldflags", "-X main.Version=1.2.0"])
            .env("GOOS", "linux");
        assert_eq!(
            cmd.to_string(),
            "GOOS=linux go build -ldflags \"-X main.Version=1.2.0\""
        );
    }

    #[test]
    fn test_env_overrides_earlier_value() {
        let cmd = ShellCommand::new("go")
            .env("GOOS", "linux")
            .env("GOOS", "darwin");
        assert_eq!(cmd.envs.len(), 1);
        assert_eq!(cmd.env_value("GOOS"), Some("darwin"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let runner = SystemRunner::new(OutputManager::new(true));
        let err = runner
            .run(&ShellCommand::new("sh").args(["-c", "exit 3"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GluError::Command(CommandError::Failed { code: 3, .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overlay_and_cwd_reach_the_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = SystemRunner::new(OutputManager::new(true));
        runner
            .run(
                &ShellCommand::new("sh")
                    .args(["-c", "echo \"$GLU_PROBE\" > probe.txt"])
                    .env("GLU_PROBE", "overlay")
                    .current_dir(dir.path()),
            )
            .await
            .unwrap();
        let written = std::fs::read_to_string(dir.path().join("probe.txt")).unwrap();
        assert_eq!(written.trim(), "overlay");
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let runner = SystemRunner::new(OutputManager::new(true));
        let err = runner
            .run(&ShellCommand::new("glu-definitely-not-installed"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GluError::Command(CommandError::SpawnFailed { .. })
        ));
    }
}
