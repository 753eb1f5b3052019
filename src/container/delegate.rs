//! Re-running glu inside the build container.
//!
//! When a `glu` container is running and we are not already inside it, the
//! current process is replaced by one that repeats the same command in the
//! container. Under CircleCI, where `docker exec` is unavailable, the
//! container's namespace is entered with `lxc-attach` through sudo.

use super::runtime::ContainerRuntime;
use crate::cli::OutputManager;
use crate::config::{BuildConfig, BuildEnvironment, CONTAINER_MARKER, CiProvider};
use crate::error::{ContainerError, Result};
use std::path::{Path, PathBuf};

/// Outcome of [`try_container`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
    /// The command ran in the container and exited with this code
    Delegated(i32),
    /// Build here
    NotDelegated,
}

/// A process image to switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCommand {
    /// Resolved path of the program
    pub binary: PathBuf,
    /// Full argument vector, `argv[0]` included
    pub argv: Vec<String>,
    /// Variables added to the forwarded environment
    pub envs: Vec<(String, String)>,
}

/// Binary lookup and process replacement.
pub trait ProcessHost {
    /// Resolve `binary` through PATH
    fn locate(&self, binary: &str) -> Option<PathBuf>;

    /// Replace the current process with `command`.
    ///
    /// On Unix this only returns when exec fails. Elsewhere the command runs
    /// as a child and its exit code is returned.
    fn replace(&self, command: &ExecCommand) -> Result<i32>;
}

/// The real process
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl ProcessHost for SystemHost {
    fn locate(&self, binary: &str) -> Option<PathBuf> {
        match which::which(binary) {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("{} not found in PATH: {}", binary, e);
                None
            }
        }
    }

    #[cfg(unix)]
    fn replace(&self, command: &ExecCommand) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        let mut process = std::process::Command::new(&command.binary);
        if let Some((argv0, rest)) = command.argv.split_first() {
            process.arg0(argv0).args(rest);
        }
        process.envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let source = process.exec();
        Err(exec_failed(&command.binary, source).into())
    }

    #[cfg(not(unix))]
    fn replace(&self, command: &ExecCommand) -> Result<i32> {
        let status = std::process::Command::new(&command.binary)
            .args(command.argv.iter().skip(1))
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .map_err(|source| exec_failed(&command.binary, source))?;
        Ok(status.code().unwrap_or(1))
    }
}

fn exec_failed(binary: &Path, source: std::io::Error) -> ContainerError {
    ContainerError::ExecFailed {
        binary: binary.to_path_buf(),
        source,
    }
}

/// Re-run the current command inside the build container, if there is one.
///
/// `forwarded_args` is the original command line without the program name.
/// A missing `sudo` or `docker` binary abandons delegation silently.
pub async fn try_container<R, H>(
    config: &BuildConfig,
    env: &BuildEnvironment,
    runtime: &R,
    host: &H,
    output: &OutputManager,
    forwarded_args: &[String],
) -> Result<Delegation>
where
    R: ContainerRuntime,
    H: ProcessHost,
{
    if env.inside_container {
        return Ok(Delegation::NotDelegated);
    }

    let Some(container_id) = runtime.find_container(&config.container_name).await? else {
        return Ok(Delegation::NotDelegated);
    };

    output.notice(&format!("Using {} container", config.container_name));

    let Some(command) = delegation_command(config, env, host, &container_id, forwarded_args)
    else {
        return Ok(Delegation::NotDelegated);
    };

    log::debug!("replacing process with {:?}", command.argv);
    let code = host.replace(&command)?;
    Ok(Delegation::Delegated(code))
}

fn delegation_command<H: ProcessHost>(
    config: &BuildConfig,
    env: &BuildEnvironment,
    host: &H,
    container_id: &str,
    forwarded_args: &[String],
) -> Option<ExecCommand> {
    match env.ci {
        CiProvider::CircleCi => {
            let binary = host.locate("sudo")?;
            let mut argv: Vec<String> = ["sudo", "-E", "lxc-attach", "-n", container_id, "--"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            argv.push(config.container_binary.display().to_string());
            argv.extend(forwarded_args.iter().cloned());
            Some(ExecCommand {
                binary,
                argv,
                envs: vec![(CONTAINER_MARKER.to_string(), "true".to_string())],
            })
        }
        CiProvider::Other => {
            let binary = host.locate("docker")?;
            let mut argv = vec![
                "docker".to_string(),
                "exec".to_string(),
                config.container_name.clone(),
                config.program_name.clone(),
            ];
            argv.extend(forwarded_args.iter().cloned());
            Some(ExecCommand {
                binary,
                argv,
                envs: Vec::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GluError;
    use std::cell::{Cell, RefCell};

    struct FakeRuntime {
        container: Option<String>,
        queries: Cell<usize>,
    }

    impl FakeRuntime {
        fn with(container: Option<&str>) -> Self {
            Self {
                container: container.map(str::to_string),
                queries: Cell::new(0),
            }
        }
    }

    impl ContainerRuntime for FakeRuntime {
        async fn find_container(&self, _name: &str) -> Result<Option<String>> {
            self.queries.set(self.queries.get() + 1);
            Ok(self.container.clone())
        }
    }

    #[derive(Default)]
    struct FakeHost {
        binaries: Vec<&'static str>,
        replaced: RefCell<Vec<ExecCommand>>,
    }

    impl ProcessHost for FakeHost {
        fn locate(&self, binary: &str) -> Option<PathBuf> {
            self.binaries
                .contains(&binary)
                .then(|| PathBuf::from("/usr/bin").join(binary))
        }

        fn replace(&self, command: &ExecCommand) -> Result<i32> {
            self.replaced.borrow_mut().push(command.clone());
            Ok(0)
        }
    }

    fn args() -> Vec<String> {
        ["build", "linux,darwin", "./cmd/tool", "tool"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn circleci() -> BuildEnvironment {
        BuildEnvironment {
            inside_container: false,
            ci: CiProvider::CircleCi,
        }
    }

    #[tokio::test]
    async fn test_inside_container_never_queries_runtime() {
        let runtime = FakeRuntime::with(Some("4f1c0e8a9b2d"));
        let host = FakeHost {
            binaries: vec!["docker"],
            ..Default::default()
        };
        let env = BuildEnvironment {
            inside_container: true,
            ci: CiProvider::Other,
        };

        let outcome = try_container(
            &BuildConfig::default(),
            &env,
            &runtime,
            &host,
            &OutputManager::new(true),
            &args(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Delegation::NotDelegated);
        assert_eq!(runtime.queries.get(), 0);
        assert!(host.replaced.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_no_container_builds_locally() {
        let runtime = FakeRuntime::with(None);
        let host = FakeHost {
            binaries: vec!["docker"],
            ..Default::default()
        };

        let outcome = try_container(
            &BuildConfig::default(),
            &BuildEnvironment::host(),
            &runtime,
            &host,
            &OutputManager::new(true),
            &args(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Delegation::NotDelegated);
        assert_eq!(runtime.queries.get(), 1);
        assert!(host.replaced.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_docker_exec_forwards_full_command() {
        let runtime = FakeRuntime::with(Some("4f1c0e8a9b2d"));
        let host = FakeHost {
            binaries: vec!["docker"],
            ..Default::default()
        };

        let outcome = try_container(
            &BuildConfig::default(),
            &BuildEnvironment::host(),
            &runtime,
            &host,
            &OutputManager::new(true),
            &args(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Delegation::Delegated(0));
        let replaced = host.replaced.borrow();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].binary, PathBuf::from("/usr/bin/docker"));
        assert_eq!(
            replaced[0].argv,
            [
                "docker",
                "exec",
                "glu",
                "glu",
                "build",
                "linux,darwin",
                "./cmd/tool",
                "tool"
            ]
        );
        assert!(replaced[0].envs.is_empty());
    }

    #[tokio::test]
    async fn test_circleci_attaches_with_sudo() {
        let runtime = FakeRuntime::with(Some("4f1c0e8a9b2d"));
        let host = FakeHost {
            binaries: vec!["sudo", "docker"],
            ..Default::default()
        };

        let outcome = try_container(
            &BuildConfig::default(),
            &circleci(),
            &runtime,
            &host,
            &OutputManager::new(true),
            &args(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Delegation::Delegated(0));
        let replaced = host.replaced.borrow();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].binary, PathBuf::from("/usr/bin/sudo"));
        assert_eq!(
            replaced[0].argv,
            [
                "sudo",
                "-E",
                "lxc-attach",
                "-n",
                "4f1c0e8a9b2d",
                "--",
                "/bin/glu",
                "build",
                "linux,darwin",
                "./cmd/tool",
                "tool"
            ]
        );
        assert_eq!(
            replaced[0].envs,
            [(CONTAINER_MARKER.to_string(), "true".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_sudo_falls_back_to_local() {
        let runtime = FakeRuntime::with(Some("4f1c0e8a9b2d"));
        let host = FakeHost {
            binaries: vec!["docker"],
            ..Default::default()
        };

        let outcome = try_container(
            &BuildConfig::default(),
            &circleci(),
            &runtime,
            &host,
            &OutputManager::new(true),
            &args(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Delegation::NotDelegated);
        assert!(host.replaced.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_missing_docker_falls_back_to_local() {
        let runtime = FakeRuntime::with(Some("4f1c0e8a9b2d"));
        let host = FakeHost::default();

        let outcome = try_container(
            &BuildConfig::default(),
            &BuildEnvironment::host(),
            &runtime,
            &host,
            &OutputManager::new(true),
            &args(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Delegation::NotDelegated);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exec_is_reported() {
        let err = SystemHost
            .replace(&ExecCommand {
                binary: PathBuf::from("/nonexistent/glu-docker"),
                argv: vec!["docker".to_string()],
                envs: Vec::new(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            GluError::Container(ContainerError::ExecFailed { .. })
        ));
        assert!(err.to_string().contains("/nonexistent/glu-docker"));
    }
}
