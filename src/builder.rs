//! Cross-compilation of a Go project.
//!
//! The [`Builder`] runs the toolchain once per target OS. Inside the build
//! container it also stages the mounted source into GOPATH first and, once
//! every target is built, publishes the outputs and archives them.
//!
//! Steps run strictly in order and the first failure ends the build.

use crate::archive::{ArchiveSource, write_tgz};
use crate::config::{BuildConfig, BuildEnvironment};
use crate::error::Result;
use crate::fs;
use crate::project::ProjectInfo;
use crate::shell::{CommandRunner, ShellCommand};
use crate::target::TargetOs;
use std::path::{Path, PathBuf};

/// Symbol the version is linked into
pub const VERSION_SYMBOL: &str = "main.Version";

/// Archive holding the snapshot of GOPATH
pub const WORKSPACE_ARCHIVE: &str = "go-workspace.tgz";

/// What to build, parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Targets, in the order given
    pub targets: Vec<TargetOs>,
    /// Package pattern handed to the toolchain
    pub packages: String,
    /// Binary name
    pub output_name: String,
}

impl BuildRequest {
    /// Build a request, defaulting the name to the project's
    pub fn new(
        os_list: &str,
        packages: Option<String>,
        output_name: Option<String>,
        info: &ProjectInfo,
    ) -> Result<Self> {
        Ok(Self {
            targets: TargetOs::parse_list(os_list)?,
            packages: packages.unwrap_or_else(|| ".".to_string()),
            output_name: output_name.unwrap_or_else(|| info.name.clone()),
        })
    }
}

/// Files a finished build left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// One binary per target
    pub binaries: Vec<PathBuf>,
    /// Archives written (container builds only)
    pub archives: Vec<PathBuf>,
}

/// Linker flags embedding `version`, if there is one
pub fn ldflags(version: Option<&str>) -> Option<[String; 2]> {
    version.map(|v| ["-ldflags".to_string(), format!("-X {}={}", VERSION_SYMBOL, v)])
}

/// Runs a build with the given collaborators.
#[derive(Debug)]
pub struct Builder<'a, R> {
    config: &'a BuildConfig,
    env: &'a BuildEnvironment,
    info: &'a ProjectInfo,
    runner: &'a R,
    workdir: PathBuf,
}

impl<'a, R: CommandRunner> Builder<'a, R> {
    /// Create a builder working in `workdir`
    pub fn new(
        config: &'a BuildConfig,
        env: &'a BuildEnvironment,
        info: &'a ProjectInfo,
        runner: &'a R,
        workdir: PathBuf,
    ) -> Self {
        Self {
            config,
            env,
            info,
            runner,
            workdir,
        }
    }

    /// Environment shared by every toolchain command
    fn base_env(&self) -> Vec<(String, String)> {
        if self.env.inside_container {
            vec![("GOPATH".to_string(), self.config.gopath.display().to_string())]
        } else {
            Vec::new()
        }
    }

    /// Output directory for `target`, relative to the working directory
    pub fn output_dir(&self, target: &TargetOs) -> PathBuf {
        self.config.build_dir.join(target.title())
    }

    /// `go get -d` for the requested packages
    pub fn fetch_command(&self, request: &BuildRequest, workdir: &Path) -> ShellCommand {
        ShellCommand::new("go")
            .args(["get", "-d"])
            .arg(&request.packages)
            .envs(&self.base_env())
            .current_dir(workdir)
    }

    /// `go build` for one target
    pub fn build_command(
        &self,
        request: &BuildRequest,
        target: &TargetOs,
        workdir: &Path,
    ) -> ShellCommand {
        let output = self.output_dir(target).join(&request.output_name);

        let mut command = ShellCommand::new("go")
            .args(["build", "-a", "-installsuffix", "cgo"]);
        if let Some(flags) = ldflags(self.info.version.as_deref()) {
            command = command.args(flags);
        }
        command
            .arg("-o")
            .arg(output.display().to_string())
            .arg(&request.packages)
            .envs(&self.base_env())
            .env("CGO_ENABLED", "0")
            .env("GOOS", target.goos())
            .current_dir(workdir)
    }

    /// Run the whole build.
    pub async fn run(&self, request: &BuildRequest) -> Result<BuildReport> {
        let workdir = if self.env.inside_container {
            self.stage_source().await?
        } else {
            self.workdir.clone()
        };

        self.runner
            .run(&self.fetch_command(request, &workdir))
            .await?;

        let mut report = BuildReport::default();
        for target in &request.targets {
            let dir = self.output_dir(target);
            self.runner.trace(&format!("mkdir -p {}", dir.display()));
            fs::create_dir_all(&workdir.join(&dir)).await?;

            self.runner
                .run(&self.build_command(request, target, &workdir))
                .await?;
            report.binaries.push(workdir.join(dir).join(&request.output_name));
        }

        if self.env.inside_container {
            report.binaries = self.publish(request, &workdir).await?;
            report.archives = self.package(request).await?;
        }

        Ok(report)
    }

    /// Copy the mounted project into GOPATH and return the new working directory.
    async fn stage_source(&self) -> Result<PathBuf> {
        let dest = self.config.gopath.join("src").join(&self.info.repo);

        if let Some(parent) = dest.parent() {
            self.runner.trace(&format!("mkdir -p {}", parent.display()));
            fs::create_dir_all(parent).await?;
        }
        self.runner.trace(&format!(
            "cp -r {} {}",
            self.config.project_mount.display(),
            dest.display()
        ));
        fs::copy_dir(&self.config.project_mount, &dest).await?;
        self.runner.trace(&format!("cd {}", dest.display()));

        Ok(dest)
    }

    /// Move the build tree onto the project mount, replacing older output.
    async fn publish(&self, request: &BuildRequest, workdir: &Path) -> Result<Vec<PathBuf>> {
        let published = self.config.project_mount.join(&self.config.build_dir);

        self.runner.trace(&format!("rm -rf {}", published.display()));
        fs::remove_dir_all(&published).await?;
        self.runner.trace(&format!(
            "mv {} {}",
            self.config.build_dir.display(),
            self.config.project_mount.display()
        ));
        fs::move_dir(&workdir.join(&self.config.build_dir), &published).await?;

        Ok(request
            .targets
            .iter()
            .map(|t| published.join(t.title()).join(&request.output_name))
            .collect())
    }

    /// Archive every target's output and snapshot GOPATH, then remove it.
    async fn package(&self, request: &BuildRequest) -> Result<Vec<PathBuf>> {
        let published = self.config.project_mount.join(&self.config.build_dir);
        let mut archives = Vec::with_capacity(request.targets.len() + 1);

        for target in &request.targets {
            let archive = self
                .config
                .artifacts_dir
                .join(format!("{}-{}.tgz", request.output_name, target.goos()));
            let dir = published.join(target.title());

            self.runner.trace(&format!(
                "tar -czf {} -C {} {}",
                archive.display(),
                dir.display(),
                request.output_name
            ));
            write_tgz(
                &archive,
                ArchiveSource::File {
                    dir,
                    name: request.output_name.clone(),
                },
            )
            .await?;
            archives.push(archive);
        }

        let snapshot = self.config.artifacts_dir.join(WORKSPACE_ARCHIVE);
        self.runner.trace(&format!(
            "tar -czf {} -C {} .",
            snapshot.display(),
            self.config.gopath.display()
        ));
        write_tgz(
            &snapshot,
            ArchiveSource::Tree {
                dir: self.config.gopath.clone(),
            },
        )
        .await?;
        archives.push(snapshot);

        self.runner
            .trace(&format!("rm -rf {}", self.config.gopath.display()));
        fs::remove_dir_all(&self.config.gopath).await?;

        Ok(archives)
    }
}
