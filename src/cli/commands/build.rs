//! `glu build <os-list> [<pkgs>] [<name>]`

use crate::builder::{BuildRequest, Builder};
use crate::cli::OutputManager;
use crate::config::{BuildConfig, BuildEnvironment};
use crate::container::{Delegation, DockerCli, SystemHost, try_container};
use crate::error::Result;
use crate::project::ProjectInfo;
use crate::shell::SystemRunner;
use crate::target::TargetOs;

/// Execute the build command, in the glu container when one is running
pub(super) async fn execute_build(
    os_list: &str,
    pkgs: Option<String>,
    name: Option<String>,
    forwarded: &[String],
    output: &OutputManager,
) -> Result<i32> {
    // Reject bad targets here rather than after entering the container
    TargetOs::parse_list(os_list)?;

    let config = BuildConfig::default();
    let env = BuildEnvironment::from_env();
    log::debug!("build environment: {:?}", env);

    let runtime = DockerCli::default();
    match try_container(&config, &env, &runtime, &SystemHost, output, forwarded).await? {
        Delegation::Delegated(code) => return Ok(code),
        Delegation::NotDelegated => {}
    }

    let workdir = std::env::current_dir()?;
    let info = ProjectInfo::discover(&workdir)?;
    log::info!(
        "building {} ({}) version {}",
        info.name,
        info.repo,
        info.version.as_deref().unwrap_or("<none>")
    );

    let request = BuildRequest::new(os_list, pkgs, name, &info)?;
    let runner = SystemRunner::new(output.clone());
    let report = Builder::new(&config, &env, &info, &runner, workdir)
        .run(&request)
        .await?;

    output.success(&format!(
        "Built {} for {} target(s)",
        request.output_name,
        request.targets.len()
    ));
    for binary in &report.binaries {
        output.indent(&binary.display().to_string());
    }
    for archive in &report.archives {
        output.indent(&archive.display().to_string());
    }

    Ok(0)
}
