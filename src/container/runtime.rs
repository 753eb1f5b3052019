//! Container runtime lookups.
//!
//! Finds the ID of a running container by name through the docker CLI.

use crate::error::{ContainerError, Result};
use serde::Deserialize;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for `docker ps` (10 seconds)
/// Listing containers on a healthy daemon is instant; a hang means it is down
pub const DOCKER_PS_TIMEOUT: Duration = Duration::from_secs(10);

/// Lists running containers and resolves names to IDs.
pub trait ContainerRuntime {
    /// ID of the running container called `name`, if there is one.
    ///
    /// A runtime that is missing or not responding has no containers.
    fn find_container(&self, name: &str) -> impl Future<Output = Result<Option<String>>>;
}

/// One line of `docker ps --format '{{json .}}'`
#[derive(Debug, Deserialize)]
struct PsEntry {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
}

/// Docker CLI backed runtime
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

impl ContainerRuntime for DockerCli {
    async fn find_container(&self, name: &str) -> Result<Option<String>> {
        let listing = timeout(
            DOCKER_PS_TIMEOUT,
            Command::new(&self.program)
                .args(["ps", "--no-trunc", "--format", "{{json .}}"])
                .stdin(Stdio::null())
                .output(),
        )
        .await;

        let output = match listing {
            Err(_) => {
                log::warn!(
                    "docker ps timed out after {} seconds, building without the {} container",
                    DOCKER_PS_TIMEOUT.as_secs(),
                    name
                );
                return Ok(None);
            }
            Ok(Err(e)) => {
                log::debug!("docker not available: {}", e);
                return Ok(None);
            }
            Ok(Ok(output)) if !output.status.success() => {
                log::debug!(
                    "docker ps failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return Ok(None);
            }
            Ok(Ok(output)) => output,
        };

        match find_in_listing(&String::from_utf8_lossy(&output.stdout), name) {
            Ok(id) => Ok(id),
            Err(e) => {
                log::warn!("{}", e);
                Ok(None)
            }
        }
    }
}

/// Find `name` in `docker ps` JSON lines output.
fn find_in_listing(
    listing: &str,
    name: &str,
) -> std::result::Result<Option<String>, ContainerError> {
    for line in listing.lines().filter(|l| !l.trim().is_empty()) {
        let entry: PsEntry =
            serde_json::from_str(line).map_err(|e| ContainerError::UnexpectedOutput {
                command: "docker ps".to_string(),
                reason: e.to_string(),
            })?;

        // Older daemons report names with a leading slash
        if entry
            .names
            .split(',')
            .any(|n| n.trim().trim_start_matches('/') == name)
        {
            return Ok(Some(entry.id));
        }
    }
    Ok(None)
}
