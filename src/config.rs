//! Build configuration and the environment captured at startup.

use std::path::PathBuf;

/// Marker set in the forwarded environment once glu runs inside its container
pub const CONTAINER_MARKER: &str = "GLU_CONTAINER";

/// Set to `true` by CircleCI on its build machines
pub const CIRCLECI_MARKER: &str = "CIRCLECI";

/// Fixed locations and names used by a build.
///
/// The defaults match the layout of the glu build container.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Name of the container to delegate into
    pub container_name: String,
    /// Program name used when re-running inside the container
    pub program_name: String,
    /// Path of the glu binary inside the container
    pub container_binary: PathBuf,
    /// Project source mounted into the container
    pub project_mount: PathBuf,
    /// Shared artifacts mount
    pub artifacts_dir: PathBuf,
    /// GOPATH inside the container; snapshotted and removed after a build
    pub gopath: PathBuf,
    /// Output directory, relative to the working directory
    pub build_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            container_name: "glu".to_string(),
            program_name: "glu".to_string(),
            container_binary: PathBuf::from("/bin/glu"),
            project_mount: PathBuf::from("/project"),
            artifacts_dir: PathBuf::from("/artifacts"),
            gopath: PathBuf::from("/go"),
            build_dir: PathBuf::from("build"),
        }
    }
}

/// CI provider, picks the delegation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiProvider {
    /// CircleCI; containers are entered through lxc-attach
    CircleCi,
    /// Anything else; containers are entered through `docker exec`
    Other,
}

/// Process environment as seen once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// Already running inside the glu container
    pub inside_container: bool,
    /// Detected CI provider
    pub ci: CiProvider,
}

impl BuildEnvironment {
    /// Capture the relevant variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture from an arbitrary lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_true = |key: &str| lookup(key).as_deref() == Some("true");
        Self {
            inside_container: is_true(CONTAINER_MARKER),
            ci: if is_true(CIRCLECI_MARKER) {
                CiProvider::CircleCi
            } else {
                CiProvider::Other
            },
        }
    }

    /// Plain host, outside any container and CI
    pub fn host() -> Self {
        Self {
            inside_container: false,
            ci: CiProvider::Other,
        }
    }
}
