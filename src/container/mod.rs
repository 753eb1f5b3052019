//! Build container integration.
//!
//! glu prefers to build inside a long-running container named `glu`, which
//! carries the Go toolchain and mounts `/project` and `/artifacts`. This
//! module finds that container and hands the current command over to it.
//!
//! # Module Structure
//!
//! - `runtime` - Container lookup through the docker CLI
//! - `delegate` - Process replacement into the container

mod delegate;
mod runtime;

// Re-export public API
pub use delegate::{Delegation, ExecCommand, ProcessHost, SystemHost, try_container};
pub use runtime::{ContainerRuntime, DOCKER_PS_TIMEOUT, DockerCli};
