//! # glu
//!
//! Cross-compiling build helper for Go projects.
//!
//! `glu build` compiles a project once per target operating system. When a
//! container named `glu` is running, the command is handed over to it; inside
//! the container the outputs and a snapshot of GOPATH are archived for CI.
//!
//! ## Usage
//!
//! ```bash
//! glu build linux,darwin                      # build . for two targets
//! glu build linux,windows ./cmd/tool tool     # explicit package and name
//! glu info                                    # show name, repo, version
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod archive;
pub mod builder;
pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod fs;
pub mod project;
pub mod shell;
pub mod target;

// Re-export main types for public API
pub use builder::{BuildReport, BuildRequest, Builder};
pub use cli::Args;
pub use config::{BuildConfig, BuildEnvironment};
pub use container::{Delegation, try_container};
pub use error::{GluError, Result};
pub use project::ProjectInfo;
pub use target::TargetOs;
