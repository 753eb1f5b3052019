//! Target operating systems for cross-compilation.

use crate::error::{CliError, Result};
use std::fmt;

/// GOOS values accepted by the Go toolchain
const KNOWN_TARGETS: &[&str] = &[
    "aix",
    "android",
    "darwin",
    "dragonfly",
    "freebsd",
    "hurd",
    "illumos",
    "ios",
    "js",
    "linux",
    "nacl",
    "netbsd",
    "openbsd",
    "plan9",
    "solaris",
    "wasip1",
    "windows",
    "zos",
];

/// One validated entry of the OS list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOs {
    goos: String,
}

impl TargetOs {
    /// Parse a single identifier, case-insensitively.
    pub fn parse(name: &str) -> Result<Self> {
        let goos = name.trim().to_lowercase();
        if goos.is_empty() {
            return Err(CliError::InvalidArguments {
                reason: "OS list contains an empty entry".to_string(),
            }
            .into());
        }
        if !KNOWN_TARGETS.contains(&goos.as_str()) {
            return Err(CliError::UnknownTarget {
                name: name.trim().to_string(),
            }
            .into());
        }
        Ok(Self { goos })
    }

    /// Parse a comma-separated list, keeping the given order.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        let targets = list
            .split(',')
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;

        if targets.is_empty() {
            return Err(CliError::InvalidArguments {
                reason: "OS list is empty".to_string(),
            }
            .into());
        }
        Ok(targets)
    }

    /// Toolchain identifier, used for `GOOS` and archive names
    pub fn goos(&self) -> &str {
        &self.goos
    }

    /// Capitalized label used for output directories (`linux` -> `Linux`)
    pub fn title(&self) -> String {
        let mut chars = self.goos.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.goos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GluError;

    #[test]
    fn test_parse_list_keeps_order() {
        let targets = TargetOs::parse_list("linux,darwin,windows").unwrap();
        let names: Vec<_> = targets.iter().map(TargetOs::goos).collect();
        assert_eq!(names, ["linux", "darwin", "windows"]);
    }

    #[test]
    fn test_titles() {
        let targets = TargetOs::parse_list("linux,darwin").unwrap();
        assert_eq!(targets[0].title(), "Linux");
        assert_eq!(targets[1].title(), "Darwin");
    }

    #[test]
    fn test_mixed_case_is_normalized() {
        let target = TargetOs::parse("Darwin").unwrap();
        assert_eq!(target.goos(), "darwin");
        assert_eq!(target.title(), "Darwin");
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = TargetOs::parse_list("linux,beos").unwrap_err();
        assert!(matches!(
            err,
            GluError::Cli(CliError::UnknownTarget { ref name }) if name == "beos"
        ));
    }

    #[test]
    fn test_empty_entry_rejected() {
        assert!(TargetOs::parse_list("linux,,darwin").is_err());
        assert!(TargetOs::parse_list("").is_err());
    }
}
