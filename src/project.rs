//! Project metadata discovered from the working directory.

use crate::error::{ProjectError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// File whose contents pin the embedded version
pub const VERSION_FILE: &str = "VERSION";

/// Name, import path, and version of the project being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Artifact base name (directory basename)
    pub name: String,
    /// Import path, e.g. `github.com/gliderlabs/glu`
    pub repo: String,
    /// Version embedded into binaries, when one is known
    pub version: Option<String>,
}

impl ProjectInfo {
    /// Discover metadata for the project rooted at `dir`.
    ///
    /// A directory that is not a git checkout is still a project: its import
    /// path falls back to the name and only a VERSION file can give a version.
    pub fn discover(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ProjectError::NoName {
                path: dir.to_path_buf(),
            })?;

        let repo = match gix::discover(dir) {
            Ok(repo) => Some(repo),
            Err(e) => {
                log::debug!("{} is not a git checkout: {}", dir.display(), e);
                None
            }
        };

        let import_path = match &repo {
            Some(repo) => origin_url(repo).and_then(|url| import_path_from_url(&url)),
            None => None,
        };

        let version = match read_version_file(dir)? {
            Some(version) => Some(version),
            None => match &repo {
                Some(repo) => describe_head(repo)?,
                None => None,
            },
        };

        Ok(Self {
            repo: import_path.unwrap_or_else(|| name.clone()),
            name,
            version,
        })
    }
}

fn read_version_file(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(VERSION_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let version = content.trim();
            Ok((!version.is_empty()).then(|| version.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn origin_url(repo: &gix::Repository) -> Option<String> {
    let remote = repo.find_remote("origin").ok()?;
    let url = remote.url(gix::remote::Direction::Fetch)?;
    Some(url.to_bstring().to_string())
}

/// Describe HEAD against tags, like `git describe --tags`.
fn describe_head(repo: &gix::Repository) -> Result<Option<String>> {
    let commit = match repo.head_commit() {
        Ok(commit) => commit,
        Err(e) => {
            // Fresh repository without commits
            log::debug!("no HEAD commit to describe: {}", e);
            return Ok(None);
        }
    };

    let format = commit
        .describe()
        .names(gix::commit::describe::SelectRef::AllTags)
        .try_format()
        .map_err(|e| ProjectError::Git {
            reason: format!("Failed to describe HEAD: {}", e),
        })?;

    Ok(format.map(|f| f.to_string()))
}

static REMOTE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // https://host/path, ssh://git@host:port/path, git@host:path
    Regex::new(
        r"^(?:[a-z+]+://)?(?:[^@/]+@)?(?P<host>[^/:]+)(?::\d+/|[:/])(?P<path>.+?)(?:\.git)?/*$",
    )
    .expect("remote URL regex is valid")
});

/// Turn a remote URL into a Go import path (`host/owner/project`).
///
/// Local remotes (`file://` URLs and plain paths) have no import path.
pub fn import_path_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.starts_with("file:") {
        return None;
    }
    let caps = REMOTE_URL_RE.captures(url)?;
    Some(format!(
        "{}/{}",
        &caps["host"],
        caps["path"].trim_start_matches('/')
    ))
}
