//! Gzipped tarballs of build outputs and the Go workspace.

use crate::error::{CommandError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};

fn archive_error(path: &Path, reason: impl ToString) -> CommandError {
    CommandError::Archive {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Which files go into an archive
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    /// One file from `dir`, stored under its own name
    File {
        /// Directory holding the file
        dir: PathBuf,
        /// File name, also the entry name
        name: String,
    },
    /// The whole tree under `dir`, rooted at `.`
    Tree {
        /// Root of the tree
        dir: PathBuf,
    },
}

/// Writes `source` into a new `.tgz` at `dest`.
///
/// Runs on the blocking pool; the caller waits for completion.
pub async fn write_tgz(dest: &Path, source: ArchiveSource) -> Result<()> {
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || write_tgz_blocking(&dest, &source))
        .await
        .map_err(|e| anyhow::anyhow!("archive task failed: {}", e))?
}

fn write_tgz_blocking(dest: &Path, source: &ArchiveSource) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| archive_error(dest, e))?;
    }
    let file = File::create(dest).map_err(|e| archive_error(dest, e))?;
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    tar.follow_symlinks(false);

    match source {
        ArchiveSource::File { dir, name } => {
            tar.append_path_with_name(dir.join(name), name)
                .map_err(|e| archive_error(dest, e))?;
        }
        ArchiveSource::Tree { dir } => {
            tar.append_dir_all(".", dir)
                .map_err(|e| archive_error(dest, e))?;
        }
    }

    let encoder = tar.into_inner().map_err(|e| archive_error(dest, e))?;
    encoder.finish().map_err(|e| archive_error(dest, e))?;
    log::debug!("wrote archive {}", dest.display());
    Ok(())
}
