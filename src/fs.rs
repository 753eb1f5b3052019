//! File system steps of a container build.
//!
//! Provides the copy, move, and remove operations the build performs
//! in-process, with symlink preservation and errors that name the step.

use crate::error::{CommandError, Result};
use std::io;
use std::path::Path;
use tokio::fs;

fn step_error(operation: &str, path: &Path, source: io::Error) -> CommandError {
    CommandError::Filesystem {
        operation: operation.to_string(),
        path: path.to_path_buf(),
        source,
    }
}

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| step_error("mkdir -p", path, e))?;
    Ok(())
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(step_error("rm -rf", path, e).into()),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Recursively copies the contents of `from` into `to`, creating `to` and
/// its parents as needed. Existing files in `to` are overwritten.
///
/// Symlinks are recreated, not followed.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(step_error(
            "cp -r",
            from,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        )
        .into());
    }

    for entry in walkdir::WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| step_error("cp -r", from, e.into()))?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| step_error("cp -r", entry.path(), io::Error::other(e)))?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path())
                .await
                .map_err(|e| step_error("cp -r", entry.path(), e))?;
            symlink(&target, &dest_path).map_err(|e| step_error("cp -r", &dest_path, e))?;
        } else if entry.file_type().is_dir() {
            create_dir_all(&dest_path).await?;
        } else {
            fs::copy(entry.path(), &dest_path)
                .await
                .map_err(|e| step_error("cp -r", entry.path(), e))?;
        }
    }
    Ok(())
}

/// Moves a directory, falling back to copy and remove when a rename is not
/// possible (e.g. across mounts).
pub async fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent).await?;
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                e
            );
            copy_dir(from, to).await?;
            remove_dir_all(from).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(root: &Path) {
        std::fs::create_dir_all(root.join("cmd/tool")).unwrap();
        std::fs::write(root.join("main.go"), "package main\n").unwrap();
        std::fs::write(root.join("cmd/tool/tool.go"), "package tool\n").unwrap();
    }

    #[tokio::test]
    async fn test_copy_dir_creates_destination_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("project");
        populate(&src);

        let dest = temp.path().join("go/src/github.com/acme/tool");
        copy_dir(&src, &dest).await.unwrap();

        assert!(dest.join("main.go").is_file());
        assert_eq!(
            std::fs::read_to_string(dest.join("cmd/tool/tool.go")).unwrap(),
            "package tool\n"
        );
        assert!(src.join("main.go").is_file(), "source must be left intact");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_dir_preserves_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("project");
        populate(&src);
        std::os::unix::fs::symlink("main.go", src.join("link.go")).unwrap();

        let dest = temp.path().join("copy");
        copy_dir(&src, &dest).await.unwrap();

        let link = std::fs::symlink_metadata(dest.join("link.go")).unwrap();
        assert!(link.file_type().is_symlink());
    }

    #[tokio::test]
    async fn test_move_dir_replaces_location() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("build");
        populate(&src);

        let dest = temp.path().join("project/build");
        move_dir(&src, &dest).await.unwrap();

        assert!(!src.exists());
        assert!(dest.join("cmd/tool/tool.go").is_file());
    }

    #[tokio::test]
    async fn test_remove_missing_dir_is_ok() {
        let temp = TempDir::new().unwrap();
        remove_dir_all(&temp.path().join("absent")).await.unwrap();
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let err = copy_dir(&temp.path().join("absent"), &temp.path().join("dest"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cp -r"));
    }
}
