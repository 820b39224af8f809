//! Scratch copies of working-copy files.

use crate::error::Result;
use std::path::Path;
use tempfile::TempDir;

#[cfg(unix)]
async fn copy_link(source: &Path, target: &Path) -> std::io::Result<()> {
    let link = tokio::fs::read_link(source).await?;
    tokio::fs::symlink(link, target).await
}

#[cfg(not(unix))]
async fn copy_link(source: &Path, target: &Path) -> std::io::Result<()> {
    tokio::fs::copy(source, target).await.map(|_| ())
}

/// Copy `paths` from `root` into a new temporary directory
///
/// Paths keep their layout relative to the directory, symlinks stay links and
/// permissions are carried over. The directory is removed when the handle drops.
pub async fn stage_files(root: &Path, paths: &[String]) -> Result<TempDir> {
    let staging = tempfile::Builder::new()
        .prefix("kodegen-release-")
        .tempdir()?;

    for path in paths {
        let source = root.join(path);
        let target = staging.path().join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let metadata = tokio::fs::symlink_metadata(&source).await?;
        if metadata.file_type().is_symlink() {
            copy_link(&source, &target).await?;
        } else {
            tokio::fs::copy(&source, &target).await?;
        }
    }

    log::debug!("staged {} files in {}", paths.len(), staging.path().display());
    Ok(staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_stage_files_copies_layout() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join("a/dist")).expect("mkdir");
        fs::write(root.path().join("a/action.yml"), "runs: {}\n").expect("write");
        fs::write(root.path().join("a/dist/index.js"), "x\n").expect("write");
        fs::write(root.path().join("unlisted.txt"), "y\n").expect("write");

        let paths = vec!["a/action.yml".to_string(), "a/dist/index.js".to_string()];
        let staging = stage_files(root.path(), &paths).await.expect("staged");

        assert_eq!(
            fs::read_to_string(staging.path().join("a/action.yml")).expect("read"),
            "runs: {}\n"
        );
        assert_eq!(
            fs::read_to_string(staging.path().join("a/dist/index.js")).expect("read"),
            "x\n"
        );
        assert!(!staging.path().join("unlisted.txt").exists());

        fs::write(staging.path().join("a/action.yml"), "changed\n").expect("write");
        assert_eq!(
            fs::read_to_string(root.path().join("a/action.yml")).expect("read"),
            "runs: {}\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stage_files_keeps_symlinks() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join("target.txt"), "t\n").expect("write");
        std::os::unix::fs::symlink("target.txt", root.path().join("link")).expect("symlink");

        let staging = stage_files(root.path(), &["link".to_string()]).await.expect("staged");
        assert_eq!(
            fs::read_link(staging.path().join("link")).expect("link"),
            Path::new("target.txt")
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(stage_files(root.path(), &["gone.txt".to_string()]).await.is_err());
    }
}
