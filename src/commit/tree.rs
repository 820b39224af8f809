//! Reading working-copy files into tree entry mutations.

use crate::error::{CommitError, Result};
use crate::github::{FileChange, FileMode};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;

/// Normalize a repository-relative path for use in a tree payload
pub(crate) fn tree_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    normalized.trim_start_matches("./").to_string()
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> FileMode {
    use std::os::unix::fs::MetadataExt;
    FileMode::from_mode_bits(metadata.mode())
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> FileMode {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        FileMode::Symlink
    } else if file_type.is_dir() {
        FileMode::Directory
    } else {
        FileMode::Regular
    }
}

#[cfg(unix)]
fn link_bytes(target: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    target.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn link_bytes(target: &Path) -> Vec<u8> {
    target.to_string_lossy().replace('\\', "/").into_bytes()
}

/// Read one file from the working copy into a tree entry
///
/// A missing file becomes a deletion entry when `delete_if_not_exist` is set;
/// every other read failure is fatal.
pub(crate) async fn read_file_change(
    root: &Path,
    path: &str,
    delete_if_not_exist: bool,
) -> Result<FileChange> {
    let entry_path = tree_path(path);
    let full_path = root.join(&entry_path);

    match read_content(&full_path).await {
        Ok((mode, content)) => Ok(FileChange::write(entry_path, mode, content)),
        Err(e) if e.kind() == ErrorKind::NotFound && delete_if_not_exist => {
            log::info!("{} does not exist, deleting it from the tree", entry_path);
            Ok(FileChange::delete(entry_path))
        }
        Err(source) => Err(CommitError::ReadFailed {
            path: full_path,
            source,
        }
        .into()),
    }
}

async fn read_content(full_path: &Path) -> std::io::Result<(FileMode, Vec<u8>)> {
    let metadata = tokio::fs::symlink_metadata(full_path).await?;
    let mode = file_mode(&metadata);
    let content = match mode {
        FileMode::Symlink => link_bytes(&tokio::fs::read_link(full_path).await?),
        _ => tokio::fs::read(full_path).await?,
    };
    Ok((mode, content))
}
