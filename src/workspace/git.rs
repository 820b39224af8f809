//! `git` CLI queries against the working copy.

use crate::error::{GitError, Result};
use std::path::Path;

async fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let command = args.join(" ");
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .await
        .map_err(|e| GitError::CommandFailed {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.to_lowercase().contains("not a git repository") {
            return Err(GitError::NotRepository {
                path: root.to_path_buf(),
            }
            .into());
        }
        return Err(GitError::CommandFailed {
            command,
            reason: stderr,
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Paths of every tracked file, relative to `root`
pub async fn tracked_files(root: &Path) -> Result<Vec<String>> {
    let stdout = run_git(root, &["ls-files", "-z"]).await?;
    Ok(stdout
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect())
}

/// Commit id of `HEAD`
pub async fn head_revision(root: &Path) -> Result<String> {
    let stdout = run_git(root, &["rev-parse", "HEAD"]).await?;
    Ok(stdout.trim().to_string())
}

/// Checked-out branch, or `None` when `HEAD` is detached
pub async fn current_branch(root: &Path) -> Result<Option<String>> {
    let stdout = run_git(root, &["branch", "--show-current"]).await?;
    let branch = stdout.trim();
    Ok((!branch.is_empty()).then(|| branch.to_string()))
}
