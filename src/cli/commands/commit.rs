//! Commit command execution.

use super::helpers;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::commit::{CommitOptions, create_commit};
use crate::error::{CliError, Result};
use crate::github::ObjectStore;

/// Execute commit command
pub(super) async fn execute_commit<S: ObjectStore>(
    store: &S,
    args: &Args,
    config: &RuntimeConfig,
) -> Result<i32> {
    let Command::Commit {
        branch,
        message,
        files,
        deleted_files,
        empty,
        base_sha,
        base_branch,
        no_parent,
        force,
        delete_if_not_exist,
    } = &args.command
    else {
        return Err(CliError::InvalidArguments {
            reason: "expected the commit command".to_string(),
        }
        .into());
    };

    let repo = helpers::repo_slug(args)?;
    let options = CommitOptions {
        owner: repo.owner,
        repo: repo.name,
        branch: branch.clone(),
        message: message.clone(),
        files: files.clone(),
        deleted_files: deleted_files.clone(),
        empty: *empty,
        base_sha: base_sha.clone(),
        base_branch: base_branch.clone(),
        no_parent: *no_parent,
        force_push: *force,
        delete_if_not_exist: *delete_if_not_exist,
        root: args.root.clone(),
    };

    match create_commit(store, &options).await? {
        Some(result) => {
            config.success_println(&format!(
                "{} {} at {}",
                if result.created_branch { "Created" } else { "Updated" },
                branch,
                result.commit_id
            ));
            helpers::write_outputs(
                config,
                &[("branch", branch.as_str()), ("commit", result.commit_id.as_str())],
            )
            .await?;
        }
        None => config.warning_println("Nothing to commit"),
    }
    Ok(0)
}
