//! Pin command execution.

use super::helpers;
use crate::actions::{PinOptions, pin_action_files, pin_action_references, tracked_definitions};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, CommitError, Result};
use crate::github::ObjectStore;
use crate::workspace;

/// Execute pin command
pub(super) async fn execute_pin<S: ObjectStore>(
    store: &S,
    args: &Args,
    config: &RuntimeConfig,
) -> Result<i32> {
    let Command::Pin {
        branch,
        base_sha,
        message,
    } = &args.command
    else {
        return Err(CliError::InvalidArguments {
            reason: "expected the pin command".to_string(),
        }
        .into());
    };

    let repo = helpers::repo_slug(args)?;
    let base_commit = match base_sha {
        Some(sha) => sha.clone(),
        None => {
            store
                .query_branch(&repo, branch)
                .await?
                .ok_or_else(|| CommitError::BaseBranchNotFound {
                    branch: branch.clone(),
                    repo: repo.to_string(),
                })?
                .commit_id
        }
    };

    let mut options = PinOptions {
        owner: repo.owner.clone(),
        repo: repo.name.clone(),
        branch: branch.clone(),
        message: message.clone(),
        base_commit,
        root: args.root.clone(),
        wave_delay: args.wave_delay(),
    };

    config.progress_println(&format!("Pinning action references on {}...", branch));
    let outcome = if config.is_dry_run() {
        let paths = tracked_definitions(&args.root).await?;
        let staging = workspace::stage_files(&args.root, &paths).await?;
        options.root = staging.path().to_path_buf();
        pin_action_files(store, &options, &paths).await?
    } else {
        pin_action_references(store, &options).await?
    };

    for wave in &outcome.waves {
        config.indent(&format!("wave {}: {}", wave.number, wave.commit_id));
        for path in &wave.changed_paths {
            config.indent(&format!("  {}", path));
        }
    }
    config.success_println(&format!(
        "{} waves published, {} is at {}",
        outcome.waves.len(),
        branch,
        outcome.commit_id
    ));

    helpers::write_outputs(
        config,
        &[("branch", branch.as_str()), ("commit", outcome.commit_id.as_str())],
    )
    .await?;
    Ok(0)
}
