//! Release command execution.

use super::helpers;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};
use crate::github::{IssueComments, ObjectStore};
use crate::release::{ReleaseConfig, ReleasePlan};

/// Execute release command
pub(super) async fn execute_release<S>(store: &S, args: &Args, config: &RuntimeConfig) -> Result<i32>
where
    S: ObjectStore + IssueComments,
{
    let Command::Release {
        version,
        pr,
        is_comment,
    } = &args.command
    else {
        return Err(CliError::InvalidArguments {
            reason: "expected the release command".to_string(),
        }
        .into());
    };

    let release_config = ReleaseConfig {
        repo: helpers::repo_slug(args)?,
        version: version.clone(),
        pr: *pr,
        is_comment: *is_comment,
        root: args.root.clone(),
        wave_delay: args.wave_delay(),
        server_url: args.server_url.clone(),
    };

    config.progress_println("Inspecting working copy...");
    let mut plan = ReleasePlan::from_working_copy(release_config).await?;
    let _staging = if config.is_dry_run() {
        Some(plan.stage().await?)
    } else {
        None
    };
    config.indent(&format!("branch: {}", plan.branch));
    config.indent(&format!("base revision: {}", plan.head_revision));
    config.indent(&format!("build artifacts: {}", plan.artifacts.len()));
    config.indent(&format!("action definitions: {}", plan.action_files.len()));

    config.progress_println(&format!("Publishing {}...", plan.branch));
    let result = crate::release::execute_release(store, &plan).await?;

    for wave in &result.waves {
        config.indent(&format!(
            "wave {}: {} ({} files)",
            wave.number,
            wave.commit_id,
            wave.changed_paths.len()
        ));
    }
    if result.comments_posted > 0 {
        config.indent(&format!("comments posted: {}", result.comments_posted));
    }
    config.success_println(&format!("Released {} at {}", result.branch, result.commit_id));

    helpers::write_outputs(
        config,
        &[("branch", result.branch.as_str()), ("commit", result.commit_id.as_str())],
    )
    .await?;
    Ok(0)
}
