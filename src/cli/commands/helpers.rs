//! Shared helper functions for command execution.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};
use crate::github::{ForgeCall, GitHubClient, GitHubConfig, InMemoryForge, RepoSlug};
use crate::workspace;
use tokio::io::AsyncWriteExt;

/// Default branch assumed for a detached working copy in dry-run mode
const DETACHED_BRANCH: &str = "main";

/// Repository from `--repo`
pub(super) fn repo_slug(args: &Args) -> Result<RepoSlug> {
    args.repo_slug().ok_or_else(|| {
        CliError::MissingArgument {
            argument: "--repo owner/repo".to_string(),
        }
        .into()
    })
}

/// GitHub client configured from the global options
pub(super) fn github_client(args: &Args) -> Result<GitHubClient> {
    let config = GitHubConfig {
        api_url: args.api_url.clone(),
        graphql_url: args.graphql_url.clone(),
        token: args.token(),
    };
    Ok(GitHubClient::new(&config)?)
}

/// In-memory forge holding the local `HEAD` on the local branch
///
/// `pin` also gets its target branch seeded at `HEAD` so it has something to
/// build on.
pub(super) async fn dry_run_forge(args: &Args) -> Result<InMemoryForge> {
    let head = workspace::head_revision(&args.root).await?;
    let current = workspace::current_branch(&args.root)
        .await?
        .unwrap_or_else(|| DETACHED_BRANCH.to_string());

    let forge = InMemoryForge::new(current.clone());
    forge.seed_branch_at(&current, &head, &[], "local HEAD");
    if let Command::Pin { branch, .. } = &args.command {
        if *branch != current {
            forge.seed_branch_at(branch, &head, &[], "local HEAD");
        }
    }
    log::debug!("dry run forge seeded with {} at {}", current, head);
    Ok(forge)
}

/// Print every write the dry run would have sent
pub(super) fn report_dry_run(config: &RuntimeConfig, forge: &InMemoryForge) {
    config.println("\n🔍 Dry run, nothing was sent to GitHub. Would have:");
    for call in forge.calls() {
        let line = match call {
            ForgeCall::CreateTree { paths, base_tree } => match base_tree {
                Some(base) => format!("create a tree over {} with {} entries", base, paths.len()),
                None => format!("create a tree with {} entries", paths.len()),
            },
            ForgeCall::CreateCommit { tree_id, parents } => {
                format!("create a commit of tree {} with parents {:?}", tree_id, parents)
            }
            ForgeCall::UpdateRef {
                branch,
                commit_id,
                force,
            } => format!("update {} to {}{}", branch, commit_id, if force { " (force)" } else { "" }),
            ForgeCall::CreateRef { branch, commit_id } => {
                format!("create {} at {}", branch, commit_id)
            }
            ForgeCall::DeleteRef { branch } => format!("delete {}", branch),
            ForgeCall::PostComment { number, .. } => format!("comment on #{}", number),
            ForgeCall::QueryBranch { .. }
            | ForgeCall::QueryDefaultBranch
            | ForgeCall::QueryTreeOfCommit { .. } => continue,
        };
        config.indent(&line);
    }
}

/// Print run outputs and append them to `GITHUB_OUTPUT` when set
pub(super) async fn write_outputs(config: &RuntimeConfig, outputs: &[(&str, &str)]) -> Result<()> {
    for (key, value) in outputs {
        config.indent(&format!("{}={}", key, value));
    }

    let Some(path) = std::env::var_os("GITHUB_OUTPUT") else {
        return Ok(());
    };
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    for (key, value) in outputs {
        file.write_all(format!("{}={}\n", key, value).as_bytes()).await?;
    }
    file.flush().await?;
    Ok(())
}
