//! Base revision resolution for new commits.
//!
//! Priority: explicit commit id, explicit base branch, the target branch
//! itself when it already exists, and finally the repository default branch.

use crate::commit::CommitOptions;
use crate::error::{CommitError, Result};
use crate::github::{ObjectStore, RepoSlug};

/// Where a base revision came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseSource {
    /// An explicit commit id
    Commit,
    /// An explicit base branch
    BaseBranch(String),
    /// The branch being committed to
    TargetBranch(String),
    /// The repository default branch
    DefaultBranch(String),
}

/// Commit and tree a new commit is built on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRevision {
    /// Base commit id
    pub commit_id: String,
    /// Tree of the base commit
    pub tree_id: String,
    /// Resolution path taken
    pub source: BaseSource,
}

/// Resolve the base revision for `options`
pub async fn resolve_base<S: ObjectStore>(
    store: &S,
    repo: &RepoSlug,
    options: &CommitOptions,
) -> Result<BaseRevision> {
    if let Some(commit_id) = options.base_sha.as_deref().filter(|s| !s.is_empty()) {
        let tree_id = store.query_tree_of_commit(repo, commit_id).await?;
        return Ok(BaseRevision {
            commit_id: commit_id.to_string(),
            tree_id,
            source: BaseSource::Commit,
        });
    }

    if let Some(base_branch) = options.base_branch.as_deref().filter(|s| !s.is_empty()) {
        let branch = store
            .query_branch(repo, base_branch)
            .await?
            .ok_or_else(|| CommitError::BaseBranchNotFound {
                branch: base_branch.to_string(),
                repo: repo.to_string(),
            })?;
        return Ok(BaseRevision {
            commit_id: branch.commit_id,
            tree_id: branch.tree_id,
            source: BaseSource::BaseBranch(branch.name),
        });
    }

    if let Some(branch) = store.query_branch(repo, &options.branch).await? {
        return Ok(BaseRevision {
            commit_id: branch.commit_id,
            tree_id: branch.tree_id,
            source: BaseSource::TargetBranch(options.branch.clone()),
        });
    }

    log::debug!(
        "branch {} does not exist, falling back to the default branch",
        options.branch
    );
    let default_branch = store.query_default_branch(repo).await?;
    Ok(BaseRevision {
        commit_id: default_branch.commit_id,
        tree_id: default_branch.tree_id,
        source: BaseSource::DefaultBranch(default_branch.name),
    })
}
