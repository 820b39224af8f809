//! Remote commit construction through the forge object API.
//!
//! A commit is materialized without a local checkout of the target branch:
//! resolve a base revision, build a tree from working-copy files (or reuse the
//! base tree for an empty commit), create the commit object, then move or
//! create the branch ref.

mod base;
mod tree;

pub use base::{BaseRevision, BaseSource, resolve_base};

use crate::error::{CommitError, GitHubError, Result};
use crate::github::{CommitRequest, FileChange, ObjectStore, RepoSlug};
use std::path::PathBuf;

/// Options for a single remote commit
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to publish to
    pub branch: String,
    /// Commit message
    pub message: String,
    /// Repository-relative paths to write from the working copy
    pub files: Vec<String>,
    /// Repository-relative paths to delete
    pub deleted_files: Vec<String>,
    /// Create a commit whose tree is the base tree
    pub empty: bool,
    /// Explicit base commit; takes precedence over every branch
    pub base_sha: Option<String>,
    /// Explicit base branch
    pub base_branch: Option<String>,
    /// Create an orphan commit over a tree holding only the given entries
    pub no_parent: bool,
    /// Allow a non-fast-forward ref update
    pub force_push: bool,
    /// Turn missing files into deletions instead of failing
    pub delete_if_not_exist: bool,
    /// Working copy directory the paths are relative to
    pub root: PathBuf,
}

impl CommitOptions {
    /// Whether these options describe nothing to commit
    pub fn is_noop(&self) -> bool {
        self.files.is_empty() && self.deleted_files.is_empty() && !self.empty
    }

    /// Check required options
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("branch", &self.branch),
            ("message", &self.message),
        ];
        for (option, value) in required {
            if value.is_empty() {
                return Err(CommitError::MissingOption { option }.into());
            }
        }
        Ok(())
    }

    fn repo_slug(&self) -> RepoSlug {
        RepoSlug::new(self.owner.clone(), self.repo.clone())
    }
}

/// A published commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    /// Commit the branch now points at
    pub commit_id: String,
    /// Tree of that commit
    pub tree_id: String,
    /// Revision the commit was built on
    pub base: BaseRevision,
    /// Whether the branch ref had to be created
    pub created_branch: bool,
}

/// Build and publish one commit
///
/// Returns `Ok(None)` without touching the forge when there are no files, no
/// deletions and `empty` is false.
pub async fn create_commit<S: ObjectStore>(
    store: &S,
    options: &CommitOptions,
) -> Result<Option<CommitResult>> {
    if options.is_noop() {
        log::debug!("nothing to commit on {}", options.branch);
        return Ok(None);
    }
    options.validate()?;

    let repo = options.repo_slug();
    let base = resolve_base(store, &repo, options).await?;
    log::debug!("base revision {} ({:?})", base.commit_id, base.source);

    let tree_id = build_tree(store, &repo, options, &base).await?;

    let parents = if options.no_parent {
        Vec::new()
    } else {
        vec![base.commit_id.clone()]
    };
    log::info!("creating a commit tree={} parents={:?}", tree_id, parents);
    let commit_id = store
        .create_commit(
            &repo,
            &CommitRequest {
                message: options.message.clone(),
                tree_id: tree_id.clone(),
                parents,
            },
        )
        .await?;

    let (commit_id, created_branch) = publish(store, &repo, options, &commit_id).await?;

    Ok(Some(CommitResult {
        commit_id,
        tree_id,
        base,
        created_branch,
    }))
}

async fn build_tree<S: ObjectStore>(
    store: &S,
    repo: &RepoSlug,
    options: &CommitOptions,
    base: &BaseRevision,
) -> Result<String> {
    if options.empty {
        return Ok(base.tree_id.clone());
    }

    let mut entries: Vec<FileChange> =
        Vec::with_capacity(options.files.len() + options.deleted_files.len());
    for path in &options.files {
        entries.push(tree::read_file_change(&options.root, path, options.delete_if_not_exist).await?);
    }
    for path in &options.deleted_files {
        entries.push(FileChange::delete(tree::tree_path(path)));
    }

    let base_tree = if options.no_parent {
        None
    } else {
        Some(base.tree_id.as_str())
    };
    log::info!(
        "creating a tree with {} files base_tree={:?}",
        entries.len(),
        base_tree
    );
    Ok(store.create_tree(repo, &entries, base_tree).await?)
}

/// Point the branch at `commit_id`, creating the ref when it does not exist
async fn publish<S: ObjectStore>(
    store: &S,
    repo: &RepoSlug,
    options: &CommitOptions,
    commit_id: &str,
) -> Result<(String, bool)> {
    log::info!("updating ref=heads/{} sha={}", options.branch, commit_id);
    match store
        .update_ref(repo, &options.branch, commit_id, options.force_push)
        .await
    {
        Ok(applied) => Ok((applied, false)),
        Err(GitHubError::ReferenceNotFound { .. }) => {
            log::info!("creating ref=refs/heads/{} sha={}", options.branch, commit_id);
            let applied = store.create_ref(repo, &options.branch, commit_id).await?;
            Ok((applied, true))
        }
        Err(e) => Err(e.into()),
    }
}
