//! Release branch orchestration.
//!
//! A release publishes build artifacts to a dedicated branch, pins the
//! repository's own `@main` action references on that branch, and optionally
//! announces the branch on a pull request.

use crate::actions::{self, PinOptions, PinWave};
use crate::commit::{CommitOptions, create_commit};
use crate::error::{CliError, Result};
use crate::github::{IssueComments, ObjectStore, RepoSlug};
use crate::workspace;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Default web URL used in comment links
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Branch a version is released to
///
/// `latest` and `pr/<n>` are used verbatim; everything else gets a
/// `release-` prefix.
pub fn release_branch_name(version: &str) -> String {
    if version == "latest" || version.starts_with("pr/") {
        version.to_string()
    } else {
        format!("release-{}", version)
    }
}

/// Pull request number of a `pr/<n>` version
pub fn pull_request_of(version: &str) -> Option<&str> {
    version.strip_prefix("pr/")
}

/// Release inputs
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Target repository
    pub repo: RepoSlug,
    /// Version being released
    pub version: String,
    /// Pull request to announce a pre-release on
    pub pr: Option<u64>,
    /// Announce a `pr/<n>` branch on pull request `<n>`
    pub is_comment: bool,
    /// Working copy root
    pub root: PathBuf,
    /// Pause between pinning waves
    pub wave_delay: Duration,
    /// Web URL for links in comments
    pub server_url: String,
}

/// A release resolved against the local working copy
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    /// Release inputs
    pub config: ReleaseConfig,
    /// Branch the release is published to
    pub branch: String,
    /// Local `HEAD` commit
    pub head_revision: String,
    /// Local branch, `None` when detached
    pub current_branch: Option<String>,
    /// Build artifacts to publish
    pub artifacts: Vec<String>,
    /// Tracked workflow definitions to pin
    pub action_files: Vec<String>,
}

/// Outcome of a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResult {
    /// Branch the release was published to
    pub branch: String,
    /// Commit holding the build artifacts
    pub release_commit: String,
    /// Final head of the release branch
    pub commit_id: String,
    /// Pinning waves published after the release commit
    pub waves: Vec<PinWave>,
    /// Number of comments posted
    pub comments_posted: usize,
}

impl ReleasePlan {
    /// Inspect the working copy at `config.root`
    pub async fn from_working_copy(config: ReleaseConfig) -> Result<Self> {
        let head_revision = workspace::head_revision(&config.root).await?;
        let current_branch = workspace::current_branch(&config.root).await?;
        let artifacts = workspace::find_dist_files(&config.root)?;
        let action_files = actions::tracked_definitions(&config.root).await?;

        Ok(Self {
            branch: release_branch_name(&config.version),
            config,
            head_revision,
            current_branch,
            artifacts,
            action_files,
        })
    }

    /// Message of the release commit
    pub fn commit_message(&self) -> String {
        format!(
            "chore: release {}\nbase revision: {}",
            self.config.version, self.head_revision
        )
    }

    /// Options for the artifact commit
    ///
    /// Builds on the remote copy of the local branch, or on the local `HEAD`
    /// commit when detached or already on the release branch.
    pub fn release_commit_options(&self) -> CommitOptions {
        let base_branch = self
            .current_branch
            .clone()
            .filter(|branch| *branch != self.branch);
        let base_sha = base_branch
            .is_none()
            .then(|| self.head_revision.clone());

        CommitOptions {
            owner: self.config.repo.owner.clone(),
            repo: self.config.repo.name.clone(),
            branch: self.branch.clone(),
            message: self.commit_message(),
            files: self.artifacts.clone(),
            empty: self.artifacts.is_empty(),
            base_sha,
            base_branch,
            root: self.config.root.clone(),
            ..CommitOptions::default()
        }
    }

    /// Copy the artifacts and action files to a scratch directory and work there
    ///
    /// The returned handle owns the directory; the plan must not outlive it.
    pub async fn stage(&mut self) -> Result<TempDir> {
        let mut paths = self.artifacts.clone();
        paths.extend(self.action_files.iter().cloned());
        let staging = workspace::stage_files(&self.config.root, &paths).await?;
        self.config.root = staging.path().to_path_buf();
        Ok(staging)
    }

    fn pin_options(&self, base_commit: String) -> PinOptions {
        PinOptions {
            owner: self.config.repo.owner.clone(),
            repo: self.config.repo.name.clone(),
            branch: self.branch.clone(),
            message: self.commit_message(),
            base_commit,
            root: self.config.root.clone(),
            wave_delay: self.config.wave_delay,
        }
    }

    fn branch_url(&self) -> String {
        format!(
            "{}/{}/tree/{}",
            self.config.server_url.trim_end_matches('/'),
            self.config.repo,
            self.branch
        )
    }

    /// Comments to post as `(pull request, body)`
    pub fn comments(&self) -> Result<Vec<(u64, String)>> {
        let mut comments = Vec::new();
        let version = &self.config.version;

        if let Some(pr) = self.config.pr.filter(|_| version.starts_with('v')) {
            comments.push((
                pr,
                format!(
                    "## Pre-release {version}\n\n[{branch}]({url}) was created.\n\n```yaml\nuses: {repo}@{version}\n```",
                    branch = self.branch,
                    url = self.branch_url(),
                    repo = self.config.repo,
                ),
            ));
        }

        if let Some(number) = pull_request_of(version).filter(|_| self.config.is_comment) {
            let number: u64 = number.parse().map_err(|_| CliError::InvalidArguments {
                reason: format!("'{}' does not name a pull request", version),
            })?;
            comments.push((
                number,
                format!(
                    "[{branch}]({url}) was created from this pull request.\n\n```yaml\nuses: {repo}@{branch}\n```",
                    branch = self.branch,
                    url = self.branch_url(),
                    repo = self.config.repo,
                ),
            ));
        }

        Ok(comments)
    }
}

/// Publish a release
pub async fn execute_release<S>(store: &S, plan: &ReleasePlan) -> Result<ReleaseResult>
where
    S: ObjectStore + IssueComments,
{
    let repo = &plan.config.repo;
    let comments = plan.comments()?;

    if store.query_branch(repo, &plan.branch).await?.is_some() {
        log::info!("deleting existing branch {}", plan.branch);
        store.delete_ref(repo, &plan.branch).await?;
    }

    log::info!(
        "publishing {} build artifacts to {}",
        plan.artifacts.len(),
        plan.branch
    );
    let release = create_commit(store, &plan.release_commit_options())
        .await?
        .ok_or_else(|| CliError::ExecutionFailed {
            command: "release".to_string(),
            reason: format!("no release commit was created on {}", plan.branch),
        })?;

    let pinned = actions::pin_action_files(
        store,
        &plan.pin_options(release.commit_id.clone()),
        &plan.action_files,
    )
    .await?;

    for (number, body) in &comments {
        log::info!("commenting on #{}", number);
        store.post_comment(repo, *number, body).await?;
    }

    Ok(ReleaseResult {
        branch: plan.branch.clone(),
        release_commit: release.commit_id,
        commit_id: pinned.commit_id,
        waves: pinned.waves,
        comments_posted: comments.len(),
    })
}
