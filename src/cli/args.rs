//! Command line argument parsing and validation.
//!
//! Every option a GitHub Actions run would set as an input can also come from
//! the environment the runner provides.

use crate::github::{DEFAULT_API_URL, DEFAULT_GRAPHQL_URL, RepoSlug};
use crate::release::DEFAULT_SERVER_URL;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Publish release branches with pinned action references
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_release_branch",
    version,
    about = "Publish release branches with pinned action references",
    long_about = "Publish build artifacts to a release branch through the GitHub API and pin
the repository's own `uses: owner/repo/dir@main` references to published commits.

Usage:
  kodegen_release_branch release v1.2.0
  kodegen_release_branch release pr/42 --is-comment
  kodegen_release_branch commit -b topic -m 'update docs' README.md
  kodegen_release_branch pin -b release-v1.2.0"
)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Target repository as owner/repo
    #[arg(long, global = true, env = "GITHUB_REPOSITORY", value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// GitHub token (falls back to GH_TOKEN)
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// REST API base URL
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// GraphQL endpoint
    #[arg(long, global = true, env = "GITHUB_GRAPHQL_URL", default_value = DEFAULT_GRAPHQL_URL)]
    pub graphql_url: String,

    /// Web URL used in comment links
    #[arg(long, global = true, env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Pause after each pinning wave, in milliseconds
    #[arg(
        long,
        global = true,
        env = "KODEGEN_WAVE_DELAY_MS",
        default_value = "2000",
        value_name = "MS"
    )]
    pub wave_delay_ms: u64,

    /// Working copy root
    #[arg(long, global = true, default_value = ".", value_name = "PATH")]
    pub root: PathBuf,

    /// Run against an in-memory copy of the repository instead of GitHub
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a release branch and pin action references on it
    Release {
        /// Version to release (`latest` and `pr/<n>` name the branch verbatim)
        #[arg(value_name = "VERSION")]
        version: String,

        /// Pull request to announce a pre-release on
        #[arg(long, value_name = "NUMBER")]
        pr: Option<u64>,

        /// Announce a `pr/<n>` branch on pull request <n>
        #[arg(long)]
        is_comment: bool,
    },

    /// Create one commit on a branch from working copy files
    Commit {
        /// Branch to publish to
        #[arg(short, long)]
        branch: String,

        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Files to write, relative to the working copy root
        #[arg(value_name = "FILE")]
        files: Vec<String>,

        /// Paths to delete from the tree
        #[arg(long = "delete", value_name = "PATH")]
        deleted_files: Vec<String>,

        /// Create a commit with the base tree unchanged
        #[arg(long)]
        empty: bool,

        /// Base commit
        #[arg(long, value_name = "SHA")]
        base_sha: Option<String>,

        /// Base branch
        #[arg(long, value_name = "BRANCH")]
        base_branch: Option<String>,

        /// Create a commit without a parent
        #[arg(long)]
        no_parent: bool,

        /// Allow a non-fast-forward update of the branch
        #[arg(short, long)]
        force: bool,

        /// Delete files that do not exist in the working copy
        #[arg(long)]
        delete_if_not_exist: bool,
    },

    /// Pin `@main` action references on an existing branch
    Pin {
        /// Branch to publish to
        #[arg(short, long)]
        branch: String,

        /// Commit to pin against (defaults to the branch head)
        #[arg(long, value_name = "SHA")]
        base_sha: Option<String>,

        /// First line of each wave's commit message
        #[arg(short, long, default_value = "chore: pin action references")]
        message: String,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match self.repo.as_deref() {
            None => return Err("--repo is required (or set GITHUB_REPOSITORY)".to_string()),
            Some(repo) if RepoSlug::parse(repo).is_none() => {
                return Err(format!(
                    "Invalid repository format: '{}'. Expected: owner/repo",
                    repo
                ));
            }
            Some(_) => {}
        }

        if !self.root.is_dir() {
            return Err(format!(
                "Working copy root is not a directory: {}",
                self.root.display()
            ));
        }

        match &self.command {
            Command::Release { version, .. } => {
                if version.trim().is_empty() {
                    return Err("Version must not be empty".to_string());
                }
            }
            Command::Commit {
                files,
                deleted_files,
                empty,
                ..
            } => {
                if *empty && (!files.is_empty() || !deleted_files.is_empty()) {
                    return Err("--empty cannot be combined with files".to_string());
                }
            }
            Command::Pin { .. } => {}
        }

        Ok(())
    }

    /// Repository slug, when `--repo` is valid
    pub fn repo_slug(&self) -> Option<RepoSlug> {
        self.repo.as_deref().and_then(RepoSlug::parse)
    }

    /// Token from `--github-token`, `GITHUB_TOKEN` or `GH_TOKEN`
    pub fn token(&self) -> Option<String> {
        self.github_token
            .clone()
            .or_else(|| std::env::var("GH_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Pause between pinning waves
    pub fn wave_delay(&self) -> Duration {
        Duration::from_millis(self.wave_delay_ms)
    }
}

impl Command {
    /// Get command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Release { .. } => "release",
            Command::Commit { .. } => "commit",
            Command::Pin { .. } => "pin",
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
    dry_run: bool,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(quiet: bool, dry_run: bool) -> Self {
        Self {
            output: super::OutputManager::new(quiet),
            dry_run,
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Whether commands run against the in-memory forge
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.quiet, args.dry_run)
    }
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print progress message
    pub fn progress_println(&self, message: &str) {
        let _ = self.output.progress(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}
