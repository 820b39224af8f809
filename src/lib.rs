//! # kodegen_release_branch
//!
//! Release branches for GitHub Actions repositories, published entirely
//! through the GitHub object API.
//!
//! ## Features
//!
//! - **Remote commits**: build a tree and commit from working-copy files and
//!   move or create a branch ref, without a local push
//! - **Action pinning**: rewrite `uses: owner/repo/dir@main` references to
//!   published commit ids, one dependency layer per commit
//! - **Release flow**: publish `dist` artifacts to `release-<version>` and
//!   announce the branch on a pull request
//! - **Dry runs**: every command can run against an in-memory forge
//!
//! ## Usage
//!
//! ```bash
//! kodegen_release_branch release v1.2.0
//! kodegen_release_branch commit -b docs -m "update docs" README.md
//! kodegen_release_branch pin -b release-v1.2.0 --dry-run
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod actions;
pub mod cli;
pub mod commit;
pub mod error;
pub mod github;
pub mod release;
pub mod workspace;

pub use actions::{PinOptions, PinOutcome, PinWave, pin_action_files, pin_action_references};
pub use cli::Args;
pub use commit::{CommitOptions, CommitResult, create_commit};
pub use error::{CliError, ReleaseError, Result};
pub use github::{GitHubClient, InMemoryForge, IssueComments, ObjectStore, RepoSlug};
pub use release::{ReleaseConfig, ReleasePlan, ReleaseResult, execute_release};
