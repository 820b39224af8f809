//! Comprehensive error types for kodegen_release_branch operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kodegen_release_branch operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all kodegen_release_branch operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Remote commit construction errors
    #[error("Commit error: {0}")]
    Commit(#[from] CommitError),

    /// GitHub object API errors
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    /// Action pinning errors
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// Local git working copy errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a remote commit
#[derive(Error, Debug)]
pub enum CommitError {
    /// A required commit option was empty
    #[error("{option} is required")]
    MissingOption {
        /// Option name
        option: &'static str,
    },

    /// An explicitly requested base branch does not exist
    #[error("Base branch '{branch}' does not exist in {repo}")]
    BaseBranchNotFound {
        /// Branch name
        branch: String,
        /// Repository slug
        repo: String,
    },

    /// A file slated for inclusion could not be read
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        /// Local path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Tagged failures returned by the GitHub object store adapter
#[derive(Error, Debug)]
pub enum GitHubError {
    /// The named reference does not exist
    #[error("Reference does not exist: {reference}")]
    ReferenceNotFound {
        /// Fully qualified reference name
        reference: String,
    },

    /// The ref update would move the branch non-fast-forward
    #[error("Update of {reference} is not a fast forward")]
    NonFastForward {
        /// Fully qualified reference name
        reference: String,
    },

    /// The API rejected the request
    #[error("{operation} failed with status {status}: {message}")]
    Api {
        /// Operation that failed
        operation: String,
        /// HTTP status code
        status: u16,
        /// Message returned by the API
        message: String,
    },

    /// The request never produced a response
    #[error("{operation} request failed: {source}")]
    Transport {
        /// Operation that failed
        operation: String,
        /// Underlying HTTP error
        #[source]
        source: reqwest::Error,
    },

    /// The response did not have the expected shape
    #[error("Unexpected response for {operation}: {reason}")]
    Decode {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// No token was configured
    #[error("GitHub token not provided")]
    MissingToken,
}

/// Errors raised while pinning internal action references
#[derive(Error, Debug)]
pub enum ActionError {
    /// A workflow definition is not valid
    #[error("Invalid workflow definition {path}: {source}")]
    Schema {
        /// Workflow file
        path: PathBuf,
        /// Decoder error
        #[source]
        source: serde_yaml::Error,
    },

    /// A workflow definition could not be read
    #[error("Failed to read workflow definition {path}: {source}")]
    Unreadable {
        /// Workflow file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A rewritten workflow definition could not be written back
    #[error("Failed to write workflow definition {path}: {source}")]
    WriteFailed {
        /// Workflow file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A ready dependency is referenced in a form the rewrite cannot match
    #[error("Cannot pin {name}@main in {path}")]
    UnpinnableReference {
        /// Workflow file
        path: String,
        /// Canonical name of the dependency
        name: String,
    },

    /// Modules reference each other at @main
    #[error("Circular action dependency detected in modules: {modules:?}")]
    CircularDependency {
        /// Canonical names of the modules involved
        modules: Vec<String>,
    },
}

/// Local git working copy errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {path}")]
    NotRepository {
        /// Directory that was inspected
        path: PathBuf,
    },

    /// A git command failed
    #[error("git {command} failed: {reason}")]
    CommandFailed {
        /// Git subcommand
        command: String,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::GitHub(GitHubError::MissingToken) => vec![
                "Set GITHUB_TOKEN or GH_TOKEN, or pass --github-token".to_string(),
                "Use --dry-run to preview the release without a token".to_string(),
            ],
            ReleaseError::GitHub(GitHubError::NonFastForward { reference }) => vec![
                format!("{} has moved since its base was resolved", reference),
                "Re-run the release, or pass --force to overwrite the branch".to_string(),
            ],
            ReleaseError::GitHub(GitHubError::Api { status: 401, .. })
            | ReleaseError::GitHub(GitHubError::Api { status: 403, .. }) => vec![
                "Verify the token is valid and has contents: write permission".to_string(),
            ],
            ReleaseError::Action(ActionError::CircularDependency { modules }) => vec![
                format!("Review @main references between: {}", modules.join(", ")),
                "Break the cycle by pinning one of the references by hand".to_string(),
            ],
            ReleaseError::Action(ActionError::UnpinnableReference { path, name }) => vec![
                format!("Write the reference in {} as `uses: {}@main` on one line", path, name),
            ],
            ReleaseError::Action(ActionError::Schema { path, .. }) => vec![format!(
                "Fix the YAML in {} and re-run",
                path.display()
            )],
            ReleaseError::Commit(CommitError::ReadFailed { .. }) => vec![
                "Check that every listed file exists in the working copy".to_string(),
                "Pass --delete-if-not-exist to turn missing files into deletions".to_string(),
            ],
            ReleaseError::Git(GitError::NotRepository { .. }) => vec![
                "Run from inside a git checkout, or pass --root".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    ///
    /// Nothing is retried automatically; this only tells the caller whether a
    /// re-run without changes could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReleaseError::GitHub(GitHubError::Transport { .. })
                | ReleaseError::GitHub(GitHubError::NonFastForward { .. })
                | ReleaseError::GitHub(GitHubError::Api {
                    status: 500..=599,
                    ..
                })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_option_message() {
        let err = CommitError::MissingOption { option: "branch" };
        assert_eq!(err.to_string(), "branch is required");
    }

    #[test]
    fn test_cycle_suggestions_name_modules() {
        let err = ReleaseError::from(ActionError::CircularDependency {
            modules: vec!["o/r/a".to_string(), "o/r/b".to_string()],
        });
        let suggestions = err.recovery_suggestions();
        assert!(suggestions[0].contains("o/r/a, o/r/b"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_server_errors_are_recoverable() {
        let err = ReleaseError::from(GitHubError::Api {
            operation: "create_tree".to_string(),
            status: 502,
            message: "Bad Gateway".to_string(),
        });
        assert!(err.is_recoverable());

        let err = ReleaseError::from(GitHubError::Api {
            operation: "create_tree".to_string(),
            status: 422,
            message: "Invalid tree".to_string(),
        });
        assert!(!err.is_recoverable());
    }
}
