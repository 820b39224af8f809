//! GitHub integration for release branch operations

mod client;
mod memory;
mod object_store;

pub use client::{DEFAULT_API_URL, DEFAULT_GRAPHQL_URL, GitHubClient, GitHubConfig};
pub use memory::{ForgeCall, InMemoryForge};
pub use object_store::{
    BranchRef, CommitRequest, FileChange, FileMode, IssueComments, ObjectStore, RepoSlug,
    StoreResult,
};
