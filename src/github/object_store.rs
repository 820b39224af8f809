//! Object store capability trait and shared forge types.
//!
//! This module defines the ObjectStore trait that specifies every object-graph
//! primitive the commit builder needs (trees, commits, refs, branch queries).
//! The network implementation lives in the client module; the in-memory
//! implementation backs dry runs and tests.

use crate::error::GitHubError;
use std::fmt;
use std::future::Future;

/// Result of a single object store call
pub type StoreResult<T> = std::result::Result<T, GitHubError>;

/// Repository coordinates on the forge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoSlug {
    /// Create repository coordinates
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/repo` string
    pub fn parse(value: &str) -> Option<Self> {
        let (owner, name) = value.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A branch head as reported by the forge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Branch name (without `refs/heads/`)
    pub name: String,
    /// Commit the branch points at
    pub commit_id: String,
    /// Tree of that commit
    pub tree_id: String,
}

/// Commit object to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Commit message
    pub message: String,
    /// Tree the commit binds
    pub tree_id: String,
    /// Parent commits; empty for an orphan commit, never more than one
    pub parents: Vec<String>,
}

/// Tree entry kinds the forge recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Regular file (`100644`)
    #[default]
    Regular,
    /// Executable file (`100755`)
    Executable,
    /// Subdirectory (`040000`)
    Directory,
    /// Submodule gitlink (`160000`)
    Submodule,
    /// Symbolic link (`120000`)
    Symlink,
}

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;
const S_IFGITLINK: u32 = 0o160000;

impl FileMode {
    /// Map POSIX mode bits to a tree entry kind
    pub fn from_mode_bits(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFLNK => FileMode::Symlink,
            S_IFGITLINK => FileMode::Submodule,
            S_IFDIR => FileMode::Directory,
            S_IFREG if mode & 0o111 != 0 => FileMode::Executable,
            _ => FileMode::Regular,
        }
    }

    /// Octal mode string used in tree payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Directory => "040000",
            FileMode::Submodule => "160000",
            FileMode::Symlink => "120000",
        }
    }

    /// Object type a tree entry of this mode points at
    pub fn object_type(&self) -> &'static str {
        match self {
            FileMode::Directory => "tree",
            FileMode::Submodule => "commit",
            _ => "blob",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tree entry mutation
///
/// A deletion never carries content. Content is always read from the working
/// copy when the entry is built, never cached across commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Repository-relative path with `/` separators
    pub path: String,
    /// File bytes (link target for symlinks)
    pub content: Option<Vec<u8>>,
    /// Tree entry kind
    pub mode: FileMode,
    /// Whether this entry removes the path
    pub deletion: bool,
}

impl FileChange {
    /// Entry writing `content` at `path`
    pub fn write(path: impl Into<String>, mode: FileMode, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content: Some(content),
            mode,
            deletion: false,
        }
    }

    /// Entry removing `path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            mode: FileMode::Regular,
            deletion: true,
        }
    }
}

/// Trait defining the forge object-graph primitives used to publish commits
pub trait ObjectStore {
    /// Create a tree from `entries`, overlaid on `base_tree` when given
    fn create_tree(
        &self,
        repo: &RepoSlug,
        entries: &[FileChange],
        base_tree: Option<&str>,
    ) -> impl Future<Output = StoreResult<String>>;

    /// Create a commit object
    fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CommitRequest,
    ) -> impl Future<Output = StoreResult<String>>;

    /// Move `refs/heads/{branch}` to `commit_id`
    ///
    /// Fails with [`GitHubError::ReferenceNotFound`] when the branch does not
    /// exist and [`GitHubError::NonFastForward`] when `force` is false and the
    /// move is not a fast-forward.
    fn update_ref(
        &self,
        repo: &RepoSlug,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> impl Future<Output = StoreResult<String>>;

    /// Create `refs/heads/{branch}` at `commit_id`
    fn create_ref(
        &self,
        repo: &RepoSlug,
        branch: &str,
        commit_id: &str,
    ) -> impl Future<Output = StoreResult<String>>;

    /// Delete `refs/heads/{branch}`
    fn delete_ref(&self, repo: &RepoSlug, branch: &str) -> impl Future<Output = StoreResult<()>>;

    /// Look up a branch head; `None` when the branch does not exist
    fn query_branch(
        &self,
        repo: &RepoSlug,
        branch: &str,
    ) -> impl Future<Output = StoreResult<Option<BranchRef>>>;

    /// Look up the repository's default branch head
    fn query_default_branch(&self, repo: &RepoSlug) -> impl Future<Output = StoreResult<BranchRef>>;

    /// Tree id of a commit
    fn query_tree_of_commit(
        &self,
        repo: &RepoSlug,
        commit_id: &str,
    ) -> impl Future<Output = StoreResult<String>>;
}

/// Posting human-readable comments on issues and pull requests
pub trait IssueComments {
    /// Post `body` on issue or pull request `number`
    fn post_comment(
        &self,
        repo: &RepoSlug,
        number: u64,
        body: &str,
    ) -> impl Future<Output = StoreResult<()>>;
}
