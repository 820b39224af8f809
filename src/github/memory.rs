//! In-process forge with real tree, commit and ref semantics.
//!
//! Trees are stored flat (path to entry), so a `base_tree` overlay carries
//! every omitted path over unchanged and a tree without a base holds only the
//! given entries. Ref updates enforce fast-forward unless forced. Every call is
//! recorded so callers can inspect exactly what would have been sent.

use crate::error::GitHubError;
use crate::github::object_store::{
    BranchRef, CommitRequest, FileChange, FileMode, IssueComments, ObjectStore, RepoSlug,
    StoreResult,
};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// A call made against the forge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgeCall {
    /// `create_tree`
    CreateTree {
        /// Paths written or deleted, in request order
        paths: Vec<String>,
        /// Base tree overlaid, if any
        base_tree: Option<String>,
    },
    /// `create_commit`
    CreateCommit {
        /// Tree bound by the commit
        tree_id: String,
        /// Parent commits
        parents: Vec<String>,
    },
    /// `update_ref`
    UpdateRef {
        /// Branch name
        branch: String,
        /// Target commit
        commit_id: String,
        /// Whether the update was forced
        force: bool,
    },
    /// `create_ref`
    CreateRef {
        /// Branch name
        branch: String,
        /// Target commit
        commit_id: String,
    },
    /// `delete_ref`
    DeleteRef {
        /// Branch name
        branch: String,
    },
    /// `query_branch`
    QueryBranch {
        /// Branch name
        branch: String,
    },
    /// `query_default_branch`
    QueryDefaultBranch,
    /// `query_tree_of_commit`
    QueryTreeOfCommit {
        /// Commit looked up
        commit_id: String,
    },
    /// `post_comment`
    PostComment {
        /// Issue or pull request number
        number: u64,
        /// Comment body
        body: String,
    },
}

#[derive(Debug, Clone)]
struct StoredEntry {
    mode: FileMode,
    content: Vec<u8>,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    tree_id: String,
    parents: Vec<String>,
    message: String,
}

type Tree = BTreeMap<String, StoredEntry>;

#[derive(Debug, Default)]
struct ForgeState {
    default_branch: String,
    refs: BTreeMap<String, String>,
    commits: HashMap<String, StoredCommit>,
    trees: HashMap<String, Tree>,
    calls: Vec<ForgeCall>,
    sequence: u64,
}

/// In-memory forge implementing [`ObjectStore`] and [`IssueComments`]
///
/// A single forge models a single repository; the `repo` argument of each
/// call is accepted and ignored.
#[derive(Debug, Default)]
pub struct InMemoryForge {
    state: Mutex<ForgeState>,
}

fn hash_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

fn tree_id(tree: &Tree) -> String {
    let mut hasher = Sha1::new();
    for (path, entry) in tree {
        hasher.update(entry.mode.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update(hash_hex(&[entry.content.as_slice()]).as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn seed_tree(files: &[(&str, &str)]) -> Tree {
    files
        .iter()
        .map(|(path, content)| {
            (
                path.to_string(),
                StoredEntry {
                    mode: FileMode::Regular,
                    content: content.as_bytes().to_vec(),
                },
            )
        })
        .collect()
}

impl ForgeState {
    fn insert_tree(&mut self, tree: Tree) -> String {
        let id = tree_id(&tree);
        self.trees.entry(id.clone()).or_insert(tree);
        id
    }

    fn insert_commit(&mut self, tree_id: String, parents: Vec<String>, message: String) -> String {
        self.sequence += 1;
        let sequence = self.sequence.to_be_bytes();
        let parent_list = parents.join(",");
        let id = hash_hex(&[
            tree_id.as_bytes(),
            parent_list.as_bytes(),
            message.as_bytes(),
            sequence.as_slice(),
        ]);
        self.commits.insert(
            id.clone(),
            StoredCommit {
                tree_id,
                parents,
                message,
            },
        );
        id
    }

    fn branch_ref(&self, branch: &str) -> Option<BranchRef> {
        let commit_id = self.refs.get(branch)?;
        let commit = self.commits.get(commit_id)?;
        Some(BranchRef {
            name: branch.to_string(),
            commit_id: commit_id.clone(),
            tree_id: commit.tree_id.clone(),
        })
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut pending = vec![descendant.to_string()];
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if let Some(commit) = self.commits.get(&current) {
                pending.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    fn tree_of(&self, commit_id: &str) -> Option<&Tree> {
        let commit = self.commits.get(commit_id)?;
        self.trees.get(&commit.tree_id)
    }
}

impl InMemoryForge {
    /// Create an empty forge whose default branch is `default_branch`
    ///
    /// The default branch does not exist until a commit is seeded on it.
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(ForgeState {
                default_branch: default_branch.into(),
                ..ForgeState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ForgeState> {
        // A panic while holding the lock leaves the maps consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish a root commit holding `files` on `branch`, without recording calls
    pub fn seed_branch(&self, branch: &str, files: &[(&str, &str)], message: &str) -> String {
        let mut state = self.lock();
        let tree_id = state.insert_tree(seed_tree(files));
        let commit_id = state.insert_commit(tree_id, Vec::new(), message.to_string());
        state.refs.insert(branch.to_string(), commit_id.clone());
        commit_id
    }

    /// Like [`seed_branch`](Self::seed_branch), but under a caller-chosen commit id
    ///
    /// Used to mirror a revision that exists in a local working copy.
    pub fn seed_branch_at(&self, branch: &str, commit_id: &str, files: &[(&str, &str)], message: &str) {
        let mut state = self.lock();
        let tree_id = state.insert_tree(seed_tree(files));
        state.commits.insert(
            commit_id.to_string(),
            StoredCommit {
                tree_id,
                parents: Vec::new(),
                message: message.to_string(),
            },
        );
        state.refs.insert(branch.to_string(), commit_id.to_string());
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ForgeCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Commit a branch currently points at
    pub fn branch_head(&self, branch: &str) -> Option<String> {
        self.lock().refs.get(branch).cloned()
    }

    /// File content at `path` in `commit_id`
    pub fn file_at(&self, commit_id: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.lock();
        state
            .tree_of(commit_id)
            .and_then(|tree| tree.get(path))
            .map(|entry| entry.content.clone())
    }

    /// Tree entry mode of `path` in `commit_id`
    pub fn mode_at(&self, commit_id: &str, path: &str) -> Option<FileMode> {
        let state = self.lock();
        state
            .tree_of(commit_id)
            .and_then(|tree| tree.get(path))
            .map(|entry| entry.mode)
    }

    /// All paths in the tree of `commit_id`
    pub fn paths_at(&self, commit_id: &str) -> Vec<String> {
        let state = self.lock();
        state
            .tree_of(commit_id)
            .map(|tree| tree.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Parents of `commit_id`
    pub fn parents_of(&self, commit_id: &str) -> Vec<String> {
        self.lock()
            .commits
            .get(commit_id)
            .map(|c| c.parents.clone())
            .unwrap_or_default()
    }

    /// Message of `commit_id`
    pub fn message_of(&self, commit_id: &str) -> Option<String> {
        self.lock().commits.get(commit_id).map(|c| c.message.clone())
    }

    /// Paths whose content or mode differs between `commit_id` and its first parent
    pub fn changed_paths(&self, commit_id: &str) -> Vec<String> {
        let state = self.lock();
        let empty = Tree::new();
        let tree = state.tree_of(commit_id).unwrap_or(&empty);
        let parent = state
            .commits
            .get(commit_id)
            .and_then(|c| c.parents.first())
            .and_then(|p| state.tree_of(p))
            .unwrap_or(&empty);

        let mut changed: Vec<String> = tree
            .iter()
            .filter(|(path, entry)| {
                parent
                    .get(*path)
                    .is_none_or(|old| old.content != entry.content || old.mode != entry.mode)
            })
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(parent.keys().filter(|p| !tree.contains_key(*p)).cloned());
        changed.sort();
        changed
    }

    /// Comments posted so far as `(number, body)`
    pub fn comments(&self) -> Vec<(u64, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ForgeCall::PostComment { number, body } => Some((*number, body.clone())),
                _ => None,
            })
            .collect()
    }
}

impl ObjectStore for InMemoryForge {
    async fn create_tree(
        &self,
        _repo: &RepoSlug,
        entries: &[FileChange],
        base_tree: Option<&str>,
    ) -> StoreResult<String> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::CreateTree {
            paths: entries.iter().map(|e| e.path.clone()).collect(),
            base_tree: base_tree.map(str::to_string),
        });

        let mut tree = match base_tree {
            Some(base) => state.trees.get(base).cloned().ok_or_else(|| GitHubError::Api {
                operation: "create_tree".to_string(),
                status: 422,
                message: format!("base_tree {} not found", base),
            })?,
            None => Tree::new(),
        };
        for entry in entries {
            if entry.deletion {
                tree.remove(&entry.path);
            } else {
                tree.insert(
                    entry.path.clone(),
                    StoredEntry {
                        mode: entry.mode,
                        content: entry.content.clone().unwrap_or_default(),
                    },
                );
            }
        }
        Ok(state.insert_tree(tree))
    }

    async fn create_commit(&self, _repo: &RepoSlug, request: &CommitRequest) -> StoreResult<String> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::CreateCommit {
            tree_id: request.tree_id.clone(),
            parents: request.parents.clone(),
        });
        if !state.trees.contains_key(&request.tree_id) {
            return Err(GitHubError::Api {
                operation: "create_commit".to_string(),
                status: 422,
                message: format!("tree {} not found", request.tree_id),
            });
        }
        if let Some(missing) = request.parents.iter().find(|p| !state.commits.contains_key(*p)) {
            return Err(GitHubError::Api {
                operation: "create_commit".to_string(),
                status: 422,
                message: format!("parent {} not found", missing),
            });
        }
        Ok(state.insert_commit(
            request.tree_id.clone(),
            request.parents.clone(),
            request.message.clone(),
        ))
    }

    async fn update_ref(
        &self,
        _repo: &RepoSlug,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> StoreResult<String> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::UpdateRef {
            branch: branch.to_string(),
            commit_id: commit_id.to_string(),
            force,
        });
        let reference = format!("refs/heads/{}", branch);
        let current = state
            .refs
            .get(branch)
            .cloned()
            .ok_or(GitHubError::ReferenceNotFound {
                reference: reference.clone(),
            })?;
        if !force && !state.is_ancestor(&current, commit_id) {
            return Err(GitHubError::NonFastForward { reference });
        }
        state.refs.insert(branch.to_string(), commit_id.to_string());
        Ok(commit_id.to_string())
    }

    async fn create_ref(&self, _repo: &RepoSlug, branch: &str, commit_id: &str) -> StoreResult<String> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::CreateRef {
            branch: branch.to_string(),
            commit_id: commit_id.to_string(),
        });
        if state.refs.contains_key(branch) {
            return Err(GitHubError::Api {
                operation: "create_ref".to_string(),
                status: 422,
                message: "Reference already exists".to_string(),
            });
        }
        state.refs.insert(branch.to_string(), commit_id.to_string());
        Ok(commit_id.to_string())
    }

    async fn delete_ref(&self, _repo: &RepoSlug, branch: &str) -> StoreResult<()> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::DeleteRef {
            branch: branch.to_string(),
        });
        state
            .refs
            .remove(branch)
            .map(|_| ())
            .ok_or(GitHubError::ReferenceNotFound {
                reference: format!("refs/heads/{}", branch),
            })
    }

    async fn query_branch(&self, _repo: &RepoSlug, branch: &str) -> StoreResult<Option<BranchRef>> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::QueryBranch {
            branch: branch.to_string(),
        });
        Ok(state.branch_ref(branch))
    }

    async fn query_default_branch(&self, repo: &RepoSlug) -> StoreResult<BranchRef> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::QueryDefaultBranch);
        let default_branch = state.default_branch.clone();
        state.branch_ref(&default_branch).ok_or_else(|| GitHubError::Decode {
            operation: "query_default_branch".to_string(),
            reason: format!("{} has no default branch", repo),
        })
    }

    async fn query_tree_of_commit(&self, _repo: &RepoSlug, commit_id: &str) -> StoreResult<String> {
        let mut state = self.lock();
        state.calls.push(ForgeCall::QueryTreeOfCommit {
            commit_id: commit_id.to_string(),
        });
        state
            .commits
            .get(commit_id)
            .map(|c| c.tree_id.clone())
            .ok_or_else(|| GitHubError::Decode {
                operation: "query_tree_of_commit".to_string(),
                reason: format!("{} is not a commit", commit_id),
            })
    }
}

impl IssueComments for InMemoryForge {
    async fn post_comment(&self, _repo: &RepoSlug, number: u64, body: &str) -> StoreResult<()> {
        self.lock().calls.push(ForgeCall::PostComment {
            number,
            body: body.to_string(),
        });
        Ok(())
    }
}
