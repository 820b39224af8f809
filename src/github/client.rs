//! GitHub REST and GraphQL adapter for the object store traits.
//!
//! Writes go through the REST git-data endpoints (blobs, trees, commits,
//! refs); branch and commit lookups go through GraphQL so a single request
//! returns both the commit id and its tree id.

use crate::error::GitHubError;
use crate::github::object_store::{
    BranchRef, CommitRequest, FileChange, IssueComments, ObjectStore, RepoSlug, StoreResult,
};
use base64::Engine as _;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Default REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GraphQL endpoint
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const API_VERSION: &str = "2022-11-28";

/// Connection settings for the GitHub adapter
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// GraphQL endpoint URL
    pub graphql_url: String,
    /// Access token
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            token: None,
        }
    }
}

/// Object store backed by the GitHub API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    graphql_url: String,
}

impl GitHubClient {
    /// Create a client authenticated with the configured token
    pub fn new(config: &GitHubConfig) -> StoreResult<Self> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(GitHubError::MissingToken)?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(|_| {
            GitHubError::Decode {
                operation: "client_init".to_string(),
                reason: "token contains characters not allowed in a header".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("kodegen_release_branch/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| GitHubError::Transport {
                operation: "client_init".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            graphql_url: config.graphql_url.clone(),
        })
    }

    fn repo_url(&self, repo: &RepoSlug, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, repo.owner, repo.name, path)
    }

    /// Send a REST request and decode the JSON body
    ///
    /// Non-success statuses are returned as `(status, message)` so callers can
    /// classify them.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        operation: &str,
    ) -> StoreResult<std::result::Result<Option<Value>, (StatusCode, String)>> {
        log::debug!("{} {} ({})", method, url, operation);
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|source| GitHubError::Transport {
            operation: operation.to_string(),
            source,
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| GitHubError::Transport {
                operation: operation.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Ok(Err((status, error_message(&text))));
        }
        if text.trim().is_empty() {
            return Ok(Ok(None));
        }
        let value = serde_json::from_str(&text).map_err(|e| GitHubError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Ok(Some(value)))
    }

    async fn rest<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &Value,
        operation: &str,
    ) -> StoreResult<T> {
        match self.send(method, url, Some(body), operation).await? {
            Ok(value) => decode(value.unwrap_or(Value::Null), operation),
            Err((status, message)) => Err(GitHubError::Api {
                operation: operation.to_string(),
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn ref_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        reference: &str,
        operation: &str,
    ) -> StoreResult<Option<Value>> {
        match self.send(method, url, body, operation).await? {
            Ok(value) => Ok(value),
            Err((status, message)) => Err(classify_ref_failure(
                operation,
                reference,
                status.as_u16(),
                message,
            )),
        }
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        operation: &str,
    ) -> StoreResult<T> {
        let body = json!({ "query": query, "variables": variables });
        let url = self.graphql_url.clone();
        let response: GraphQlResponse<T> = self.rest(Method::POST, &url, &body, operation).await?;
        if let Some(error) = response.errors.first() {
            return Err(GitHubError::Api {
                operation: operation.to_string(),
                status: StatusCode::OK.as_u16(),
                message: error.message.clone(),
            });
        }
        response.data.ok_or_else(|| GitHubError::Decode {
            operation: operation.to_string(),
            reason: "response has no data".to_string(),
        })
    }

    /// Upload raw bytes as a blob, returning its sha
    pub async fn create_blob(&self, repo: &RepoSlug, content: &[u8]) -> StoreResult<String> {
        let body = json!({
            "content": base64::engine::general_purpose::STANDARD.encode(content),
            "encoding": "base64",
        });
        let created: ShaResponse = self
            .rest(Method::POST, &self.repo_url(repo, "git/blobs"), &body, "create_blob")
            .await?;
        Ok(created.sha)
    }

    async fn tree_payload(&self, repo: &RepoSlug, entries: &[FileChange]) -> StoreResult<Vec<Value>> {
        let mut tree = Vec::with_capacity(entries.len());
        for entry in entries {
            let blob = match &entry.content {
                Some(bytes) if !entry.deletion && std::str::from_utf8(bytes).is_err() => {
                    Some(self.create_blob(repo, bytes).await?)
                }
                _ => None,
            };
            tree.push(tree_entry_payload(entry, blob.as_deref()));
        }
        Ok(tree)
    }
}

/// JSON for one `create tree` entry
///
/// Deletions carry an explicit `"sha": null`. Contents that are not UTF-8
/// must have been uploaded first and are referenced by `blob_sha`.
fn tree_entry_payload(entry: &FileChange, blob_sha: Option<&str>) -> Value {
    let mut value = json!({
        "path": entry.path,
        "mode": entry.mode.as_str(),
        "type": entry.mode.object_type(),
    });
    if entry.deletion {
        value["sha"] = Value::Null;
    } else if let Some(sha) = blob_sha {
        value["sha"] = Value::String(sha.to_string());
    } else {
        let content = entry
            .content
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        value["content"] = Value::String(content.into_owned());
    }
    value
}

/// Map a failed ref call onto a tagged error kind
fn classify_ref_failure(operation: &str, reference: &str, status: u16, message: String) -> GitHubError {
    let lowered = message.to_ascii_lowercase();
    if status == 404 || (status == 422 && lowered.contains("reference does not exist")) {
        GitHubError::ReferenceNotFound {
            reference: reference.to_string(),
        }
    } else if status == 422 && lowered.contains("not a fast forward") {
        GitHubError::NonFastForward {
            reference: reference.to_string(),
        }
    } else {
        GitHubError::Api {
            operation: operation.to_string(),
            status,
            message,
        }
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn decode<T: DeserializeOwned>(value: Value, operation: &str) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| GitHubError::Decode {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

fn applied_sha(value: Option<Value>, operation: &str) -> StoreResult<String> {
    let response: RefResponse = decode(value.unwrap_or(Value::Null), operation)?;
    Ok(response.object.sha)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BranchRepository {
    #[serde(rename = "ref")]
    reference: Option<RefNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultBranchRepository {
    default_branch_ref: Option<RefNode>,
}

#[derive(Debug, Deserialize)]
struct ObjectRepository {
    object: Option<CommitNode>,
}

#[derive(Debug, Deserialize)]
struct RefNode {
    name: String,
    target: Option<CommitNode>,
}

/// `... on Commit` fragment; empty for non-commit targets
#[derive(Debug, Deserialize)]
struct CommitNode {
    oid: Option<String>,
    tree: Option<TreeNode>,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    oid: String,
}

impl RefNode {
    fn into_branch_ref(self, operation: &str) -> StoreResult<BranchRef> {
        let (commit_id, tree_id) = self
            .target
            .and_then(CommitNode::into_ids)
            .ok_or_else(|| GitHubError::Decode {
                operation: operation.to_string(),
                reason: format!("{} does not point at a commit", self.name),
            })?;
        Ok(BranchRef {
            name: self.name,
            commit_id,
            tree_id,
        })
    }
}

impl CommitNode {
    fn into_ids(self) -> Option<(String, String)> {
        Some((self.oid?, self.tree?.oid))
    }
}

const BRANCH_QUERY: &str = "query($owner: String!, $repo: String!, $ref: String!) {
  repository(owner: $owner, name: $repo) {
    ref(qualifiedName: $ref) {
      name
      target {
        ... on Commit {
          oid
          tree {
            oid
          }
        }
      }
    }
  }
}";

const DEFAULT_BRANCH_QUERY: &str = "query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    defaultBranchRef {
      name
      target {
        ... on Commit {
          oid
          tree {
            oid
          }
        }
      }
    }
  }
}";

const COMMIT_TREE_QUERY: &str = "query($owner: String!, $repo: String!, $oid: GitObjectID!) {
  repository(owner: $owner, name: $repo) {
    object(oid: $oid) {
      ... on Commit {
        oid
        tree {
          oid
        }
      }
    }
  }
}";

impl ObjectStore for GitHubClient {
    async fn create_tree(
        &self,
        repo: &RepoSlug,
        entries: &[FileChange],
        base_tree: Option<&str>,
    ) -> StoreResult<String> {
        let tree = self.tree_payload(repo, entries).await?;
        let mut body = json!({ "tree": tree });
        if let Some(base) = base_tree {
            body["base_tree"] = Value::String(base.to_string());
        }
        let created: ShaResponse = self
            .rest(Method::POST, &self.repo_url(repo, "git/trees"), &body, "create_tree")
            .await?;
        Ok(created.sha)
    }

    async fn create_commit(&self, repo: &RepoSlug, request: &CommitRequest) -> StoreResult<String> {
        let body = json!({
            "message": request.message,
            "tree": request.tree_id,
            "parents": request.parents,
        });
        let created: ShaResponse = self
            .rest(Method::POST, &self.repo_url(repo, "git/commits"), &body, "create_commit")
            .await?;
        Ok(created.sha)
    }

    async fn update_ref(
        &self,
        repo: &RepoSlug,
        branch: &str,
        commit_id: &str,
        force: bool,
    ) -> StoreResult<String> {
        let url = self.repo_url(repo, &format!("git/refs/heads/{}", branch));
        let body = json!({ "sha": commit_id, "force": force });
        let reference = format!("refs/heads/{}", branch);
        let value = self
            .ref_request(Method::PATCH, &url, Some(&body), &reference, "update_ref")
            .await?;
        applied_sha(value, "update_ref")
    }

    async fn create_ref(&self, repo: &RepoSlug, branch: &str, commit_id: &str) -> StoreResult<String> {
        let reference = format!("refs/heads/{}", branch);
        let body = json!({ "ref": reference, "sha": commit_id });
        let value = self
            .ref_request(
                Method::POST,
                &self.repo_url(repo, "git/refs"),
                Some(&body),
                &reference,
                "create_ref",
            )
            .await?;
        applied_sha(value, "create_ref")
    }

    async fn delete_ref(&self, repo: &RepoSlug, branch: &str) -> StoreResult<()> {
        let url = self.repo_url(repo, &format!("git/refs/heads/{}", branch));
        let reference = format!("refs/heads/{}", branch);
        self.ref_request(Method::DELETE, &url, None, &reference, "delete_ref")
            .await?;
        Ok(())
    }

    async fn query_branch(&self, repo: &RepoSlug, branch: &str) -> StoreResult<Option<BranchRef>> {
        let variables = json!({
            "owner": repo.owner,
            "repo": repo.name,
            "ref": format!("refs/heads/{}", branch),
        });
        let data: RepositoryData<BranchRepository> =
            self.graphql(BRANCH_QUERY, variables, "query_branch").await?;
        match data.repository.and_then(|r| r.reference) {
            Some(node) => node.into_branch_ref("query_branch").map(Some),
            None => Ok(None),
        }
    }

    async fn query_default_branch(&self, repo: &RepoSlug) -> StoreResult<BranchRef> {
        let variables = json!({ "owner": repo.owner, "repo": repo.name });
        let data: RepositoryData<DefaultBranchRepository> = self
            .graphql(DEFAULT_BRANCH_QUERY, variables, "query_default_branch")
            .await?;
        data.repository
            .and_then(|r| r.default_branch_ref)
            .ok_or_else(|| GitHubError::Decode {
                operation: "query_default_branch".to_string(),
                reason: format!("{} has no default branch", repo),
            })?
            .into_branch_ref("query_default_branch")
    }

    async fn query_tree_of_commit(&self, repo: &RepoSlug, commit_id: &str) -> StoreResult<String> {
        let variables = json!({ "owner": repo.owner, "repo": repo.name, "oid": commit_id });
        let data: RepositoryData<ObjectRepository> = self
            .graphql(COMMIT_TREE_QUERY, variables, "query_tree_of_commit")
            .await?;
        data.repository
            .and_then(|r| r.object)
            .and_then(CommitNode::into_ids)
            .map(|(_, tree)| tree)
            .ok_or_else(|| GitHubError::Decode {
                operation: "query_tree_of_commit".to_string(),
                reason: format!("{} is not a commit in {}", commit_id, repo),
            })
    }
}

impl IssueComments for GitHubClient {
    async fn post_comment(&self, repo: &RepoSlug, number: u64, body: &str) -> StoreResult<()> {
        let url = self.repo_url(repo, &format!("issues/{}/comments", number));
        let _: Value = self
            .rest(Method::POST, &url, &json!({ "body": body }), "post_comment")
            .await?;
        Ok(())
    }
}
