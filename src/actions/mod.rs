//! Action dependency pinning.
//!
//! Workflow definitions in the same repository reference each other as
//! `<owner>/<repo>/<dir>@main`. Publishing a release rewrites those floating
//! references to immutable commit ids, one dependency layer per commit: a
//! module is only rewritten once everything it references has been published.

mod graph;
mod module;
pub mod workflow;

pub use graph::DependencyGraph;
pub use module::{ActionModule, FLOATING_REVISION, canonical_name, floating_reference};

use crate::commit::{CommitOptions, create_commit};
use crate::error::{ActionError, CliError, Result};
use crate::github::{ObjectStore, RepoSlug};
use crate::workspace;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause between waves
pub const DEFAULT_WAVE_DELAY: Duration = Duration::from_secs(2);

/// Whether `path` names a workflow definition file
pub fn is_action_definition(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name == "action.yml" || file_name == "action.yaml"
}

/// Options for one pinning run
#[derive(Debug, Clone)]
pub struct PinOptions {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch the wave commits are published to
    pub branch: String,
    /// First line of every wave commit message
    pub message: String,
    /// Commit the first wave pins against and builds on
    pub base_commit: String,
    /// Working copy root
    pub root: PathBuf,
    /// Pause before each wave that builds on a previous one
    pub wave_delay: Duration,
}

/// One published wave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinWave {
    /// Wave number, starting at 1
    pub number: usize,
    /// Commit published by this wave
    pub commit_id: String,
    /// Workflow files rewritten by this wave
    pub changed_paths: Vec<String>,
}

/// Result of a pinning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinOutcome {
    /// Last published commit, or the base commit when no wave ran
    pub commit_id: String,
    /// Published waves in order
    pub waves: Vec<PinWave>,
}

impl PinOptions {
    fn wave_message(&self, number: usize) -> String {
        format!("{}\n\npin internal action references (wave {})", self.message, number)
    }
}

/// Tracked workflow definitions of the working copy at `root`
pub async fn tracked_definitions(root: &Path) -> Result<Vec<String>> {
    Ok(workspace::tracked_files(root)
        .await?
        .into_iter()
        .filter(|path| is_action_definition(path))
        .collect())
}

/// Pin every tracked workflow definition in the working copy
pub async fn pin_action_references<S: ObjectStore>(store: &S, options: &PinOptions) -> Result<PinOutcome> {
    let paths = tracked_definitions(&options.root).await?;
    pin_action_files(store, options, &paths).await
}

/// Pin the given workflow definitions, publishing one commit per wave
pub async fn pin_action_files<S: ObjectStore>(
    store: &S,
    options: &PinOptions,
    paths: &[String],
) -> Result<PinOutcome> {
    if paths.is_empty() {
        log::info!("no workflow definition files found, nothing to pin");
        return Ok(PinOutcome {
            commit_id: options.base_commit.clone(),
            waves: Vec::new(),
        });
    }

    let repo = RepoSlug::new(options.owner.clone(), options.repo.clone());
    let modules = load_modules(&repo, options, paths).await?;
    let mut graph = DependencyGraph::build(modules);
    graph.validate_no_cycles()?;

    let mut latest = options.base_commit.clone();
    let mut waves = Vec::new();

    loop {
        let ready = graph.ready_set();
        let changed = graph.pin_ready(&ready, &latest)?;
        if changed.is_empty() {
            break;
        }
        if !waves.is_empty() {
            tokio::time::sleep(options.wave_delay).await;
        }

        let number = waves.len() + 1;
        log::info!("wave {}: pinning {} files at {}", number, changed.len(), latest);
        for path in &changed {
            if let Some(module) = graph.module(path) {
                let full_path = options.root.join(path);
                tokio::fs::write(&full_path, &module.content)
                    .await
                    .map_err(|source| ActionError::WriteFailed {
                        path: full_path.clone(),
                        source,
                    })?;
            }
        }
        graph.retire(&ready);

        let commit = create_commit(
            store,
            &CommitOptions {
                owner: options.owner.clone(),
                repo: options.repo.clone(),
                branch: options.branch.clone(),
                message: options.wave_message(number),
                files: changed.clone(),
                base_sha: Some(latest.clone()),
                root: options.root.clone(),
                ..CommitOptions::default()
            },
        )
        .await?
        .ok_or_else(|| CliError::ExecutionFailed {
            command: "pin".to_string(),
            reason: format!("wave {} produced no commit", number),
        })?;

        latest = commit.commit_id;
        waves.push(PinWave {
            number,
            commit_id: latest.clone(),
            changed_paths: changed,
        });
    }

    let unresolved = graph.unresolved();
    if !unresolved.is_empty() {
        return Err(ActionError::CircularDependency { modules: unresolved }.into());
    }

    log::info!("pinned action references in {} waves, head {}", waves.len(), latest);
    Ok(PinOutcome {
        commit_id: latest,
        waves,
    })
}

async fn load_modules(repo: &RepoSlug, options: &PinOptions, paths: &[String]) -> Result<Vec<ActionModule>> {
    let mut modules = Vec::with_capacity(paths.len());
    for path in paths {
        let full_path = options.root.join(path);
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| ActionError::Unreadable {
                path: full_path.clone(),
                source,
            })?;
        let module = ActionModule::parse(repo, path, content)
            .map_err(|source| ActionError::Schema { path: full_path, source })?;
        log::debug!(
            "{} is {} with {} @main dependencies",
            module.path,
            module.canonical_name,
            module.dependencies.len()
        );
        modules.push(module);
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_action_definition() {
        assert!(is_action_definition("action.yml"));
        assert!(is_action_definition("setup/action.yaml"));
        assert!(!is_action_definition("setup/my-action.yml"));
        assert!(!is_action_definition(".github/workflows/ci.yml"));
    }

    #[test]
    fn test_wave_message() {
        let options = PinOptions {
            owner: "octo".to_string(),
            repo: "hello".to_string(),
            branch: "release-v1".to_string(),
            message: "chore: release v1".to_string(),
            base_commit: "abc".to_string(),
            root: PathBuf::from("."),
            wave_delay: Duration::ZERO,
        };
        assert_eq!(
            options.wave_message(2),
            "chore: release v1\n\npin internal action references (wave 2)"
        );
    }
}
