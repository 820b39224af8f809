//! Build artifact discovery.

use crate::error::{CliError, Result};
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Directory name build output is collected from
pub const ARTIFACT_DIR_NAME: &str = "dist";

const EXCLUDED_DIRS: [&str; 2] = ["node_modules", ".git"];

fn is_excluded(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => EXCLUDED_DIRS.iter().any(|excluded| name == *excluded),
        _ => false,
    })
}

fn repository_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Every file below a `dist` directory of the working copy
///
/// Paths are relative to `root`, `/`-separated and sorted. Anything under
/// `node_modules` or `.git` is skipped.
pub fn find_dist_files(root: &Path) -> Result<Vec<String>> {
    let root_str = root.to_str().ok_or_else(|| CliError::InvalidArguments {
        reason: format!("Invalid UTF-8 in working copy path: {}", root.display()),
    })?;
    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(root_str.trim_end_matches('/')),
        ARTIFACT_DIR_NAME
    );
    let entries = glob::glob(&pattern).map_err(|e| CliError::InvalidArguments {
        reason: format!("Invalid glob pattern '{}': {}", pattern, e),
    })?;

    let mut files = BTreeSet::new();
    for entry in entries {
        let dist = entry.map_err(std::io::Error::from)?;
        let Ok(relative) = dist.strip_prefix(root) else {
            continue;
        };
        if is_excluded(relative) {
            continue;
        }

        for file in walkdir::WalkDir::new(&dist) {
            let file = file.map_err(std::io::Error::from)?;
            if file.file_type().is_dir() {
                continue;
            }
            if let Ok(relative) = file.path().strip_prefix(root) {
                if !is_excluded(relative) {
                    files.insert(repository_path(relative));
                }
            }
        }
    }

    log::debug!("found {} build artifacts under {}", files.len(), root.display());
    Ok(files.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, path: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
        fs::write(full, "x").expect("write");
    }

    #[test]
    fn test_collects_nested_dist_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "dist/index.js");
        touch(dir.path(), "setup/dist/index.js");
        touch(dir.path(), "setup/dist/licenses/LICENSE.txt");
        touch(dir.path(), "setup/src/main.ts");
        touch(dir.path(), "node_modules/pkg/dist/index.js");

        let files = find_dist_files(dir.path()).expect("artifacts");
        assert_eq!(
            files,
            vec![
                "dist/index.js",
                "setup/dist/index.js",
                "setup/dist/licenses/LICENSE.txt"
            ]
        );
    }

    #[test]
    fn test_no_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "action.yml");
        assert!(find_dist_files(dir.path()).expect("artifacts").is_empty());
    }
}
