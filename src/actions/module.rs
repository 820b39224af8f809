//! Workflow modules and their `@main` references.

use crate::actions::workflow;
use crate::github::RepoSlug;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

/// The floating revision that gets pinned
pub const FLOATING_REVISION: &str = "main";

/// One workflow definition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionModule {
    /// Repository-relative path
    pub path: String,
    /// Current file content, rewritten in place as references are pinned
    pub content: String,
    /// Name other modules use to reference this one
    pub canonical_name: String,
    /// Canonical names of other modules still referenced at `@main`
    pub dependencies: BTreeSet<String>,
}

/// Name a module at `path` is referenced by
///
/// `owner/repo` for a file at the repository root, `owner/repo/<dir>` otherwise.
pub fn canonical_name(repo: &RepoSlug, path: &str) -> String {
    let path = path.trim_start_matches("./");
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => format!("{}/{}", repo, dir),
        _ => repo.to_string(),
    }
}

/// Canonical name referenced by `uses` when it is `<owner>/<repo>(/<subpath>)?@main`
pub fn floating_reference<'a>(repo: &RepoSlug, uses: &'a str) -> Option<&'a str> {
    let (name, revision) = uses.trim().rsplit_once('@')?;
    if revision != FLOATING_REVISION {
        return None;
    }
    let prefix = repo.to_string();
    let rest = name.strip_prefix(prefix.as_str())?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(name)
    } else {
        None
    }
}

impl ActionModule {
    /// Parse a workflow definition, recording every same-repository `@main` reference
    pub fn parse(repo: &RepoSlug, path: &str, content: String) -> Result<Self, serde_yaml::Error> {
        let canonical_name = canonical_name(repo, path);
        let dependencies = workflow::step_references(&content)?
            .iter()
            .filter_map(|uses| floating_reference(repo, uses))
            .map(str::to_string)
            .collect();
        Ok(Self {
            path: path.to_string(),
            content,
            canonical_name,
            dependencies,
        })
    }

    /// Rewrite every `uses: <name>@main` to `uses: <name>@<commit_id>`
    ///
    /// Matches block and flow mappings, with or without quotes around the
    /// key or the value. Returns whether the content changed.
    pub fn pin_reference(&mut self, name: &str, commit_id: &str) -> bool {
        let pattern = format!(
            r#"(?m)((?:^|[\s{{,\-])["']?uses["']?[ \t]*:[ \t]*["']?){}@{}(["'\s,}}\]]|$)"#,
            regex::escape(name),
            FLOATING_REVISION
        );
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                log::warn!("cannot build pin pattern for {}: {}", name, e);
                return false;
            }
        };
        let rewritten = re.replace_all(&self.content, |caps: &Captures<'_>| {
            format!("{}{}@{}{}", &caps[1], name, commit_id, &caps[2])
        });
        if rewritten == self.content {
            return false;
        }
        self.content = rewritten.into_owned();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoSlug {
        RepoSlug::new("octo", "hello")
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name(&repo(), "action.yml"), "octo/hello");
        assert_eq!(canonical_name(&repo(), "setup/action.yaml"), "octo/hello/setup");
        assert_eq!(canonical_name(&repo(), "./tools/lint/action.yml"), "octo/hello/tools/lint");
    }

    #[test]
    fn test_floating_reference_restricted_to_repository() {
        assert_eq!(floating_reference(&repo(), "octo/hello/setup@main"), Some("octo/hello/setup"));
        assert_eq!(floating_reference(&repo(), "octo/hello@main"), Some("octo/hello"));
        assert_eq!(floating_reference(&repo(), "octo/hello-world/setup@main"), None);
        assert_eq!(floating_reference(&repo(), "other/hello/setup@main"), None);
        assert_eq!(floating_reference(&repo(), "octo/hello/setup@v1"), None);
        assert_eq!(
            floating_reference(&repo(), "octo/hello/setup@0123456789abcdef0123456789abcdef01234567"),
            None
        );
        assert_eq!(floating_reference(&repo(), "./local"), None);
    }

    #[test]
    fn test_parse_records_dependencies() {
        let content = "runs:\n  using: composite\n  steps:\n    - uses: octo/hello/b@main\n    - uses: actions/setup-node@main\n".to_string();
        let module = ActionModule::parse(&repo(), "a/action.yml", content).expect("valid");
        assert_eq!(module.canonical_name, "octo/hello/a");
        assert_eq!(
            module.dependencies.iter().collect::<Vec<_>>(),
            vec!["octo/hello/b"]
        );
    }

    #[test]
    fn test_pin_reference_rewrites_exact_name_only() {
        let content = concat!(
            "runs:\n",
            "  steps:\n",
            "    - uses: octo/hello/b@main\n",
            "    - uses: \"octo/hello/b@main\"\n",
            "    - uses: octo/hello/bb@main\n",
            "    - uses: octo/hello/b@main-next\n",
        )
        .to_string();
        let mut module = ActionModule::parse(&repo(), "a/action.yml", content).expect("valid");

        assert!(module.pin_reference("octo/hello/b", "abc123"));
        assert!(module.content.contains("- uses: octo/hello/b@abc123\n"));
        assert!(module.content.contains("- uses: \"octo/hello/b@abc123\"\n"));
        assert!(module.content.contains("- uses: octo/hello/bb@main\n"));
        assert!(module.content.contains("- uses: octo/hello/b@main-next\n"));

        assert!(!module.pin_reference("octo/hello/b", "abc123"));
    }

    #[test]
    fn test_pin_reference_in_flow_mappings() {
        let content = concat!(
            "runs:\n",
            "  steps:\n",
            "    - {uses: octo/hello/b@main}\n",
            "    - {name: lint, uses: 'octo/hello/b@main', with: {x: 1}}\n",
            "    - {\"uses\": \"octo/hello/b@main\"}\n",
            "    - {reuses: octo/hello/b@main}\n",
        )
        .to_string();
        let mut module = ActionModule::parse(&repo(), "a/action.yml", content).expect("valid");
        assert_eq!(
            module.dependencies.iter().collect::<Vec<_>>(),
            vec!["octo/hello/b"]
        );

        assert!(module.pin_reference("octo/hello/b", "abc123"));
        assert!(module.content.contains("- {uses: octo/hello/b@abc123}\n"));
        assert!(module.content.contains("uses: 'octo/hello/b@abc123', with"));
        assert!(module.content.contains("{\"uses\": \"octo/hello/b@abc123\"}"));
        assert!(module.content.contains("{reuses: octo/hello/b@main}"));
    }

    #[test]
    fn test_pin_reference_leaves_folded_scalars() {
        let content = "runs:\n  steps:\n    - uses: >-\n        octo/hello/b@main\n".to_string();
        let mut module = ActionModule::parse(&repo(), "a/action.yml", content).expect("valid");
        assert_eq!(module.dependencies.len(), 1);
        assert!(!module.pin_reference("octo/hello/b", "abc123"));
    }

    #[test]
    fn test_pin_reference_at_end_of_file() {
        let mut module = ActionModule {
            path: "a/action.yml".to_string(),
            content: "runs:\n  steps:\n    - uses: octo/hello@main".to_string(),
            canonical_name: "octo/hello/a".to_string(),
            dependencies: BTreeSet::new(),
        };
        assert!(module.pin_reference("octo/hello", "f00d"));
        assert!(module.content.ends_with("uses: octo/hello@f00d"));
    }
}
