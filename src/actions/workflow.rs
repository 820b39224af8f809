//! Workflow definition decoding.
//!
//! Only the step references matter here: `runs.steps[].uses` for composite
//! actions, and `jobs.<id>.uses` / `jobs.<id>.steps[].uses` for workflows.
//! Every other key is ignored; a document whose shape contradicts these
//! fields is a schema error.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct WorkflowDocument {
    #[serde(default)]
    runs: Option<Runs>,
    #[serde(default)]
    jobs: Option<serde_yaml::Mapping>,
}

#[derive(Debug, Default, Deserialize)]
struct Runs {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
struct Job {
    #[serde(default)]
    uses: Option<String>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
struct Step {
    #[serde(default)]
    uses: Option<String>,
}

/// Decode the ordered `uses:` values of a workflow definition
pub fn step_references(source: &str) -> Result<Vec<String>, serde_yaml::Error> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document: Option<WorkflowDocument> = serde_yaml::from_str(source)?;
    let Some(document) = document else {
        return Ok(Vec::new());
    };

    let mut references: Vec<String> = document
        .runs
        .map(|runs| runs.steps.into_iter().filter_map(|s| s.uses).collect())
        .unwrap_or_default();

    for (_, job) in document.jobs.unwrap_or_default() {
        let job: Job = serde_yaml::from_value(job)?;
        references.extend(job.uses);
        references.extend(job.steps.into_iter().filter_map(|s| s.uses));
    }

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_action_steps() {
        let source = r#"
name: setup
runs:
  using: composite
  steps:
    - uses: actions/checkout@v4
    - run: echo hi
      shell: bash
    - uses: "octo/hello/install@main"
"#;
        let refs = step_references(source).expect("valid action");
        assert_eq!(refs, vec!["actions/checkout@v4", "octo/hello/install@main"]);
    }

    #[test]
    fn test_javascript_action_has_no_steps() {
        let source = "runs:\n  using: node20\n  main: dist/index.js\n";
        assert!(step_references(source).expect("valid action").is_empty());
    }

    #[test]
    fn test_workflow_jobs_in_order() {
        let source = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: octo/hello/build@main
  release:
    uses: octo/hello/.github/workflows/release.yml@main
"#;
        let refs = step_references(source).expect("valid workflow");
        assert_eq!(
            refs,
            vec![
                "octo/hello/build@main",
                "octo/hello/.github/workflows/release.yml@main"
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        assert!(step_references("").expect("empty").is_empty());
    }

    #[test]
    fn test_schema_violation() {
        assert!(step_references("runs:\n  steps: not-a-list\n").is_err());
        assert!(step_references("runs:\n  steps:\n    - uses: [1, 2]\n").is_err());
        assert!(step_references("jobs:\n  build:\n    steps: 3\n").is_err());
    }
}
