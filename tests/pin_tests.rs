#[cfg(test)]
mod tests {
    use kodegen_release_branch::actions::{PinOptions, pin_action_files};
    use kodegen_release_branch::error::{ActionError, ReleaseError};
    use kodegen_release_branch::github::InMemoryForge;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    const A: &str = "runs:\n  using: composite\n  steps:\n    - uses: octo/hello/b@main\n";
    const B: &str = "runs:\n  using: composite\n  steps:\n    - uses: octo/hello/c@main\n";
    const C: &str = "runs:\n  using: composite\n  steps:\n    - uses: actions/checkout@v4\n";

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
        fs::write(full, content).expect("write");
    }

    fn options(root: &Path, base_commit: &str) -> PinOptions {
        PinOptions {
            owner: "octo".to_string(),
            repo: "hello".to_string(),
            branch: "release-v1".to_string(),
            message: "chore: release v1".to_string(),
            base_commit: base_commit.to_string(),
            root: root.to_path_buf(),
            wave_delay: Duration::ZERO,
        }
    }

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    fn text(bytes: Option<Vec<u8>>) -> String {
        String::from_utf8(bytes.expect("file exists")).expect("utf-8")
    }

    #[tokio::test]
    async fn test_chain_pins_in_two_waves() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a/action.yml", A);
        write(dir.path(), "b/action.yml", B);
        write(dir.path(), "c/action.yml", C);

        let forge = InMemoryForge::new("main");
        let base = forge.seed_branch(
            "release-v1",
            &[("a/action.yml", A), ("b/action.yml", B), ("c/action.yml", C)],
            "chore: release v1",
        );
        let files = paths(&["a/action.yml", "b/action.yml", "c/action.yml"]);

        let outcome = pin_action_files(&forge, &options(dir.path(), &base), &files)
            .await
            .expect("pinned");

        assert_eq!(outcome.waves.len(), 2);
        let first = &outcome.waves[0];
        let second = &outcome.waves[1];
        assert_eq!(first.changed_paths, vec!["b/action.yml"]);
        assert_eq!(second.changed_paths, vec!["a/action.yml"]);
        assert_eq!(outcome.commit_id, second.commit_id);
        assert_eq!(forge.branch_head("release-v1"), Some(second.commit_id.clone()));

        assert_eq!(forge.changed_paths(&first.commit_id), vec!["b/action.yml"]);
        assert_eq!(forge.changed_paths(&second.commit_id), vec!["a/action.yml"]);
        assert_eq!(forge.parents_of(&first.commit_id), vec![base.clone()]);
        assert_eq!(forge.parents_of(&second.commit_id), vec![first.commit_id.clone()]);

        let pinned_b = text(forge.file_at(&first.commit_id, "b/action.yml"));
        assert!(pinned_b.contains(&format!("uses: octo/hello/c@{}", base)));
        let pinned_a = text(forge.file_at(&second.commit_id, "a/action.yml"));
        assert!(pinned_a.contains(&format!("uses: octo/hello/b@{}", first.commit_id)));
        assert_eq!(text(forge.file_at(&second.commit_id, "c/action.yml")), C);

        assert_eq!(
            fs::read_to_string(dir.path().join("a/action.yml")).expect("read"),
            pinned_a
        );
        assert_eq!(
            forge.message_of(&first.commit_id).as_deref(),
            Some("chore: release v1\n\npin internal action references (wave 1)")
        );
    }

    #[tokio::test]
    async fn test_rerun_on_pinned_files_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a/action.yml", A);
        write(dir.path(), "b/action.yml", B);
        write(dir.path(), "c/action.yml", C);
        let forge = InMemoryForge::new("main");
        let base = forge.seed_branch(
            "release-v1",
            &[("a/action.yml", A), ("b/action.yml", B), ("c/action.yml", C)],
            "seed",
        );
        let files = paths(&["a/action.yml", "b/action.yml", "c/action.yml"]);
        let outcome = pin_action_files(&forge, &options(dir.path(), &base), &files)
            .await
            .expect("pinned");

        let calls = forge.call_count();
        let rerun = pin_action_files(&forge, &options(dir.path(), &outcome.commit_id), &files)
            .await
            .expect("rerun");
        assert!(rerun.waves.is_empty());
        assert_eq!(rerun.commit_id, outcome.commit_id);
        assert_eq!(forge.call_count(), calls);
    }

    #[tokio::test]
    async fn test_no_definitions_returns_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        let forge = InMemoryForge::new("main");
        let outcome = pin_action_files(&forge, &options(dir.path(), "abc"), &[])
            .await
            .expect("noop");
        assert_eq!(outcome.commit_id, "abc");
        assert!(outcome.waves.is_empty());
        assert_eq!(forge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cycle_fails_before_any_remote_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a/action.yml", A);
        write(
            dir.path(),
            "b/action.yml",
            "runs:\n  using: composite\n  steps:\n    - uses: octo/hello/a@main\n",
        );
        let forge = InMemoryForge::new("main");
        let result = pin_action_files(
            &forge,
            &options(dir.path(), "abc"),
            &paths(&["a/action.yml", "b/action.yml"]),
        )
        .await;

        match result {
            Err(ReleaseError::Action(ActionError::CircularDependency { modules })) => {
                assert_eq!(modules, vec!["octo/hello/a", "octo/hello/b"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
        assert_eq!(forge.call_count(), 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("a/action.yml")).expect("read"),
            A
        );
    }

    #[tokio::test]
    async fn test_flow_style_steps_are_pinned() {
        let flow = "runs:\n  using: composite\n  steps:\n    - {uses: octo/hello/b@main}\n";
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a/action.yml", flow);
        write(dir.path(), "b/action.yml", C);
        let forge = InMemoryForge::new("main");
        let base = forge.seed_branch(
            "release-v1",
            &[("a/action.yml", flow), ("b/action.yml", C)],
            "seed",
        );

        let outcome = pin_action_files(
            &forge,
            &options(dir.path(), &base),
            &paths(&["a/action.yml", "b/action.yml"]),
        )
        .await
        .expect("pinned");

        assert_eq!(outcome.waves.len(), 1);
        assert_eq!(outcome.waves[0].changed_paths, vec!["a/action.yml"]);
        let pinned = text(forge.file_at(&outcome.commit_id, "a/action.yml"));
        assert!(pinned.contains(&format!("- {{uses: octo/hello/b@{}}}", base)));
    }

    #[tokio::test]
    async fn test_unmatched_reference_fails_without_publishing() {
        let folded = "runs:\n  steps:\n    - uses: >-\n        octo/hello/b@main\n";
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a/action.yml", folded);
        write(dir.path(), "b/action.yml", C);
        let forge = InMemoryForge::new("main");

        let result = pin_action_files(
            &forge,
            &options(dir.path(), "abc"),
            &paths(&["a/action.yml", "b/action.yml"]),
        )
        .await;

        match result {
            Err(ReleaseError::Action(ActionError::UnpinnableReference { path, name })) => {
                assert_eq!(path, "a/action.yml");
                assert_eq!(name, "octo/hello/b");
            }
            other => panic!("expected an unpinnable reference, got {other:?}"),
        }
        assert_eq!(forge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_wave_does_not_wait() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "b/action.yml", B);
        write(dir.path(), "c/action.yml", C);
        let forge = InMemoryForge::new("main");
        let base = forge.seed_branch("release-v1", &[("b/action.yml", B), ("c/action.yml", C)], "seed");

        let mut opts = options(dir.path(), &base);
        opts.wave_delay = Duration::from_secs(5);
        let started = std::time::Instant::now();
        let outcome = pin_action_files(&forge, &opts, &paths(&["b/action.yml", "c/action.yml"]))
            .await
            .expect("pinned");

        assert_eq!(outcome.waves.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_schema_error_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a/action.yml", "runs:\n  steps: 42\n");
        let forge = InMemoryForge::new("main");
        let result = pin_action_files(&forge, &options(dir.path(), "abc"), &paths(&["a/action.yml"])).await;
        assert!(matches!(
            result,
            Err(ReleaseError::Action(ActionError::Schema { .. }))
        ));
        assert_eq!(forge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_definition_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let forge = InMemoryForge::new("main");
        let result = pin_action_files(&forge, &options(dir.path(), "abc"), &paths(&["gone/action.yml"])).await;
        assert!(matches!(
            result,
            Err(ReleaseError::Action(ActionError::Unreadable { .. }))
        ));
    }
}
