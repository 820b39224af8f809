#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn cli() -> Command {
        let mut cmd = Command::cargo_bin("kodegen_release_branch").expect("binary builds");
        cmd.env_remove("GITHUB_REPOSITORY")
            .env_remove("GITHUB_TOKEN")
            .env_remove("GH_TOKEN")
            .env_remove("GITHUB_OUTPUT");
        cmd
    }

    #[test]
    fn test_help_lists_subcommands() {
        cli()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("release"))
            .stdout(predicate::str::contains("commit"))
            .stdout(predicate::str::contains("pin"));
    }

    #[test]
    fn test_release_requires_version() {
        cli()
            .args(["--repo", "octo/hello", "release"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("VERSION"));
    }

    #[test]
    fn test_missing_repository_is_rejected() {
        cli()
            .args(["release", "v1.0.0"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--repo is required"));
    }

    #[test]
    fn test_missing_token_fails_with_suggestion() {
        let dir = tempfile::tempdir().expect("tempdir");
        cli()
            .current_dir(dir.path())
            .args(["--repo", "octo/hello", "commit", "-b", "topic", "-m", "msg", "--empty"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_noop_commit_needs_no_remote() {
        let dir = tempfile::tempdir().expect("tempdir");
        cli()
            .current_dir(dir.path())
            .args(["--repo", "octo/hello", "--github-token", "t", "commit", "-b", "topic", "-m", "msg"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to commit"));
    }

    fn git(root: &std::path::Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .current_dir(root)
            .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
            .args(args)
            .status()
            .expect("git runs");
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn test_dry_run_pin_leaves_working_copy_alone() {
        let setup = "runs:\n  using: composite\n  steps:\n    - uses: octo/hello/install@main\n";
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("setup")).expect("mkdir");
        std::fs::create_dir_all(dir.path().join("install")).expect("mkdir");
        std::fs::write(dir.path().join("setup/action.yml"), setup).expect("write");
        std::fs::write(dir.path().join("install/action.yml"), "runs:\n  using: node20\n").expect("write");
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "init"]);

        cli()
            .current_dir(dir.path())
            .args([
                "--repo",
                "octo/hello",
                "--dry-run",
                "--wave-delay-ms",
                "0",
                "pin",
                "-b",
                "release-v1",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 waves published"))
            .stdout(predicate::str::contains("Dry run, nothing was sent to GitHub"));

        assert_eq!(
            std::fs::read_to_string(dir.path().join("setup/action.yml")).expect("read"),
            setup
        );
    }
}
