//! kodegen_release_branch - publish release branches through the GitHub API.
//!
//! Build artifacts are committed to a release branch without pushing from the
//! working copy, then the repository's own `@main` action references are
//! pinned to published commits.

use kodegen_release_branch::cli;
use kodegen_release_branch::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Fatal errors are never quiet
            let output = OutputManager::new(false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                let _ = output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
