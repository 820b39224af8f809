//! Command execution.
//!
//! Every command runs against either the GitHub API or, with `--dry-run`, an
//! in-memory forge seeded from the local working copy.

mod commit;
mod helpers;
mod pin;
mod release;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::github::{IssueComments, ObjectStore};

use commit::execute_commit;
use pin::execute_pin;
use release::execute_release;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Validation errors are never quiet
        let output = super::OutputManager::new(false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = if config.is_dry_run() {
        match helpers::dry_run_forge(&args).await {
            Ok(forge) => {
                let result = dispatch(&forge, &args, &config).await;
                helpers::report_dry_run(&config, &forge);
                result
            }
            Err(e) => Err(e),
        }
    } else {
        match helpers::github_client(&args) {
            Ok(client) => dispatch(&client, &args, &config).await,
            Err(e) => Err(e),
        }
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!(
                "Command '{}' failed: {}",
                args.command.name(),
                e
            ));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() && !config.is_quiet() {
                config.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    config.println(&format!("  • {}", suggestion));
                }
                if e.is_recoverable() {
                    config.println("  • The failure looks transient, re-running may succeed");
                }
            }

            Ok(1)
        }
    }
}

async fn dispatch<S>(store: &S, args: &Args, config: &RuntimeConfig) -> Result<i32>
where
    S: ObjectStore + IssueComments,
{
    match &args.command {
        Command::Release { .. } => execute_release(store, args, config).await,
        Command::Commit { .. } => execute_commit(store, args, config).await,
        Command::Pin { .. } => execute_pin(store, args, config).await,
    }
}
