//! Local working copy inspection.
//!
//! The working copy is only ever read through the `git` CLI and the
//! filesystem; nothing here mutates refs or the index. Dry runs work on a
//! staged copy instead.

mod artifacts;
mod git;
mod staging;

pub use artifacts::{ARTIFACT_DIR_NAME, find_dist_files};
pub use git::{current_branch, head_revision, tracked_files};
pub use staging::stage_files;
