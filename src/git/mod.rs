//! Git operations over a local working copy tracking 1..3 remotes
//!
//! All operations shell out to system git with argument vectors (never an
//! interpolated command string) and an isolated environment.

mod remote_repository;
mod repository_ops;

pub use remote_repository::{GitOutput, Remote, RemoteRepository};
pub use repository_ops::CommitOptions;
