//! CLI commands for release-train
//!
//! - **release**: Cut a tagged release of one project from its stable branch
//! - **auto-deploy**: Sync component pins and tag an auto-deploy branch
//!
//! Both commands take the global `--security-release` and `--dry-run` flags
//! through a [`RunContext`](crate::core::context::RunContext) built once at
//! startup.

pub mod auto_deploy;
pub mod release;

pub use auto_deploy::run_auto_deploy;
pub use release::run_release;
