//! Multi-repository release orchestration
//!
//! Cuts tagged releases across the application, its packaging repository,
//! and its container images, keeping component version pins in sync along
//! the way. Git work happens in ephemeral local working copies driven over
//! the system `git` binary; repository content on the hosting service is
//! read and written through its REST API.

pub mod api;
pub mod auto_deploy;
pub mod commands;
pub mod components;
pub mod core;
pub mod git;
pub mod project;
pub mod release;
pub mod ui;
