//! Core building blocks shared by every release flow
//!
//! - **config**: train.toml parsing (API endpoints, retry tuning)
//! - **context**: run-wide switches (security release, dry run)
//! - **error**: typed errors with captured command/API output
//! - **retry**: explicit retry policy for network reads
//! - **version**: release version value type and derived names

pub mod config;
pub mod context;
pub mod error;
pub mod retry;
pub mod version;
