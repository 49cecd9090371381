//! Run context - explicit run-wide switches, built once and passed everywhere
//!
//! Whether this run is a security release and whether it is a rehearsal
//! ("dry run") are decided at startup and threaded through every component
//! constructor instead of being read from ambient process state. Remote-role
//! selection and push/tag no-op behavior follow from this context alone,
//! which keeps both testable without environment mutation.

/// Run-wide switches for one release invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunContext {
  /// Security releases use only the internal/dev remote and the dev API
  /// endpoint; normal releases use every remote except the security one.
  pub security_release: bool,

  /// Dry runs log push/tag/commit intent instead of mutating remotes, while
  /// preserving return shapes so the whole flow can still be exercised.
  pub dry_run: bool,
}

impl RunContext {
  pub fn new(security_release: bool, dry_run: bool) -> Self {
    Self {
      security_release,
      dry_run,
    }
  }

  /// Merge in the environment switches honored for compatibility with CI
  /// schedules: `SECURITY=true` and `TEST=true`.
  pub fn from_env(security_release: bool, dry_run: bool) -> Self {
    let env_flag = |name: &str| {
      std::env::var(name)
        .map(|v| !v.is_empty() && v != "false" && v != "0")
        .unwrap_or(false)
    };

    Self {
      security_release: security_release || env_flag("SECURITY"),
      dry_run: dry_run || env_flag("TEST"),
    }
  }
}
