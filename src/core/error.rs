//! Error types for release-train with contextual messages and exit codes
//!
//! Expected absence (a ref or tag that simply does not exist yet) is never an
//! error anywhere in this crate; it is represented as `false` or an empty
//! result. The variants here cover genuine failures only, and each one carries
//! the captured command or API output so an operator can diagnose a failed run
//! without re-running at higher verbosity.

use std::fmt;
use std::io;

/// Exit codes for release-train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad version string, invalid config, unknown project)
  User = 1,
  /// System error (git transport, network, I/O)
  System = 2,
  /// Consistency failure (remotes out of sync, merge conflicts)
  Consistency = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-train
#[derive(Debug)]
pub enum TrainError {
  /// Git operation errors
  Git(GitError),

  /// Remote content API errors
  Api(ApiError),

  /// Version parsing / resolution errors
  Version(VersionError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl TrainError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    TrainError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    TrainError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// I/O errors are folded into a contextual message so the caller sees what
  /// was being attempted; typed git/API errors already carry their context.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      TrainError::Message { message, context, help } => TrainError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      TrainError::Io(err) => TrainError::Message {
        message: ctx_str,
        context: Some(err.to_string()),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      TrainError::Git(e) => e.exit_code(),
      TrainError::Api(_) => ExitCode::System,
      TrainError::Version(_) => ExitCode::User,
      TrainError::Io(_) => ExitCode::System,
      TrainError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      TrainError::Git(e) => e.help_message(),
      TrainError::Api(e) => e.help_message(),
      TrainError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for TrainError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrainError::Git(e) => write!(f, "{}", e),
      TrainError::Api(e) => write!(f, "{}", e),
      TrainError::Version(e) => write!(f, "{}", e),
      TrainError::Io(e) => write!(f, "I/O error: {}", e),
      TrainError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for TrainError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TrainError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for TrainError {
  fn from(err: io::Error) -> Self {
    TrainError::Io(err)
  }
}

impl From<GitError> for TrainError {
  fn from(err: GitError) -> Self {
    TrainError::Git(err)
  }
}

impl From<ApiError> for TrainError {
  fn from(err: ApiError) -> Self {
    TrainError::Api(err)
  }
}

impl From<VersionError> for TrainError {
  fn from(err: VersionError) -> Self {
    TrainError::Version(err)
  }
}

impl From<String> for TrainError {
  fn from(msg: String) -> Self {
    TrainError::message(msg)
  }
}

impl From<&str> for TrainError {
  fn from(msg: &str) -> Self {
    TrainError::message(msg)
  }
}

impl From<serde_json::Error> for TrainError {
  fn from(err: serde_json::Error) -> Self {
    TrainError::message(format!("JSON error: {}", err))
  }
}

impl From<toml_edit::TomlError> for TrainError {
  fn from(err: toml_edit::TomlError) -> Self {
    TrainError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for TrainError {
  fn from(err: toml_edit::de::Error) -> Self {
    TrainError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for TrainError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    TrainError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<anyhow::Error> for TrainError {
  fn from(err: anyhow::Error) -> Self {
    TrainError::message(err.to_string())
  }
}

/// Git operation errors
///
/// Every variant that originates from a subprocess carries the captured
/// stdout/stderr of the failing command.
#[derive(Debug)]
pub enum GitError {
  /// A git command failed for a reason we have no specific variant for
  CommandFailed { command: String, output: String },

  /// Initial clone of the canonical remote failed
  CannotClone { url: String, output: String },

  /// Branch creation failed after a successful base fetch
  CannotCheckoutBranch { branch: String, output: String },

  /// `git commit` failed
  CannotCommit { output: String },

  /// Annotated tag creation failed
  CannotCreateTag { tag: String, output: String },

  /// A pull left unresolved merge conflicts in the index
  CannotPull {
    reference: String,
    remote: String,
    output: String,
  },

  /// Remotes disagree on the SHA of a ref
  OutOfSync {
    reference: String,
    remotes: Vec<(String, String)>,
  },
}

impl GitError {
  fn exit_code(&self) -> ExitCode {
    match self {
      GitError::OutOfSync { .. } | GitError::CannotPull { .. } => ExitCode::Consistency,
      _ => ExitCode::System,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      GitError::OutOfSync { reference, .. } => Some(format!(
        "A mirror of '{}' has diverged from the canonical remote. Reconcile the remotes manually before re-running.",
        reference
      )),
      GitError::CannotPull { reference, .. } => Some(format!(
        "Pulling '{}' produced merge conflicts. Resolve them on the remote branch; this tool never auto-resolves.",
        reference
      )),
      GitError::CannotCheckoutBranch { branch, .. } => Some(format!(
        "Branch '{}' could not be created even though its base was fetched. Check for a conflicting ref on the remote.",
        branch
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, output } => {
        write!(f, "Git command failed: {}\n{}", command, indent(output))
      }
      GitError::CannotClone { url, output } => {
        write!(f, "Failed to clone {}\n{}", url, indent(output))
      }
      GitError::CannotCheckoutBranch { branch, output } => {
        write!(f, "Failed to check out branch '{}'\n{}", branch, indent(output))
      }
      GitError::CannotCommit { output } => {
        write!(f, "Failed to commit\n{}", indent(output))
      }
      GitError::CannotCreateTag { tag, output } => {
        write!(f, "Failed to create tag '{}'\n{}", tag, indent(output))
      }
      GitError::CannotPull {
        reference,
        remote,
        output,
      } => {
        write!(
          f,
          "Conflicts were found when pulling '{}' from '{}'\n{}",
          reference,
          remote,
          indent(output)
        )
      }
      GitError::OutOfSync { reference, remotes } => {
        let report = remotes
          .iter()
          .map(|(name, sha)| format!("  {}: {}", name, sha))
          .collect::<Vec<_>>()
          .join("\n");
        write!(f, "Remotes are out of sync for '{}':\n{}", reference, report)
      }
    }
  }
}

/// Remote content API errors
#[derive(Debug)]
pub enum ApiError {
  /// Server answered with a non-success status
  Http { status: u16, url: String },

  /// Transport-level failure (connect, timeout, TLS)
  Request { message: String },

  /// Response body could not be decoded
  Decode { message: String },

  /// A retryable operation still failed after exhausting its attempts
  RetriesExhausted {
    operation: String,
    attempts: u32,
    last: String,
  },
}

impl ApiError {
  /// Transient failures worth another attempt: transport errors and
  /// 5xx-class responses. Creation calls are never retried regardless.
  pub fn retryable(&self) -> bool {
    match self {
      ApiError::Request { .. } => true,
      ApiError::Http { status, .. } => *status >= 500,
      _ => false,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ApiError::Http { status: 401, .. } | ApiError::Http { status: 403, .. } => {
        Some("Check the API token in RELEASE_API_TOKEN / RELEASE_DEV_API_TOKEN.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Http { status, url } => write!(f, "API request failed with status {}: {}", status, url),
      ApiError::Request { message } => write!(f, "API request error: {}", message),
      ApiError::Decode { message } => write!(f, "API response decode error: {}", message),
      ApiError::RetriesExhausted { operation, attempts, last } => {
        write!(f, "'{}' failed after {} attempts: {}", operation, attempts, last)
      }
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      ApiError::Decode {
        message: err.to_string(),
      }
    } else {
      ApiError::Request {
        message: err.to_string(),
      }
    }
  }
}

/// Version parsing and resolution errors
#[derive(Debug)]
pub enum VersionError {
  /// Input is not a `major.minor.patch[-rcN][-ee]` version
  Invalid { input: String },

  /// A dependency is missing from the lock file
  NotFound { name: String },

  /// A branch name does not encode a parseable `major-minor` pair
  BranchWithoutVersion { branch: String },
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::Invalid { input } => write!(f, "Invalid version: '{}'", input),
      VersionError::NotFound { name } => {
        write!(f, "Unable to find a version for dependency '{}'", name)
      }
      VersionError::BranchWithoutVersion { branch } => {
        write!(f, "Unable to determine a version from branch '{}'", branch)
      }
    }
  }
}

fn indent(output: &str) -> String {
  output
    .lines()
    .map(|line| format!("  {}", line))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Result type alias for release-train
pub type TrainResult<T> = Result<T, TrainError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> TrainResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> TrainResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<TrainError>,
{
  fn context(self, ctx: impl Into<String>) -> TrainResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> TrainResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &TrainError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
