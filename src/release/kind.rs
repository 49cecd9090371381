use crate::core::version::{Edition, Version};
use crate::project::{self, Project};

/// What is being released, and how its version is written into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
  Gitlab { edition: Edition },
  Gitaly,
  Omnibus,
}

impl ReleaseKind {
  pub fn project(&self) -> &'static Project {
    match self {
      ReleaseKind::Gitlab { edition: Edition::Ee } => &project::GITLAB_EE,
      ReleaseKind::Gitlab { edition: Edition::Ce } => &project::GITLAB_CE,
      ReleaseKind::Gitaly => &project::GITALY,
      ReleaseKind::Omnibus => &project::OMNIBUS_GITLAB,
    }
  }

  /// Name recorded in release metadata.
  pub fn release_name(&self) -> &'static str {
    match self {
      ReleaseKind::Gitlab { edition: Edition::Ee } => "gitlab-ee",
      ReleaseKind::Gitlab { edition: Edition::Ce } => "gitlab-ce",
      ReleaseKind::Gitaly => "gitaly",
      ReleaseKind::Omnibus => "omnibus-gitlab",
    }
  }

  /// Files rewritten to `version` on the stable branch, as
  /// `(path, content)` pairs.
  pub fn version_files(&self, version: &Version) -> Vec<(String, String)> {
    let mut files = vec![("VERSION".to_string(), format!("{}\n", version))];

    if matches!(self, ReleaseKind::Omnibus) {
      // The package pins the application at the same version it ships as.
      files.push(("GITLAB_VERSION".to_string(), format!("{}\n", version)));
    }

    files
  }

  /// Generated files folded into the version bump commit after the fact.
  pub fn amended_files(&self, version: &Version) -> Vec<(String, String)> {
    match self {
      ReleaseKind::Gitaly => {
        let content = format!(
          "# This file was auto-generated.\n\nmodule Gitaly\n  VERSION = '{}'\nend\n",
          version
        );
        vec![("ruby/proto/gitaly/version.rb".to_string(), content)]
      }
      _ => Vec::new(),
    }
  }

  /// Whether the stable branch is pushed back over master after the bump.
  pub fn update_master(&self) -> bool {
    true
  }
}
