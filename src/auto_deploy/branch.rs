use crate::core::error::VersionError;

/// An auto-deploy branch such as `12-9-auto-deploy-20200226`.
///
/// Only the leading major and minor numbers matter here; the date suffix is
/// carried opaquely in the branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoDeployBranch {
  name: String,
  major: u64,
  minor: u64,
}

impl AutoDeployBranch {
  pub fn parse(name: &str) -> Result<Self, VersionError> {
    let mut parts = name.split('-');

    let major = parts.next().and_then(|p| p.parse().ok());
    let minor = parts.next().and_then(|p| p.parse().ok());

    match (major, minor) {
      (Some(major), Some(minor)) => Ok(AutoDeployBranch {
        name: name.to_string(),
        major,
        minor,
      }),
      _ => Err(VersionError::BranchWithoutVersion { branch: name.to_string() }),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn major(&self) -> u64 {
    self.major
  }

  pub fn minor(&self) -> u64 {
    self.minor
  }
}
