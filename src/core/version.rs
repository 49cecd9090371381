//! Release version value type and the names derived from it
//!
//! A `Version` is parsed once at the start of a release request and never
//! mutated; tag and branch names are computed on demand from the parsed
//! parts. The format is `major.minor.patch`, optionally followed by a
//! release-candidate qualifier (`-rcN`) and an edition tag (`-ce` / `-ee`).

use crate::core::error::VersionError;
use std::fmt;

/// GitLab-style edition tag carried by some versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
  Ce,
  Ee,
}

/// Immutable semantic release version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  major: u64,
  minor: u64,
  patch: u64,
  rc: Option<u32>,
  edition: Option<Edition>,
}

impl Version {
  /// Parse `major.minor.patch[-rcN][-ce|-ee]`, with an optional leading `v`.
  pub fn parse(input: &str) -> Result<Self, VersionError> {
    let invalid = || VersionError::Invalid {
      input: input.to_string(),
    };

    let mut rest = input.strip_prefix('v').unwrap_or(input);

    let edition = if let Some(stripped) = rest.strip_suffix("-ee") {
      rest = stripped;
      Some(Edition::Ee)
    } else if let Some(stripped) = rest.strip_suffix("-ce") {
      rest = stripped;
      Some(Edition::Ce)
    } else {
      None
    };

    let rc = match rest.split_once("-rc") {
      Some((head, digits)) => {
        let rc = digits.parse::<u32>().map_err(|_| invalid())?;
        rest = head;
        Some(rc)
      }
      None => None,
    };

    let mut parts = rest.split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let patch = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

    if parts.next().is_some() {
      return Err(invalid());
    }

    Ok(Self {
      major,
      minor,
      patch,
      rc,
      edition,
    })
  }

  pub fn major(&self) -> u64 {
    self.major
  }

  pub fn minor(&self) -> u64 {
    self.minor
  }

  pub fn patch(&self) -> u64 {
    self.patch
  }

  pub fn is_rc(&self) -> bool {
    self.rc.is_some()
  }

  pub fn is_ee(&self) -> bool {
    self.edition == Some(Edition::Ee)
  }

  /// The same version without an edition tag
  pub fn to_ce(&self) -> Version {
    Version {
      edition: None,
      ..self.clone()
    }
  }

  /// The same version tagged as Enterprise Edition
  pub fn to_ee(&self) -> Version {
    Version {
      edition: Some(Edition::Ee),
      ..self.clone()
    }
  }

  /// Annotated tag name: `v{version}`
  pub fn tag(&self) -> String {
    format!("v{}", self)
  }

  /// Long-lived branch for this release line: `{major}-{minor}-stable[-ee]`
  pub fn stable_branch(&self) -> String {
    let suffix = if self.is_ee() { "-ee" } else { "" };
    format!("{}-{}-stable{}", self.major, self.minor, suffix)
  }

  /// `major.minor.patch`, without qualifier or edition
  pub fn to_patch(&self) -> String {
    format!("{}.{}.{}", self.major, self.minor, self.patch)
  }

  /// `major.minor`
  pub fn to_minor(&self) -> String {
    format!("{}.{}", self.major, self.minor)
  }

  /// Milestone title for this release line
  pub fn milestone_name(&self) -> String {
    self.to_minor()
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
    if let Some(rc) = self.rc {
      write!(f, "-rc{}", rc)?;
    }
    match self.edition {
      Some(Edition::Ee) => write!(f, "-ee")?,
      Some(Edition::Ce) => write!(f, "-ce")?,
      None => {}
    }
    Ok(())
  }
}
