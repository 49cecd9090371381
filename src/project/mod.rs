//! Static project definitions: remotes per role and API paths
//!
//! Each upstream project carries up to three remotes. The first configured
//! remote is the canonical one and is the reference point for consistency
//! checks. Security releases restrict the active set to the internal/dev
//! remote; normal releases use everything except the security remote.

use crate::core::context::RunContext;

/// Role of a configured remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRole {
  Canonical,
  Dev,
  Security,
}

impl RemoteRole {
  pub fn name(&self) -> &'static str {
    match self {
      RemoteRole::Canonical => "canonical",
      RemoteRole::Dev => "dev",
      RemoteRole::Security => "security",
    }
  }
}

/// One upstream project the release flow can touch
#[derive(Debug)]
pub struct Project {
  /// Short identifier, also the name of the local working copy directory
  pub key: &'static str,

  /// Remotes in declaration order; the first active one is canonical
  pub remotes: &'static [(RemoteRole, &'static str)],

  /// Single-line version-pointer file advertised by dependents, if any
  pub version_file: Option<&'static str>,
}

impl Project {
  /// Remotes active for this run, preserving declaration order.
  ///
  /// Security releases keep only the dev remote so no ref ever leaks to the
  /// public mirrors before the release is announced.
  pub fn remotes_for(&self, ctx: &RunContext) -> Vec<(String, String)> {
    self
      .remotes
      .iter()
      .filter(|(role, _)| {
        if ctx.security_release {
          *role == RemoteRole::Dev
        } else {
          *role != RemoteRole::Security
        }
      })
      .map(|(role, url)| (role.name().to_string(), (*url).to_string()))
      .collect()
  }

  /// API path (`group/project`) on the canonical host
  pub fn path(&self) -> String {
    extract_path(self.remotes[0].1)
  }

  /// API path on the dev host, falling back to the canonical path when the
  /// project has no dev remote
  pub fn dev_path(&self) -> String {
    self
      .remotes
      .iter()
      .find(|(role, _)| *role == RemoteRole::Dev)
      .map(|(_, url)| extract_path(url))
      .unwrap_or_else(|| self.path())
  }

  /// The path matching the API endpoint selected for this run
  pub fn path_for(&self, ctx: &RunContext) -> String {
    if ctx.security_release {
      self.dev_path()
    } else {
      self.path()
    }
  }
}

/// Derive `group/project` from an SSH-style clone URL.
fn extract_path(url: &str) -> String {
  let tail = url.rsplit_once(':').map(|(_, t)| t).unwrap_or(url);
  tail.trim_end_matches(".git").to_string()
}

pub static GITLAB_EE: Project = Project {
  key: "gitlab-ee",
  remotes: &[
    (RemoteRole::Canonical, "git@gitlab.com:gitlab-org/gitlab-ee.git"),
    (RemoteRole::Dev, "git@dev.gitlab.org:gitlab/gitlab-ee.git"),
    (RemoteRole::Security, "git@gitlab.com:gitlab-org/security/gitlab-ee.git"),
  ],
  version_file: None,
};

pub static GITLAB_CE: Project = Project {
  key: "gitlab-ce",
  remotes: &[
    (RemoteRole::Canonical, "git@gitlab.com:gitlab-org/gitlab-ce.git"),
    (RemoteRole::Dev, "git@dev.gitlab.org:gitlab/gitlabhq.git"),
    (RemoteRole::Security, "git@gitlab.com:gitlab-org/security/gitlab-ce.git"),
  ],
  version_file: None,
};

pub static OMNIBUS_GITLAB: Project = Project {
  key: "omnibus-gitlab",
  remotes: &[
    (RemoteRole::Canonical, "git@gitlab.com:gitlab-org/omnibus-gitlab.git"),
    (RemoteRole::Dev, "git@dev.gitlab.org:gitlab/omnibus-gitlab.git"),
    (RemoteRole::Security, "git@gitlab.com:gitlab-org/security/omnibus-gitlab.git"),
  ],
  version_file: None,
};

pub static CNG_IMAGE: Project = Project {
  key: "cng-image",
  remotes: &[
    (RemoteRole::Canonical, "git@gitlab.com:gitlab-org/build/CNG.git"),
    (RemoteRole::Dev, "git@dev.gitlab.org:gitlab/charts/components/images.git"),
  ],
  version_file: None,
};

pub static HELM_GITLAB: Project = Project {
  key: "helm-gitlab",
  remotes: &[
    (RemoteRole::Canonical, "git@gitlab.com:gitlab-org/charts/gitlab.git"),
    (RemoteRole::Dev, "git@dev.gitlab.org:gitlab/charts/gitlab.git"),
  ],
  version_file: None,
};

pub static DEPLOYER: Project = Project {
  key: "deployer",
  remotes: &[(RemoteRole::Canonical, "git@ops.gitlab.net:gitlab-com/gl-infra/deployer.git")],
  version_file: None,
};

pub static GITALY: Project = Project {
  key: "gitaly",
  remotes: &[
    (RemoteRole::Canonical, "git@gitlab.com:gitlab-org/gitaly.git"),
    (RemoteRole::Dev, "git@dev.gitlab.org:gitlab/gitaly.git"),
    (RemoteRole::Security, "git@gitlab.com:gitlab-org/security/gitaly.git"),
  ],
  version_file: Some("GITALY_SERVER_VERSION"),
};

pub static GITLAB_SHELL: Project = Project {
  key: "gitlab-shell",
  remotes: &[(RemoteRole::Canonical, "git@gitlab.com:gitlab-org/gitlab-shell.git")],
  version_file: Some("GITLAB_SHELL_VERSION"),
};

pub static GITLAB_WORKHORSE: Project = Project {
  key: "gitlab-workhorse",
  remotes: &[(RemoteRole::Canonical, "git@gitlab.com:gitlab-org/gitlab-workhorse.git")],
  version_file: Some("GITLAB_WORKHORSE_VERSION"),
};

pub static GITLAB_PAGES: Project = Project {
  key: "gitlab-pages",
  remotes: &[(RemoteRole::Canonical, "git@gitlab.com:gitlab-org/gitlab-pages.git")],
  version_file: Some("GITLAB_PAGES_VERSION"),
};

pub static GITLAB_ELASTICSEARCH_INDEXER: Project = Project {
  key: "gitlab-elasticsearch-indexer",
  remotes: &[(
    RemoteRole::Canonical,
    "git@gitlab.com:gitlab-org/gitlab-elasticsearch-indexer.git",
  )],
  version_file: Some("GITLAB_ELASTICSEARCH_INDEXER_VERSION"),
};

/// Components whose versions the application pins through single-line files
pub static COMPONENTS: &[&Project] = &[
  &GITALY,
  &GITLAB_ELASTICSEARCH_INDEXER,
  &GITLAB_PAGES,
  &GITLAB_SHELL,
  &GITLAB_WORKHORSE,
];
