use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static GITHUB_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r"github.com/(.+)/(.+)(?:\.git){1}",
    r"github.com/(.+)/(.+)",
    r"github.com:(.+)/(.+).git",
  ]
  .iter()
  .map(|p| Regex::new(p).expect("valid regex"))
  .collect()
});

static BITBUCKET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r"bitbucket.org/(.+)/(.+)/",
    r"bitbucket.org/(.+)/(.+)",
    r"bitbucket.org:(.+)/(.+)\.git",
  ]
  .iter()
  .map(|p| Regex::new(p).expect("valid regex"))
  .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsHost {
  GitHub,
  Bitbucket,
}

/// Owner and repository name parsed from a hosted repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
  pub host: VcsHost,
  pub user: String,
  pub repo: String,
}

/// Version control information for the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VcsState {
  pub repo: String,
  pub branch: String,
}

impl VcsState {
  pub fn new(repo: impl Into<String>, branch: impl Into<String>) -> Self {
    Self {
      repo: repo.into(),
      branch: branch.into(),
    }
  }

  pub fn host(&self) -> Option<VcsHost> {
    if self.repo.contains("github") {
      Some(VcsHost::GitHub)
    } else if self.repo.contains("bitbucket") {
      Some(VcsHost::Bitbucket)
    } else {
      None
    }
  }

  /// Owner/repository pair for GitHub or Bitbucket URLs.
  ///
  /// Patterns are tried in order and the first match wins.
  pub fn username_repo(&self) -> Option<RepoSlug> {
    let host = self.host()?;
    let patterns = match host {
      VcsHost::GitHub => &*GITHUB_PATTERNS,
      VcsHost::Bitbucket => &*BITBUCKET_PATTERNS,
    };
    patterns.iter().find_map(|re| {
      let caps = re.captures(&self.repo)?;
      Some(RepoSlug {
        host,
        user: caps[1].to_string(),
        repo: caps[2].to_string(),
      })
    })
  }

  pub fn display_github(&self) -> bool {
    self.host() == Some(VcsHost::GitHub)
  }

  pub fn display_bitbucket(&self) -> bool {
    self.host() == Some(VcsHost::Bitbucket)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn slug(repo: &str) -> Option<(String, String)> {
    VcsState::new(repo, "master").username_repo().map(|s| (s.user, s.repo))
  }

  #[test]
  fn github_https() {
    assert_eq!(
      slug("https://github.com/username/repo.git"),
      Some(("username".to_string(), "repo".to_string()))
    );
    assert_eq!(
      slug("https://github.com/username/repo"),
      Some(("username".to_string(), "repo".to_string()))
    );
  }

  #[test]
  fn github_ssh() {
    assert_eq!(
      slug("git@github.com:username/repo.git"),
      Some(("username".to_string(), "repo".to_string()))
    );
  }

  #[test]
  fn bitbucket_urls() {
    assert_eq!(
      slug("https://bitbucket.org/team/project/"),
      Some(("team".to_string(), "project".to_string()))
    );
    assert_eq!(
      slug("git@bitbucket.org:team/project.git"),
      Some(("team".to_string(), "project".to_string()))
    );
  }

  #[test]
  fn other_hosts_have_no_slug() {
    let vcs = VcsState::new("https://gitlab.com/team/project.git", "main");
    assert_eq!(vcs.username_repo(), None);
    assert!(!vcs.display_github());
    assert!(!vcs.display_bitbucket());
  }

  #[test]
  fn display_flags_follow_host() {
    assert!(VcsState::new("https://github.com/a/b", "master").display_github());
    assert!(VcsState::new("https://bitbucket.org/a/b", "default").display_bitbucket());
  }
}
