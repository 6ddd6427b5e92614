//! Build state: the configuration snapshot for one build invocation.
//!
//! The transport form is a JSON document with four sections (`core`, `vcs`,
//! `fs`, `settings`). Unknown keys are rejected and serialization is
//! deterministic, so `to_json(from_json(to_json(s))) == to_json(s)`.

mod core;
mod overrides;
mod settings;
mod vcs;

pub use self::core::CoreState;
pub use overrides::{OVERRIDABLE_CORE_FIELDS, OverrideError, parse_overrides};
pub use settings::SettingsState;
pub use vcs::{RepoSlug, VcsHost, VcsState};

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filesystem::{FilesystemProject, Version};

#[derive(Debug, Error)]
pub enum StateError {
  #[error("failed to parse build state: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize build state: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Everything a builder needs to know about one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildState {
  #[serde(default)]
  pub core: CoreState,
  pub vcs: VcsState,
  pub fs: FilesystemProject,
  #[serde(default)]
  pub settings: SettingsState,
}

impl BuildState {
  pub fn new(core: CoreState, vcs: VcsState, fs: FilesystemProject) -> Self {
    Self {
      core,
      vcs,
      fs,
      settings: SettingsState::default(),
    }
  }

  pub fn from_json(text: &str) -> Result<Self, StateError> {
    serde_json::from_str(text).map_err(StateError::Parse)
  }

  /// Read a state document from `path`, or from stdin when `path` is `-`.
  pub fn from_path(path: &Path) -> Result<Self, StateError> {
    let text = if path == Path::new("-") {
      let mut buf = String::new();
      io::stdin().read_to_string(&mut buf).map_err(|source| StateError::Read {
        path: path.to_path_buf(),
        source,
      })?;
      buf
    } else {
      fs::read_to_string(path).map_err(|source| StateError::Read {
        path: path.to_path_buf(),
        source,
      })?
    };
    Self::from_json(&text)
  }

  /// Canonical compact JSON form.
  pub fn to_json(&self) -> Result<String, StateError> {
    serde_json::to_string(self).map_err(StateError::Serialize)
  }

  /// The version being built, with the pinned config entry point if any.
  pub fn version(&self) -> Version<'_> {
    self.fs.version(&self.core.version).with_conf(self.core.config_path())
  }
}
