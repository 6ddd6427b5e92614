//! On-disk layout for a project and its versions.
//!
//! # Layout
//!
//! ```text
//! {root}/{slug}/                 # doc_path
//! ├── checkouts/                 # checkout_path (unless overridden)
//! ├── envs/{version}/            # isolated interpreter environment per version
//! └── artifacts/{version}/{type} # relocated build output
//! ```

mod version;

pub use version::{DOC_DIR_CANDIDATES, DOC_TIE_BREAK_OFFSET, Version};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FilesystemError {
  /// No build configuration entry point exists in the checkout.
  #[error("no build-config entry point found: make sure there is a {file} under {}", searched.display())]
  ConfigMissing { file: String, searched: PathBuf },

  /// Several candidates exist and none satisfies the doc-directory tie-break.
  #[error("no build-config entry point found: {count} candidate {file} files and none under a doc directory")]
  ConfigAmbiguous { file: String, count: usize },

  /// A checkout-relative path that is absolute or climbs out with `..`.
  #[error("{} is not inside the checkout", path.display())]
  OutsideCheckout { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl FilesystemError {
  /// Missing (or undecidable) config entry points abort the whole build.
  pub fn is_config_missing(&self) -> bool {
    matches!(
      self,
      FilesystemError::ConfigMissing { .. } | FilesystemError::ConfigAmbiguous { .. }
    )
  }
}

/// Paths for one project on the build host.
///
/// `checkout_path`, `env_path` and `artifact_path` may be given explicitly;
/// otherwise they derive from `doc_path`. The serialized form always carries
/// the resolved paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFilesystemProject")]
pub struct FilesystemProject {
  pub root: PathBuf,
  pub slug: String,
  pub checkout_path: PathBuf,
  pub artifact_path: PathBuf,
  pub env_path: PathBuf,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilesystemProject {
  root: PathBuf,
  slug: String,
  #[serde(default)]
  checkout_path: Option<PathBuf>,
  #[serde(default)]
  artifact_path: Option<PathBuf>,
  #[serde(default)]
  env_path: Option<PathBuf>,
}

impl TryFrom<RawFilesystemProject> for FilesystemProject {
  type Error = String;

  fn try_from(raw: RawFilesystemProject) -> Result<Self, Self::Error> {
    if raw.slug.is_empty() {
      return Err("fs.slug must not be empty".to_string());
    }
    let mut project = FilesystemProject::new(raw.root, raw.slug);
    if let Some(path) = raw.checkout_path {
      project.checkout_path = path;
    }
    if let Some(path) = raw.artifact_path {
      project.artifact_path = path;
    }
    if let Some(path) = raw.env_path {
      project.env_path = path;
    }
    Ok(project)
  }
}

impl FilesystemProject {
  /// Derive the default layout under `root/slug`.
  pub fn new(root: impl Into<PathBuf>, slug: impl Into<String>) -> Self {
    let root = root.into();
    let slug = slug.into();
    let doc_path = root.join(&slug);
    Self {
      checkout_path: doc_path.join("checkouts"),
      artifact_path: doc_path.join("artifacts"),
      env_path: doc_path.join("envs"),
      root,
      slug,
    }
  }

  pub fn with_checkout_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.checkout_path = path.into();
    self
  }

  pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.artifact_path = path.into();
    self
  }

  pub fn with_env_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.env_path = path.into();
    self
  }

  pub fn doc_path(&self) -> PathBuf {
    self.root.join(&self.slug)
  }

  /// Create every project directory; existing ones are left alone.
  pub fn ensure_dirs(&self) -> Result<(), FilesystemError> {
    for path in [
      self.doc_path(),
      self.checkout_path.clone(),
      self.env_path.clone(),
      self.artifact_path.clone(),
    ] {
      create_dir(&path)?;
    }
    Ok(())
  }

  /// Handle for one version of this project.
  pub fn version<'a>(&'a self, slug: &'a str) -> Version<'a> {
    Version::new(self, slug)
  }
}

fn create_dir(path: &Path) -> Result<(), FilesystemError> {
  if !path.is_dir() {
    debug!(path = %path.display(), "creating directory");
  }
  fs::create_dir_all(path).map_err(|source| FilesystemError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}
