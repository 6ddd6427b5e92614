use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{FilesystemError, FilesystemProject};
use crate::consts::CONF_FILE;

/// Conventional documentation directories, in lookup order.
pub const DOC_DIR_CANDIDATES: &[&str] = &["docs", "doc", "Doc"];

/// Byte offset from which a candidate path must contain `doc` to win a
/// tie between several config entry points.
pub const DOC_TIE_BREAK_OFFSET: usize = 70;

/// One version of a project on disk.
#[derive(Debug, Clone, Copy)]
pub struct Version<'a> {
  pub project: &'a FilesystemProject,
  pub slug: &'a str,
  conf: Option<&'a Path>,
}

impl<'a> Version<'a> {
  pub fn new(project: &'a FilesystemProject, slug: &'a str) -> Self {
    Self {
      project,
      slug,
      conf: None,
    }
  }

  /// Pin the config entry point, relative to the checkout.
  pub fn with_conf(mut self, conf: Option<&'a Path>) -> Self {
    self.conf = conf;
    self
  }

  pub fn checkout_path(&self) -> &'a Path {
    &self.project.checkout_path
  }

  /// Where the relocated output of `kind` lives for this version.
  pub fn artifact_path(&self, kind: &str) -> PathBuf {
    self.project.artifact_path.join(self.slug).join(kind)
  }

  /// Isolated interpreter environment for this version.
  pub fn env_path(&self) -> PathBuf {
    self.project.env_path.join(self.slug)
  }

  pub fn env_bin(&self, bin: &str) -> PathBuf {
    self.env_path().join("bin").join(bin)
  }

  /// The documentation root in the checkout: the first conventional doc
  /// directory that exists, else the checkout itself.
  pub fn full_doc_path(&self) -> PathBuf {
    let checkout = self.checkout_path();
    DOC_DIR_CANDIDATES
      .iter()
      .map(|dir| checkout.join(dir))
      .find(|path| path.exists())
      .unwrap_or_else(|| checkout.to_path_buf())
  }

  /// Resolve `relative` against the checkout.
  ///
  /// Absolute paths and paths that climb out through `..` are refused, so
  /// repository-supplied settings cannot point the build at host files.
  pub fn checkout_file(&self, relative: &Path) -> Result<PathBuf, FilesystemError> {
    let contained = relative
      .components()
      .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
      return Err(FilesystemError::OutsideCheckout {
        path: relative.to_path_buf(),
      });
    }
    Ok(self.checkout_path().join(relative))
  }

  /// Files named `file_name` under the documentation root.
  pub fn find(&self, file_name: &str) -> Vec<PathBuf> {
    find_named(&self.full_doc_path(), file_name)
  }

  /// Files named `file_name` anywhere in the checkout.
  pub fn full_find(&self, file_name: &str) -> Vec<PathBuf> {
    info!(checkout = %self.checkout_path().display(), file = file_name, "searching whole checkout");
    find_named(self.checkout_path(), file_name)
  }

  /// Locate the build configuration entry point.
  ///
  /// Searches the documentation root first and the whole checkout second.
  /// With several candidates, the first whose path contains `doc` at or past
  /// [`DOC_TIE_BREAK_OFFSET`] bytes wins. A pinned entry point outside the
  /// checkout counts as missing.
  pub fn conf_file(&self) -> Result<PathBuf, FilesystemError> {
    if let Some(conf) = self.conf {
      match self.checkout_file(conf) {
        Ok(path) if path.is_file() => return Ok(path),
        Ok(_) => {}
        Err(err) => warn!(error = %err, "ignoring pinned config entry point"),
      }
      return Err(FilesystemError::ConfigMissing {
        file: conf.display().to_string(),
        searched: self.checkout_path().to_path_buf(),
      });
    }

    let mut files = self.find(CONF_FILE);
    if files.is_empty() {
      files = self.full_find(CONF_FILE);
    }

    match files.len() {
      0 => Err(FilesystemError::ConfigMissing {
        file: CONF_FILE.to_string(),
        searched: self.checkout_path().to_path_buf(),
      }),
      1 => Ok(files.remove(0)),
      count => {
        debug!(count, "several config entry points, applying doc tie-break");
        files
          .into_iter()
          .find(|path| doc_after_offset(path))
          .ok_or(FilesystemError::ConfigAmbiguous {
            file: CONF_FILE.to_string(),
            count,
          })
      }
    }
  }

  /// Directory holding the config entry point; the toolchain runs from here.
  pub fn conf_dir(&self) -> Result<PathBuf, FilesystemError> {
    let conf = self.conf_file()?;
    Ok(conf.parent().map(Path::to_path_buf).unwrap_or_default())
  }
}

fn find_named(root: &Path, file_name: &str) -> Vec<PathBuf> {
  WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|entry| match entry {
      Ok(entry) => Some(entry),
      Err(err) => {
        debug!(error = %err, "skipping unreadable entry");
        None
      }
    })
    .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
    .map(|entry| entry.into_path())
    .collect()
}

fn doc_after_offset(path: &Path) -> bool {
  path
    .as_os_str()
    .as_encoded_bytes()
    .get(DOC_TIE_BREAK_OFFSET..)
    .is_some_and(|tail| tail.windows(3).any(|w| w == b"doc"))
}
