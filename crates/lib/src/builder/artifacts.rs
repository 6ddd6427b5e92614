use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{BuildError, Builder, OutputFormat};
use crate::command::CommandResult;
use crate::util;

impl Builder<'_> {
  pub(super) fn relocate(&self) -> Result<CommandResult, BuildError> {
    let output = self.output_path()?;
    if !output.exists() {
      let error = BuildError::ArtifactRelocation { path: output };
      warn!(error = %error, "skipping move");
      return Ok(CommandResult::new(0, "", ""));
    }

    let target = self.target();
    let slug = self.state.fs.slug.as_str();
    match self.format {
      OutputFormat::LocalMedia => {
        create_dir(&target)?;
        let archive = target.join(format!("{}.zip", slug));
        if archive.exists() {
          fs::remove_file(&archive).map_err(BuildError::io(&archive))?;
        }
        let prefix = format!("{}-{}", slug, self.state.core.version);
        info!(from = %output.display(), to = %archive.display(), "creating zip file");
        util::fs::zip_tree(&output, &archive, &prefix).map_err(|source| BuildError::Archive {
          path: archive.clone(),
          source,
        })?;
        Ok(CommandResult::message(archive.display().to_string()))
      }
      OutputFormat::Epub => {
        create_dir(&target)?;
        let found = util::fs::first_with_extension(&output, "epub").map_err(BuildError::io(&output))?;
        single_file(found, &target.join(format!("{}.epub", slug)))
      }
      OutputFormat::Pdf => {
        create_dir(&target)?;
        let found = pick_pdf(&output, slug)?;
        single_file(found, &target.join(format!("{}.pdf", slug)))
      }
      OutputFormat::Html | OutputFormat::HtmlDir | OutputFormat::SingleHtml | OutputFormat::Search => {
        info!(format = %self.format, from = %output.display(), to = %target.display(), "copying output");
        util::fs::replace_tree(&output, &target).map_err(BuildError::io(&target))?;
        Ok(CommandResult::message(target.display().to_string()))
      }
    }
  }
}

/// `{slug}.pdf`, then the capitalized slug, then whatever PDF sorts first.
fn pick_pdf(output: &Path, slug: &str) -> Result<Option<PathBuf>, BuildError> {
  let exact = output.join(format!("{}.pdf", slug));
  if exact.is_file() {
    return Ok(Some(exact));
  }
  let capitalized = output.join(format!("{}.pdf", util::fs::capitalize(slug)));
  if capitalized.is_file() {
    return Ok(Some(capitalized));
  }
  util::fs::first_with_extension(output, "pdf").map_err(BuildError::io(output))
}

fn single_file(found: Option<PathBuf>, to: &Path) -> Result<CommandResult, BuildError> {
  let Some(from) = found else {
    info!(target = %to.display(), "no file to move");
    return Ok(CommandResult::message(""));
  };
  info!(from = %from.display(), to = %to.display(), "moving file");
  util::fs::move_file(&from, to).map_err(BuildError::io(&from))?;
  Ok(CommandResult::message(to.display().to_string()))
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
  fs::create_dir_all(path).map_err(BuildError::io(path))
}
