use tracing::{debug, info};

use super::{BuildError, Builder, path_arg};
use crate::command::{CommandLine, CommandResult};
use crate::environment::ExecRequest;
use crate::util;

const LATEX_DIR: &str = "_build/latex";
const NO_TEX: &str = "No tex files found";

/// LaTeX runs twice so cross references resolve.
const PDFLATEX_PASSES: usize = 2;

impl Builder<'_> {
  pub(super) fn build_html(&mut self) -> Result<CommandResult, BuildError> {
    let conf_dir = self.version().conf_dir()?;
    let cmd = CommandLine::argv([
      self.sphinx_build(),
      "-E".to_string(),
      "-b".to_string(),
      self.format.sphinx_builder().to_string(),
      "-D".to_string(),
      self.language_flag(),
      ".".to_string(),
      self.format.output_dir().to_string(),
    ]);
    info!(format = %self.format, dir = %conf_dir.display(), "building docs");
    Ok(self.execute(ExecRequest::new(cmd).cwd(conf_dir)))
  }

  /// LaTeX sources first, then every `.tex` file through `pdflatex`.
  ///
  /// The pdflatex results of both passes fold into the latex result.
  pub(super) fn build_pdf(&mut self) -> Result<CommandResult, BuildError> {
    let conf_dir = self.version().conf_dir()?;
    let cmd = CommandLine::argv([
      self.sphinx_build(),
      "-b".to_string(),
      "latex".to_string(),
      "-D".to_string(),
      self.language_flag(),
      "-d".to_string(),
      "_build/doctrees".to_string(),
      ".".to_string(),
      LATEX_DIR.to_string(),
    ]);
    info!(format = %self.format, dir = %conf_dir.display(), "building latex");
    let mut result = self.execute(ExecRequest::new(cmd).cwd(&conf_dir));
    if result.failed() {
      return Ok(result);
    }

    let latex_dir = conf_dir.join(LATEX_DIR);
    let tex_files = util::fs::files_with_extension(&latex_dir, "tex").map_err(BuildError::io(&latex_dir))?;
    if tex_files.is_empty() {
      debug!(dir = %latex_dir.display(), "no tex files");
      result.merge(&CommandResult::new(0, NO_TEX, NO_TEX));
      return Ok(result);
    }

    for _ in 0..PDFLATEX_PASSES {
      for tex in &tex_files {
        let name = tex.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path_arg(tex));
        let cmd = CommandLine::argv(["pdflatex".to_string(), "-interaction=nonstopmode".to_string(), name]);
        let pass = self.execute(ExecRequest::new(cmd).cwd(&latex_dir));
        result.merge(&pass);
      }
    }
    Ok(result)
  }
}
