use std::fmt;

use serde::{Deserialize, Serialize};

use super::BuildError;

/// The output formats a build can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputFormat {
  Html,
  HtmlDir,
  SingleHtml,
  Search,
  LocalMedia,
  Epub,
  Pdf,
}

impl OutputFormat {
  pub const ALL: [OutputFormat; 7] = [
    OutputFormat::Html,
    OutputFormat::HtmlDir,
    OutputFormat::SingleHtml,
    OutputFormat::Search,
    OutputFormat::LocalMedia,
    OutputFormat::Epub,
    OutputFormat::Pdf,
  ];

  /// Look up a format by its registry key, e.g. `sphinx_pdf`.
  pub fn from_key(key: &str) -> Result<Self, BuildError> {
    Self::ALL
      .into_iter()
      .find(|format| format.key() == key)
      .ok_or_else(|| BuildError::UnknownFormat(key.to_string()))
  }

  /// Registry key; also names the artifact directory.
  pub fn key(self) -> &'static str {
    match self {
      OutputFormat::Html => "sphinx",
      OutputFormat::HtmlDir => "sphinx_htmldir",
      OutputFormat::SingleHtml => "sphinx_singlehtml",
      OutputFormat::Search => "sphinx_search",
      OutputFormat::LocalMedia => "sphinx_localmedia",
      OutputFormat::Epub => "sphinx_epub",
      OutputFormat::Pdf => "sphinx_pdf",
    }
  }

  /// Value for the generator's `-b` flag.
  pub fn sphinx_builder(self) -> &'static str {
    match self {
      OutputFormat::Html => "readthedocs",
      OutputFormat::HtmlDir => "readthedocsdirhtml",
      OutputFormat::SingleHtml => "readthedocssinglehtml",
      OutputFormat::Search => "json",
      OutputFormat::LocalMedia => "readthedocssinglehtmllocalmedia",
      OutputFormat::Epub => "epub",
      OutputFormat::Pdf => "latex",
    }
  }

  /// Generator output directory, relative to the config directory.
  pub fn output_dir(self) -> &'static str {
    match self {
      OutputFormat::Html | OutputFormat::HtmlDir | OutputFormat::SingleHtml => "_build/html",
      OutputFormat::Search => "_build/json",
      OutputFormat::LocalMedia => "_build/localmedia",
      OutputFormat::Epub => "_build/epub",
      OutputFormat::Pdf => "_build/latex",
    }
  }
}

impl fmt::Display for OutputFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}
