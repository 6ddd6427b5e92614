//! Test utilities for docbuild-lib.
//!
//! Fixture states, the missing-binary probe, and a recording build
//! environment that lets builder tests run without a real toolchain.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::command::{CommandError, CommandResult};
use crate::environment::{BuildEnvironment, ExecRequest};
use crate::filesystem::FilesystemProject;
use crate::state::{BuildState, CoreState, VcsState};

/// A program path that never exists.
pub const MISSING_BINARY: &str = "/non-existant/foobar";

static MISSING_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:No such file or directory|not found)").expect("valid regex"));

/// Matches the error text for a missing binary, whether it came from the OS
/// (direct spawn) or from the shell.
pub fn missing_re() -> &'static Regex {
  &MISSING_RE
}

/// State for the `kong` project rooted at `root`, building `latest`.
pub fn kong_state(root: impl AsRef<Path>) -> BuildState {
  let core = CoreState {
    name: Some("Kong".to_string()),
    project: Some("kong".to_string()),
    versions: vec!["latest".to_string(), "0.2".to_string()],
    downloads: vec![("PDF".to_string(), "//readthedocs.org/projects/kong/downloads/pdf/latest/".to_string())],
    ..CoreState::default()
  };
  let vcs = VcsState::new("https://github.com/kong/kong.git", "master");
  BuildState::new(core, vcs, FilesystemProject::new(root.as_ref(), "kong"))
}

type Responder = Box<dyn FnMut(&ExecRequest) -> Result<CommandResult, CommandError>>;

/// A [`BuildEnvironment`] that records every request instead of running it.
///
/// Responses default to success; [`RecordingEnvironment::respond`] swaps in a
/// closure that may also create files to imitate the toolchain.
pub struct RecordingEnvironment {
  pub requests: Vec<ExecRequest>,
  responder: Responder,
}

impl Default for RecordingEnvironment {
  fn default() -> Self {
    Self {
      requests: Vec::new(),
      responder: Box::new(|_| Ok(CommandResult::new(0, "", ""))),
    }
  }
}

impl RecordingEnvironment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(mut self, f: impl FnMut(&ExecRequest) -> Result<CommandResult, CommandError> + 'static) -> Self {
    self.responder = Box::new(f);
    self
  }

  /// Fail (exit 1) every command whose line contains `needle`.
  pub fn failing(needle: &'static str) -> Self {
    Self::new().respond(move |req| {
      if req.command.to_line().contains(needle) {
        Ok(CommandResult::new(1, "", format!("{} failed", needle)))
      } else {
        Ok(CommandResult::new(0, "", ""))
      }
    })
  }

  /// Rendered command lines, in execution order.
  pub fn lines(&self) -> Vec<String> {
    self.requests.iter().map(|r| r.command.to_line()).collect()
  }
}

impl BuildEnvironment for RecordingEnvironment {
  fn kind(&self) -> &'static str {
    "recording"
  }

  fn execute(&mut self, request: ExecRequest) -> Result<CommandResult, CommandError> {
    let result = (self.responder)(&request);
    self.requests.push(request);
    result
  }
}
