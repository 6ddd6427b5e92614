use std::path::Path;

use tracing::debug;

use super::{BuildEnvironment, ExecRequest};
use crate::command::{CommandError, CommandResult, DockerBuildCommand, Mount};
use crate::config::DockerConfig;
use crate::consts::CONTAINER_HOME;
use crate::state::BuildState;

/// Runs every command in a fresh container with the project bind-mounted.
///
/// Host paths in commands, working directories and environment values are
/// rewritten to their container counterparts before launch.
#[derive(Debug)]
pub struct DockerEnvironment {
  container_id: String,
  mounts: Vec<Mount>,
  config: DockerConfig,
}

impl DockerEnvironment {
  pub fn new(state: &BuildState, config: DockerConfig) -> Self {
    let home = Path::new(CONTAINER_HOME);
    let mounts = vec![
      Mount::new(&state.fs.checkout_path, home.join("checkouts")),
      Mount::new(&state.fs.env_path, home.join("envs")),
      Mount::new(&state.fs.artifact_path, home.join("artifacts")),
    ];
    Self {
      container_id: format!("{}-of-{}", state.core.version, state.fs.slug),
      mounts,
      config,
    }
  }

  /// Default container name: `{version}-of-{project}`.
  pub fn container_id(&self) -> &str {
    &self.container_id
  }

  pub fn mounts(&self) -> &[Mount] {
    &self.mounts
  }

  /// Rewrite host paths under a mount to the container side.
  ///
  /// Longer host paths are tried first, so nested mounts resolve to the most
  /// specific target. Replacement happens in one pass over `text`.
  pub fn translate(&self, text: &str) -> String {
    let mut prefixes: Vec<(String, String)> = self
      .mounts
      .iter()
      .map(|m| (m.host.to_string_lossy().into_owned(), m.container.to_string_lossy().into_owned()))
      .filter(|(host, _)| !host.is_empty())
      .collect();
    prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut prev = None;
    'scan: while let Some(ch) = rest.chars().next() {
      if starts_path(prev) {
        for (host, container) in &prefixes {
          if let Some(tail) = rest.strip_prefix(host.as_str()) {
            if ends_path_segment(tail) {
              out.push_str(container);
              prev = host.chars().last();
              rest = tail;
              continue 'scan;
            }
          }
        }
      }
      out.push(ch);
      prev = Some(ch);
      rest = &rest[ch.len_utf8()..];
    }
    out
  }

  fn translate_path(&self, path: &Path) -> String {
    self.translate(&path.to_string_lossy())
  }
}

fn is_segment_char(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// A path may begin after `prev` only if `prev` cannot continue one.
fn starts_path(prev: Option<char>) -> bool {
  prev.is_none_or(|c| !(is_segment_char(c) || c == '/'))
}

fn ends_path_segment(tail: &str) -> bool {
  tail.chars().next().is_none_or(|c| !is_segment_char(c))
}

impl BuildEnvironment for DockerEnvironment {
  fn kind(&self) -> &'static str {
    "docker"
  }

  fn execute(&mut self, request: ExecRequest) -> Result<CommandResult, CommandError> {
    let command = request.command.map_text(|text| self.translate(text));
    let environment = request
      .environment
      .into_iter()
      .map(|(key, value)| {
        let value = self.translate(&value);
        (key, value)
      })
      .collect();
    let name = request.name.unwrap_or_else(|| self.container_id.clone());
    let mounts: Vec<Mount> = self.mounts.iter().cloned().chain(request.mounts).collect();

    let mut cmd = DockerBuildCommand::new(command)
      .name(name)
      .mounts(mounts)
      .binary(self.config.binary.clone())
      .image(self.config.image.clone())
      .remove(self.config.remove)
      .environment(environment);
    if let Some(user) = &self.config.user {
      cmd = cmd.user(user.clone());
    }
    if let Some(cwd) = request.cwd.as_deref() {
      cmd = cmd.workdir(self.translate_path(cwd));
    }

    debug!(container = %self.container_id, "running in container");
    cmd.run(request.input.as_deref())?;
    Ok(cmd.into_result())
  }
}
