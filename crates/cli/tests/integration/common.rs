//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Stand-in for `sphinx-build`: writes an index page into the output
/// directory, which is always the last argument.
pub const FAKE_SPHINX: &str = r#"#!/bin/sh
for out; do :; done
mkdir -p "$out"
echo "<html/>" > "$out/index.html"
echo "build succeeded"
"#;

/// Isolated test environment.
///
/// Each test gets its own project root, state file and `bin` directory that
/// is prepended to `PATH`.
pub struct TestEnv {
  pub temp: TempDir,
  pub state_path: PathBuf,
}

impl TestEnv {
  /// Project `kong` with `virtualenv` off, so the toolchain comes from `PATH`.
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let state_path = temp.path().join("state.json");
    let env = Self { temp, state_path };
    env.write_state(&env.state("kong"));
    env
  }

  /// Build state document for `slug` rooted in this environment.
  pub fn state(&self, slug: &str) -> Value {
    json!({
      "core": {
        "name": "Kong",
        "project": slug,
        "version": "latest",
        "versions": ["latest"],
        "virtualenv": false,
      },
      "vcs": {"repo": format!("https://github.com/kong/{}.git", slug), "branch": "master"},
      "fs": {"root": self.root().join("projects"), "slug": slug},
    })
  }

  pub fn write_state(&self, state: &Value) {
    std::fs::write(&self.state_path, serde_json::to_string_pretty(state).unwrap()).unwrap();
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn checkout(&self, slug: &str) -> PathBuf {
    self.root().join("projects").join(slug).join("checkouts")
  }

  pub fn artifacts(&self, slug: &str) -> PathBuf {
    self.root().join("projects").join(slug).join("artifacts")
  }

  /// Give project `slug` a `docs/conf.py`.
  pub fn add_conf(&self, slug: &str) {
    self.write_file(&format!("projects/{}/checkouts/docs/conf.py", slug), "project = 'Kong'\n");
  }

  /// Put an executable script named `name` on the command's `PATH`.
  #[cfg(unix)]
  pub fn install_tool(&self, name: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = self.write_file(&format!("bin/{}", name), script);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  }

  /// Get a pre-configured Command for the docbuild binary.
  ///
  /// `PATH` starts with this environment's `bin` directory and the
  /// `DOCBUILD_*` variables of the surrounding shell are cleared.
  pub fn docbuild_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("docbuild");
    let bin = self.root().join("bin");
    let path = match std::env::var_os("PATH") {
      Some(existing) => {
        let mut paths = vec![bin];
        paths.extend(std::env::split_paths(&existing));
        std::env::join_paths(paths).unwrap()
      }
      None => bin.into_os_string(),
    };
    cmd.env("PATH", path);
    for var in [
      "DOCBUILD_USE_DOCKER",
      "DOCBUILD_DOCKER_BIN",
      "DOCBUILD_DOCKER_IMAGE",
      "DOCBUILD_DOCKER_USER",
    ] {
      cmd.env_remove(var);
    }
    cmd
  }
}

/// Parse one line of command output as JSON.
pub fn parse_line(line: &str) -> Value {
  serde_json::from_str(line).unwrap_or_else(|e| panic!("not a JSON document: {}: {}", e, line))
}

/// Parse the whole of stdout as a single JSON document.
pub fn parse_stdout(output: &[u8]) -> Value {
  parse_line(String::from_utf8_lossy(output).trim())
}
