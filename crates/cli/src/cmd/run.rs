//! Implementation of the `docbuild run` command.
//!
//! Loads a build state, merges overrides, runs the pipeline for the state's
//! documentation type plus any extra formats, and prints the results as JSON.
//! Failures are reported in the JSON document; the exit code stays 0.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{error, info};

use docbuild_lib::environment::for_config;
use docbuild_lib::pipeline::run_formats;
use docbuild_lib::state::parse_overrides;
use docbuild_lib::{BuildResult, BuildState, ExecutionConfig, OutputFormat};

use crate::ExecArgs;
use crate::output::{error_document_for, results_document};

pub fn cmd_run(state: &Path, overrides: Option<&Path>, formats: &[String], exec: &ExecArgs) -> Result<()> {
  let doc = match execution_config(exec) {
    Ok(config) => build_document(state, overrides, formats, &config),
    Err(err) => error_document_for(&err),
  };
  println!("{}", doc);
  Ok(())
}

/// Build one state file into its result document. Never fails.
pub(crate) fn build_document(
  state: &Path,
  overrides: Option<&Path>,
  formats: &[String],
  config: &ExecutionConfig,
) -> Value {
  let state = match load_state(state, overrides) {
    Ok(state) => state,
    Err(err) => {
      error!(error = %format!("{:#}", err), "invalid build state");
      return error_document_for(&err);
    }
  };
  match build_state(&state, formats, config) {
    Ok(results) => results_document(&results),
    Err(err) => {
      error!(error = %format!("{:#}", err), "build failed");
      error_document_for(&err)
    }
  }
}

pub(crate) fn build_state(
  state: &BuildState,
  formats: &[String],
  config: &ExecutionConfig,
) -> Result<BTreeMap<String, BuildResult>> {
  let primary = OutputFormat::from_key(&state.core.documentation_type)?;
  let extra = formats
    .iter()
    .map(|key| OutputFormat::from_key(key))
    .collect::<Result<Vec<_>, _>>()?;

  info!(
    project = %state.fs.slug,
    version = %state.core.version,
    primary = %primary,
    docker = config.use_docker,
    "starting build"
  );
  let mut env = for_config(state, config);
  Ok(run_formats(state, primary, &extra, env.as_mut())?)
}

pub(crate) fn load_state(path: &Path, overrides: Option<&Path>) -> Result<BuildState> {
  let mut state = BuildState::from_path(path)?;
  if let Some(path) = overrides {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read overrides {}", path.display()))?;
    let doc = parse_overrides(&text)?;
    state.apply_overrides(&doc)?;
  }
  Ok(state)
}

/// Defaults, then `DOCBUILD_*` environment variables, then flags.
pub(crate) fn execution_config(exec: &ExecArgs) -> Result<ExecutionConfig> {
  let mut config = ExecutionConfig::from_env()?;
  if exec.docker {
    config.use_docker = true;
  }
  if let Some(image) = &exec.image {
    config.docker.image = image.clone();
  }
  if let Some(user) = &exec.user {
    config.docker.user = Some(user.clone());
  }
  Ok(config)
}
