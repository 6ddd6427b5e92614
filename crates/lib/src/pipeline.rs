//! Drive a builder through its stages and collect the results.
//!
//! ```text
//! ensure dirs -> setup_environment -> append_build_config -> build -> move_artifacts -> clean
//! ```
//!
//! The run stops at the first failing stage. A missing config entry point is
//! returned as an error; every other failure is recorded as a failed stage.

use std::collections::BTreeMap;

use tracing::{error, info, info_span, warn};

use crate::builder::{BuildError, BuildResult, Builder, OutputFormat, Stage};
use crate::command::CommandResult;
use crate::environment::BuildEnvironment;
use crate::state::BuildState;

/// Run the full pipeline for one format.
pub fn run_build(
  state: &BuildState,
  format: OutputFormat,
  env: &mut dyn BuildEnvironment,
) -> Result<BuildResult, BuildError> {
  let span = info_span!("build", project = %state.fs.slug, version = %state.core.version, format = %format);
  let _enter = span.enter();

  let mut results = BuildResult::new();
  if let Err(err) = state.fs.ensure_dirs() {
    let err = BuildError::from(err);
    record_failure(&mut results, Stage::Env, &err);
    return Ok(results);
  }

  let mut builder = Builder::new(state, format, env);

  let setup = builder.setup_environment();
  match setup {
    Ok(setup) => {
      let ok = setup.is_success();
      results.extend(setup);
      if !ok {
        warn!("environment setup failed, stopping");
        return Ok(results);
      }
    }
    Err(err) => return stage_error(results, Stage::Env, err),
  }

  if let Err(err) = builder.append_build_config() {
    return stage_error(results, Stage::Build, err);
  }

  let completed = build_move_clean(&mut builder, &mut results)?;
  info!(completed, success = results.is_success(), "build finished");
  Ok(results)
}

/// Run the primary format's full pipeline, then build, move and clean each
/// extra format in the same environment.
///
/// Stops at the first format that does not succeed; later formats are absent
/// from the output.
pub fn run_formats(
  state: &BuildState,
  primary: OutputFormat,
  extra: &[OutputFormat],
  env: &mut dyn BuildEnvironment,
) -> Result<BTreeMap<String, BuildResult>, BuildError> {
  let mut all = BTreeMap::new();

  let primary_result = run_build(state, primary, env)?;
  let mut ok = primary_result.is_success();
  all.insert(primary.key().to_string(), primary_result);

  for &format in extra.iter().filter(|f| **f != primary) {
    if !ok {
      warn!(format = %format, "skipping format after earlier failure");
      break;
    }
    let span = info_span!("build", project = %state.fs.slug, version = %state.core.version, format = %format);
    let _enter = span.enter();

    let mut results = BuildResult::new();
    let mut builder = Builder::new(state, format, env);
    build_move_clean(&mut builder, &mut results)?;
    ok = results.is_success();
    all.insert(format.key().to_string(), results);
  }

  Ok(all)
}

/// Returns whether the run may continue.
fn build_move_clean(builder: &mut Builder<'_>, results: &mut BuildResult) -> Result<bool, BuildError> {
  match builder.build() {
    Ok(result) => {
      let ok = result.successful();
      results.insert(Stage::Build, result);
      if !ok {
        warn!("build failed, stopping");
        return Ok(false);
      }
    }
    Err(err) => return stage_error_in(results, Stage::Build, err),
  }

  match builder.move_artifacts() {
    Ok(result) => {
      let ok = result.successful();
      results.insert(Stage::Move, result);
      if !ok {
        return Ok(false);
      }
    }
    Err(err) => return stage_error_in(results, Stage::Move, err),
  }

  if let Err(err) = builder.clean() {
    if err.is_fatal() {
      return Err(err);
    }
    warn!(error = %err, "failed to clean build output");
  }
  Ok(true)
}

fn stage_error(mut results: BuildResult, stage: Stage, err: BuildError) -> Result<BuildResult, BuildError> {
  stage_error_in(&mut results, stage, err)?;
  Ok(results)
}

fn stage_error_in(results: &mut BuildResult, stage: Stage, err: BuildError) -> Result<bool, BuildError> {
  if err.is_fatal() {
    error!(kind = err.kind(), error = %err, "build aborted");
    return Err(err);
  }
  record_failure(results, stage, &err);
  Ok(false)
}

fn record_failure(results: &mut BuildResult, stage: Stage, err: &BuildError) {
  warn!(stage = %stage, kind = err.kind(), error = %err, "stage failed");
  results.insert(stage, CommandResult::from_error(&format!("{}: {}", err.kind(), err)));
}
