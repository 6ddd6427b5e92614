//! Run command integration tests.

use predicates::prelude::*;

use super::common::{FAKE_SPHINX, TestEnv, parse_stdout};

#[test]
fn missing_conf_reports_config_missing() {
  let env = TestEnv::new();

  let output = env.docbuild_cmd().arg("run").arg(&env.state_path).output().unwrap();

  assert!(output.status.success());
  let doc = parse_stdout(&output.stdout);
  let entry = doc["doc_builder"].as_array().unwrap();
  assert_eq!(entry[0], -1);
  assert!(entry[2].as_str().unwrap().starts_with("ConfigMissingError: "));
}

#[cfg(unix)]
#[test]
fn html_build_relocates_output() {
  let env = TestEnv::new();
  env.add_conf("kong");
  env.install_tool("sphinx-build", FAKE_SPHINX);

  let output = env.docbuild_cmd().arg("run").arg(&env.state_path).output().unwrap();

  assert!(output.status.success());
  let doc = parse_stdout(&output.stdout);
  assert_eq!(doc["sphinx"]["build"][0], 0);
  assert!(doc["sphinx"]["build"][1].as_str().unwrap().contains("build succeeded"));
  assert_eq!(doc["sphinx"]["move"][0], 0);

  assert!(env.artifacts("kong").join("latest/sphinx/index.html").exists());
  let conf = std::fs::read_to_string(env.checkout("kong").join("docs/conf.py")).unwrap();
  assert!(conf.starts_with("project = 'Kong'\n"));
  assert!(conf.contains("html_context"));
}

#[cfg(unix)]
#[test]
fn extra_format_builds_after_primary() {
  let env = TestEnv::new();
  env.add_conf("kong");
  env.install_tool("sphinx-build", FAKE_SPHINX);

  let output = env
    .docbuild_cmd()
    .arg("run")
    .arg(&env.state_path)
    .args(["--format", "sphinx_search"])
    .output()
    .unwrap();

  let doc = parse_stdout(&output.stdout);
  assert_eq!(doc["sphinx"]["build"][0], 0);
  assert_eq!(doc["sphinx_search"]["build"][0], 0);
  assert!(env.artifacts("kong").join("latest/sphinx_search/index.html").exists());
}

#[cfg(unix)]
#[test]
fn failing_build_is_reported_not_fatal() {
  let env = TestEnv::new();
  env.add_conf("kong");
  env.install_tool("sphinx-build", "#!/bin/sh\necho 'broken conf' >&2\nexit 2\n");

  let output = env.docbuild_cmd().arg("run").arg(&env.state_path).output().unwrap();

  assert!(output.status.success());
  let doc = parse_stdout(&output.stdout);
  assert_eq!(doc["sphinx"]["build"][0], 2);
  assert!(doc["sphinx"]["build"][2].as_str().unwrap().contains("broken conf"));
  assert!(doc["sphinx"].get("move").is_none());
}

#[test]
fn unknown_format_is_reported() {
  let env = TestEnv::new();
  env.add_conf("kong");

  env
    .docbuild_cmd()
    .arg("run")
    .arg(&env.state_path)
    .args(["--format", "mkdocs_json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("UnknownFormatError: "));
}

#[test]
fn invalid_state_is_reported() {
  let env = TestEnv::new();
  let path = env.write_file("broken.json", "{\"core\": ");

  env
    .docbuild_cmd()
    .arg("run")
    .arg(path)
    .assert()
    .success()
    .stdout(predicate::str::starts_with(r#"{"doc_builder":[-1,"","StateError: "#));
}

#[test]
fn state_read_from_stdin() {
  let env = TestEnv::new();
  let state = std::fs::read_to_string(&env.state_path).unwrap();

  env
    .docbuild_cmd()
    .arg("run")
    .write_stdin(state)
    .assert()
    .success()
    .stdout(predicate::str::contains("ConfigMissingError"));
}

#[test]
fn invalid_docker_flag_value_is_reported() {
  let env = TestEnv::new();

  env
    .docbuild_cmd()
    .arg("run")
    .arg(&env.state_path)
    .env("DOCBUILD_USE_DOCKER", "maybe")
    .assert()
    .success()
    .stdout(predicate::str::contains("ConfigError: "));
}

#[cfg(unix)]
#[test]
fn docker_wraps_commands_in_container() {
  let env = TestEnv::new();
  env.add_conf("kong");

  let output = env
    .docbuild_cmd()
    .arg("run")
    .arg(&env.state_path)
    .arg("--docker")
    .args(["--image", "docs-image"])
    .env("DOCBUILD_DOCKER_BIN", "echo")
    .output()
    .unwrap();

  let doc = parse_stdout(&output.stdout);
  let line = doc["sphinx"]["build"][1].as_str().unwrap();
  assert!(line.starts_with("run -i -v "), "{}", line);
  assert!(line.contains("--name=latest-of-kong"));
  assert!(line.contains("-w /home/docs/checkouts/docs"));
  assert!(line.contains("docs-image sphinx-build -E -b readthedocs"));
}
