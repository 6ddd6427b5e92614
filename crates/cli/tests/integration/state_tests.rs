//! State command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, parse_stdout};

#[test]
fn state_fills_in_defaults() {
  let env = TestEnv::new();

  let output = env.docbuild_cmd().arg("state").arg(&env.state_path).output().unwrap();

  assert!(output.status.success());
  let doc = parse_stdout(&output.stdout);
  assert_eq!(doc["core"]["documentation_type"], "sphinx");
  assert_eq!(doc["core"]["language"], "en");
  assert_eq!(doc["settings"]["production_domain"], "readthedocs.org");
  assert_eq!(
    doc["fs"]["checkout_path"].as_str().unwrap(),
    env.checkout("kong").to_string_lossy()
  );
}

#[test]
fn state_applies_overrides() {
  let env = TestEnv::new();
  let overrides = env.write_file(
    "overrides.yml",
    "core:\n  analytics_code: Wootles\n  version: evil\nsettings:\n  api_host: http://evil\n",
  );

  let output = env
    .docbuild_cmd()
    .arg("state")
    .arg(&env.state_path)
    .arg("--overrides")
    .arg(overrides)
    .output()
    .unwrap();

  assert!(output.status.success());
  let doc = parse_stdout(&output.stdout);
  assert_eq!(doc["core"]["analytics_code"], "Wootles");
  assert_eq!(doc["core"]["version"], "latest");
  assert_eq!(doc["settings"]["api_host"], "https://readthedocs.org");
}

#[test]
fn state_rejects_unknown_sections() {
  let env = TestEnv::new();
  let mut state = env.state("kong");
  state["extra"] = serde_json::json!({});
  env.write_state(&state);

  env
    .docbuild_cmd()
    .arg("state")
    .arg(&env.state_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("extra"));
}

#[test]
fn state_rejects_malformed_overrides() {
  let env = TestEnv::new();
  let overrides = env.write_file("overrides.yml", "core: [unclosed\n");

  env
    .docbuild_cmd()
    .arg("state")
    .arg(&env.state_path)
    .arg("--overrides")
    .arg(overrides)
    .assert()
    .failure();
}
