//! Batch command integration tests.

use super::common::{FAKE_SPHINX, TestEnv, parse_line};

#[cfg(unix)]
#[test]
fn batch_prints_one_document_per_input_in_order() {
  let env = TestEnv::new();
  env.install_tool("sphinx-build", FAKE_SPHINX);
  env.add_conf("kong");
  env.add_conf("pip");

  let kong = env.state_path.clone();
  let pip = env.write_file("pip.json", &env.state("pip").to_string());
  let broken = env.write_file("broken.json", "not json");

  let output = env
    .docbuild_cmd()
    .arg("batch")
    .arg(&kong)
    .arg(&broken)
    .arg(&pip)
    .output()
    .unwrap();

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  let docs: Vec<_> = stdout.lines().map(parse_line).collect();
  assert_eq!(docs.len(), 3);
  assert_eq!(docs[0]["sphinx"]["build"][0], 0);
  assert!(docs[1]["doc_builder"][2].as_str().unwrap().starts_with("StateError: "));
  assert_eq!(docs[2]["sphinx"]["build"][0], 0);

  assert!(env.artifacts("kong").join("latest/sphinx/index.html").exists());
  assert!(env.artifacts("pip").join("latest/sphinx/index.html").exists());
}

#[test]
fn batch_rejects_colliding_states() {
  let env = TestEnv::new();
  let twin = env.write_file("twin.json", &env.state("kong").to_string());

  let output = env
    .docbuild_cmd()
    .arg("batch")
    .arg(&env.state_path)
    .arg(&twin)
    .output()
    .unwrap();

  let stdout = String::from_utf8_lossy(&output.stdout);
  let docs: Vec<_> = stdout.lines().map(parse_line).collect();
  assert_eq!(docs.len(), 2);
  assert!(docs[0]["doc_builder"][2].as_str().unwrap().starts_with("ConfigMissingError: "));
  assert_eq!(
    docs[1]["doc_builder"][2],
    "ConflictError: build paths collide with input #1"
  );
}

#[test]
fn batch_requires_a_state() {
  let env = TestEnv::new();

  env.docbuild_cmd().arg("batch").assert().failure();
}
