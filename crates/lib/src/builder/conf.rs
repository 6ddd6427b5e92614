//! The configuration fragment appended to a project's `conf.py`.
//!
//! Values are rendered as Python literals from their JSON form: strings use
//! JSON escaping (valid Python), `null`/`true`/`false` become
//! `None`/`True`/`False`.

use serde_json::{Map, Value, json};

use crate::state::BuildState;

/// Where the config entry point conventionally lives, reported to themes.
const CONF_PY_PATH: &str = "/docs/";

/// Render the fragment for `state`.
pub fn render(state: &BuildState) -> Result<String, serde_json::Error> {
  let json_state = serde_json::to_string(state)?;
  let context = html_context(state);
  let core = &state.core;

  let mut out = String::new();
  out.push_str("\n###########################################################################\n");
  out.push_str("#          auto-created docbuild configuration                            #\n");
  out.push_str("###########################################################################\n\n");
  out.push_str("import json\n\n");
  out.push_str(&format!("docbuild_state = json.loads({})\n\n", py_literal(&Value::String(json_state))));

  out.push_str("if 'html_theme' not in globals():\n    html_theme = 'sphinx_rtd_theme'\n\n");
  out.push_str("if globals().get('websupport2_base_url', False):\n");
  out.push_str(&format!(
    "    websupport2_base_url = {}\n",
    py_literal(&json!(format!("{}/websupport", state.settings.api_host)))
  ));
  out.push_str(&format!(
    "    websupport2_static_url = {}\n\n",
    py_literal(&json!(state.settings.static_path))
  ));

  out.push_str("if 'templates_path' not in globals():\n    templates_path = []\n");
  if let Some(template_path) = &state.settings.template_path {
    out.push_str(&format!("templates_path.insert(0, {})\n", py_literal(&json!(template_path))));
  }
  out.push('\n');

  out.push_str(&format!("language = {}\n", py_literal(&json!(core.language))));
  if let Some(code) = &core.analytics_code {
    out.push_str(&format!("docbuild_analytics_code = {}\n", py_literal(&json!(code))));
  }
  if let Some(url) = &core.canonical_url {
    out.push_str(&format!("html_baseurl = {}\n", py_literal(&json!(url))));
  }
  out.push('\n');

  out.push_str("if 'html_context' not in globals():\n    html_context = {}\n");
  out.push_str(&format!("html_context.update({})\n", py_literal(&context)));
  Ok(out)
}

fn html_context(state: &BuildState) -> Value {
  let core = &state.core;
  let settings = &state.settings;
  let slug = state.vcs.username_repo();
  let (user, repo) = slug.map(|s| (s.user, s.repo)).unwrap_or_default();
  let display_github = state.vcs.display_github();
  let display_bitbucket = state.vcs.display_bitbucket();
  let remote_version = &state.vcs.branch;

  let downloads: Vec<Value> = core.downloads.iter().map(|(label, url)| json!([label, url])).collect();

  let mut ctx = Map::new();
  ctx.insert("slug".into(), json!(state.fs.slug));
  ctx.insert("name".into(), json!(core.name));
  ctx.insert("current_version".into(), json!(core.version));
  ctx.insert("versions".into(), json!(core.versions));
  ctx.insert("downloads".into(), Value::Array(downloads));
  ctx.insert("single_version".into(), json!(core.single_version));
  ctx.insert("language".into(), json!(core.language));
  ctx.insert("analytics_code".into(), json!(core.analytics_code));
  ctx.insert("canonical_url".into(), json!(core.canonical_url));
  ctx.insert("api_host".into(), json!(settings.api_host));
  ctx.insert("MEDIA_URL".into(), json!(settings.media_url));
  ctx.insert("PRODUCTION_DOMAIN".into(), json!(settings.production_domain));
  ctx.insert("static_path".into(), json!(settings.static_path));
  ctx.insert("conf_py_path".into(), json!(CONF_PY_PATH));
  ctx.insert("display_github".into(), json!(display_github));
  ctx.insert("github_user".into(), json!(if display_github { user.as_str() } else { "" }));
  ctx.insert("github_repo".into(), json!(if display_github { repo.as_str() } else { "" }));
  ctx.insert("github_version".into(), json!(remote_version));
  ctx.insert("display_bitbucket".into(), json!(display_bitbucket));
  ctx.insert("bitbucket_user".into(), json!(if display_bitbucket { user.as_str() } else { "" }));
  ctx.insert("bitbucket_repo".into(), json!(if display_bitbucket { repo.as_str() } else { "" }));
  ctx.insert("bitbucket_version".into(), json!(remote_version));
  Value::Object(ctx)
}

/// Render a JSON value as a Python literal.
fn py_literal(value: &Value) -> String {
  match value {
    Value::Null => "None".to_string(),
    Value::Bool(true) => "True".to_string(),
    Value::Bool(false) => "False".to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(_) => value.to_string(),
    Value::Array(items) => {
      let items: Vec<String> = items.iter().map(py_literal).collect();
      format!("[{}]", items.join(", "))
    }
    Value::Object(map) => {
      let items: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), py_literal(v)))
        .collect();
      format!("{{{}}}", items.join(", "))
    }
  }
}
