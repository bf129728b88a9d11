//! Response Normalizer
//!
//! Maps a parsed completion into one of the two canonical output shapes and
//! hosts the legacy single-file compatibility shim. The shim is isolated
//! here so it can be replaced without touching the retry state machine.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::project::CodeSnapshot;

/// Language reported for single-file results.
pub const LEGACY_LANGUAGE: &str = "javascript";
/// Framework reported for single-file results.
pub const LEGACY_FRAMEWORK: &str = "react";

/// Key some models wrap the file map in.
const FILES_WRAPPER_KEY: &str = "files";

/// Openings that mark text as source code rather than prose or JSON.
const LEGACY_SOURCE_PREFIXES: &[&str] = &[
    "<",
    "function",
    "export",
    "import",
    "const ",
    "let ",
    "class ",
    "'use ",
    "\"use ",
    "//",
    "/*",
];

/// Canonical output of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalResult {
    /// Relative path -> file content; never empty.
    Project { files: BTreeMap<String, String> },
    /// Legacy single source string.
    SingleFile {
        code: String,
        language: String,
        framework: String,
    },
}

impl CanonicalResult {
    pub fn single_file(code: String) -> Self {
        CanonicalResult::SingleFile {
            code,
            language: LEGACY_LANGUAGE.to_string(),
            framework: LEGACY_FRAMEWORK.to_string(),
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, CanonicalResult::Project { .. })
    }
}

impl From<&CanonicalResult> for CodeSnapshot {
    fn from(result: &CanonicalResult) -> Self {
        match result {
            CanonicalResult::Project { files } => CodeSnapshot::Files(files.clone()),
            CanonicalResult::SingleFile { code, .. } => CodeSnapshot::Code(code.clone()),
        }
    }
}

/// Remove a markdown fenced-block wrapper around the completion.
///
/// The opening fence line (with any language tag) and the last closing
/// fence line are removed. A missing closing fence is tolerated since
/// truncated output never reaches it. Fences that only appear after the
/// first `{` belong to file contents and are left alone.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    if trimmed[..open].contains('{') {
        return trimmed;
    }

    let after_open = &trimmed[open + 3..];
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    match body.rfind("\n```") {
        Some(close) => body[..close].trim(),
        None => body.trim_end().trim_end_matches("```").trim(),
    }
}

/// Extract the file map from a parsed JSON value.
///
/// Accepts `{path: content, ...}` or the same map wrapped under a single
/// `"files"` key. The map must be non-empty and every value a string.
pub fn extract_project_files(value: Value) -> Result<BTreeMap<String, String>, String> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(format!(
                "expected a JSON object of files, got {}",
                json_kind(&other)
            ))
        }
    };

    if map.len() == 1 && map.get(FILES_WRAPPER_KEY).is_some_and(Value::is_object) {
        if let Some(Value::Object(inner)) = map.remove(FILES_WRAPPER_KEY) {
            map = inner;
        }
    }

    if map.is_empty() {
        return Err("JSON object contains no files".to_string());
    }

    let mut files = BTreeMap::new();
    for (path, content) in map {
        let path = path.trim().to_string();
        if path.is_empty() {
            return Err("file path cannot be empty".to_string());
        }
        match content {
            Value::String(content) => {
                if files.contains_key(&path) {
                    return Err(format!("duplicate file path '{}'", path));
                }
                files.insert(path, content);
            }
            other => {
                return Err(format!(
                    "content of '{}' is {}, expected a string",
                    path,
                    json_kind(&other)
                ))
            }
        }
    }
    Ok(files)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Whether unparseable text looks like a legacy source file (markup or a
/// JS module/component) rather than prose or broken JSON.
pub fn looks_like_legacy_source(text: &str) -> bool {
    let text = text.trim_start();
    if text.starts_with('{') || text.starts_with('[') {
        return false;
    }
    LEGACY_SOURCE_PREFIXES.iter().any(|p| text.starts_with(p))
}

/// Normalize legacy single-file source for the preview sandbox, which
/// expects a default-exported component.
///
/// Text that starts with neither `function` nor a doctype loses a leading
/// `export default`; text that (then) starts with `function` gains one.
pub fn normalize_legacy_source(text: &str) -> String {
    let text = text.trim();
    let code = if text.starts_with("function") || text.starts_with("<!DOCTYPE") {
        text
    } else {
        strip_default_export(text).unwrap_or(text)
    };

    if code.starts_with("function") {
        format!("export default {}", code)
    } else {
        code.to_string()
    }
}

/// `export<ws+>default<ws+>rest` -> `rest`
fn strip_default_export(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("export")?;
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let rest = trimmed.strip_prefix("default")?;
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    Some(trimmed)
}
