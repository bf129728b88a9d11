//! Generation Wire Types
//!
//! Request and success bodies for `POST /api/generate`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ prompt }`. The prompt is kept loosely typed so a non-string value
/// surfaces as an input error rather than a body parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
}

impl GenerateRequest {
    /// The prompt when it is a non-blank string
    pub fn prompt_text(&self) -> Option<&str> {
        match &self.prompt {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Multi-file success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGenerated {
    pub success: bool,
    pub files: BTreeMap<String, String>,
    pub is_project: bool,
    /// Set when a structural repair was applied
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repairs: Vec<String>,
    pub timestamp: String,
}

/// Legacy single-file success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SingleFileGenerated {
    pub success: bool,
    pub code: String,
    pub language: String,
    pub framework: String,
    pub is_project: bool,
    pub timestamp: String,
}

/// Success body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum GenerateResponse {
    Project(ProjectGenerated),
    SingleFile(SingleFileGenerated),
}

impl GenerateResponse {
    pub fn project(files: BTreeMap<String, String>, partial: bool, repairs: Vec<String>) -> Self {
        GenerateResponse::Project(ProjectGenerated {
            success: true,
            files,
            is_project: true,
            partial,
            repairs,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn single_file(code: String, language: String, framework: String) -> Self {
        GenerateResponse::SingleFile(SingleFileGenerated {
            success: true,
            code,
            language,
            framework,
            is_project: false,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }
}
