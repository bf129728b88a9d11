//! Prompt Builder
//!
//! Three instruction tiers for the generation model. Each retry trades
//! completeness for a better chance of fitting the token and time budget:
//!
//! | attempt | truncation suspected | tier       |
//! |---------|----------------------|------------|
//! | 0       | any                  | `Full`     |
//! | > 0     | no                   | `Simplified` |
//! | > 0     | yes                  | `Minimal`  |

use std::fmt;

use serde::Serialize;

/// Instruction tier sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTier {
    /// Complete multi-file project
    Full,
    /// index.html / style.css / script.js only
    Simplified,
    /// Single index.html with inline style and script, hard length cap
    Minimal,
}

impl PromptTier {
    /// Pick the tier for an attempt.
    pub fn select(attempt_index: u32, truncation_suspected: bool) -> Self {
        match (attempt_index, truncation_suspected) {
            (0, _) => PromptTier::Full,
            (_, false) => PromptTier::Simplified,
            (_, true) => PromptTier::Minimal,
        }
    }
}

impl fmt::Display for PromptTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PromptTier::Full => "full",
            PromptTier::Simplified => "simplified",
            PromptTier::Minimal => "minimal",
        })
    }
}

/// Inputs for one attempt's prompt. Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub user_prompt: String,
    pub attempt_index: u32,
    pub is_retry_attempt: bool,
    pub truncation_suspected: bool,
}

impl GenerationRequest {
    pub fn new(user_prompt: impl Into<String>, attempt_index: u32, truncation_suspected: bool) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            attempt_index,
            is_retry_attempt: attempt_index > 0,
            truncation_suspected,
        }
    }

    pub fn tier(&self) -> PromptTier {
        PromptTier::select(self.attempt_index, self.truncation_suspected)
    }
}

/// Renders the system prompt for an attempt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    minimal_char_cap: usize,
}

impl PromptBuilder {
    pub fn new(minimal_char_cap: usize) -> Self {
        Self { minimal_char_cap }
    }

    /// `build(userPrompt, attemptIndex, truncationSuspected)`
    pub fn build(&self, user_prompt: &str, attempt_index: u32, truncation_suspected: bool) -> String {
        self.render(PromptTier::select(attempt_index, truncation_suspected), user_prompt)
    }

    pub fn build_for(&self, request: &GenerationRequest) -> String {
        self.render(request.tier(), &request.user_prompt)
    }

    pub fn render(&self, tier: PromptTier, user_prompt: &str) -> String {
        match tier {
            PromptTier::Full => full_prompt(user_prompt),
            PromptTier::Simplified => simplified_prompt(user_prompt),
            PromptTier::Minimal => minimal_prompt(user_prompt, self.minimal_char_cap),
        }
    }
}

fn full_prompt(user_prompt: &str) -> String {
    format!(
        r##"You are an expert full-stack web developer. Generate a complete web project based on the following user request:

"{user_prompt}"

Requirements:
1. Generate a COMPLETE web project with all necessary files
2. Return the response as a JSON object where keys are file paths and values are file contents
3. Include all necessary files: HTML, CSS, JavaScript, and any configuration files
4. Use modern, clean code with proper structure
5. Make it visually appealing and responsive
6. Organize files into folders (e.g. 'index.html', 'styles/main.css', 'js/app.js')
7. Add a README.md file with project documentation
8. For component-based frameworks such as React, put each component in its own file
9. Ensure all files work together as a cohesive project

Return ONLY a valid JSON object in this format:
{{
  "index.html": "<!DOCTYPE html>...",
  "styles/main.css": "/* CSS code */",
  "js/app.js": "// JavaScript code",
  "README.md": "# Project Name\n\nDescription..."
}}

Do not include any text outside the JSON object. The JSON must be valid and parseable."##
    )
}

fn simplified_prompt(user_prompt: &str) -> String {
    format!(
        r#"Generate a simple web project based on: "{user_prompt}"

Return ONLY a valid JSON object with essential files:
{{
  "index.html": "<!DOCTYPE html>...",
  "style.css": "/* CSS code */",
  "script.js": "// JavaScript code"
}}

Keep it simple and concise. Return ONLY valid JSON."#
    )
}

fn minimal_prompt(user_prompt: &str, char_cap: usize) -> String {
    format!(
        r#"Generate a minimal single-page website based on: "{user_prompt}"

Return ONLY a valid JSON object with exactly one file:
{{
  "index.html": "<!DOCTYPE html>..."
}}

Put all CSS inside a <style> tag and all JavaScript inside a <script> tag in index.html.
Your previous answer was cut off. The entire response MUST stay under {char_cap} characters.
Prioritize working code over completeness. Return ONLY valid JSON."#
    )
}
