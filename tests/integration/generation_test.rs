//! Generation Pipeline Integration Tests
//!
//! Drives `GenerationOrchestrator` end to end through a scripted provider:
//! - Truncated output repaired into a partial project
//! - Empty prompts rejected before any model call
//! - Prompt tier escalation across attempts
//! - Timeouts and quota/auth failures end the request immediately
//! - The attempt bound holds for every failing script

use std::time::Duration;

use cmdshift_backend::services::generation::{CanonicalResult, GenerationError};
use cmdshift_core::RepairKind;
use cmdshift_llm::LlmError;

use crate::support::{orchestrator, Reply, ScriptedProvider};

#[tokio::test]
async fn truncated_project_is_repaired_and_marked_partial() {
    let provider = ScriptedProvider::new(vec![Reply::truncated(
        r#"{"index.html": "<!DOCTYPE html><h"#,
    )]);

    let outcome = orchestrator(&provider)
        .generate("A landing page")
        .await
        .unwrap();

    assert!(outcome.partial);
    assert_eq!(
        outcome.repairs,
        vec![RepairKind::ClosedString, RepairKind::ClosedObject]
    );
    match outcome.result {
        CanonicalResult::Project { files } => {
            assert_eq!(files["index.html"], "<!DOCTYPE html><h");
        }
        other => panic!("expected Project, got {:?}", other),
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn empty_prompt_is_rejected_without_calls() {
    let provider = ScriptedProvider::new(vec![Reply::text("{}")]);

    let err = orchestrator(&provider).generate("").await.unwrap_err();

    assert!(matches!(err, GenerationError::InvalidInput(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn valid_project_on_first_attempt() {
    let provider = ScriptedProvider::new(vec![Reply::text(
        r#"{"index.html": "<!DOCTYPE html>", "styles/main.css": "body{}", "js/app.js": "init()", "README.md": "hi"}"#,
    )]);

    let outcome = orchestrator(&provider).generate("Portfolio").await.unwrap();

    assert!(!outcome.partial);
    assert!(outcome.repairs.is_empty());
    assert_eq!(outcome.invocations, 1);
    assert_eq!(provider.calls(), 1);
    match outcome.result {
        CanonicalResult::Project { files } => assert_eq!(files.len(), 4),
        other => panic!("expected Project, got {:?}", other),
    }
}

#[tokio::test]
async fn prose_then_json_recovers_on_simplified_retry() {
    let provider = ScriptedProvider::new(vec![
        Reply::text("Sure! Here is a description of the site you asked for."),
        Reply::text(r#"{"index.html": "<!DOCTYPE html><p>ok</p>"}"#),
    ]);

    let outcome = orchestrator(&provider).generate("Bakery").await.unwrap();

    assert!(outcome.result.is_project());
    assert_eq!(outcome.invocations, 2);
    let prompts = provider.system_prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("You are an expert full-stack web developer"));
    assert!(prompts[1].starts_with("Generate a simple web project"));
}

#[tokio::test]
async fn first_attempt_timeout_is_terminal() {
    let provider = ScriptedProvider::new(vec![
        Reply::text(r#"{"index.html": "late"}"#).delayed(Duration::from_secs(2)),
        Reply::text(r#"{"index.html": "never asked"}"#),
    ]);

    let err = orchestrator(&provider).generate("Slow site").await.unwrap_err();

    assert!(matches!(err, GenerationError::Timeout { .. }));
    assert_eq!(err.status_code(), 504);
    assert_eq!(err.category(), "Request timeout");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn cut_inside_a_string_value_is_repairable() {
    let provider = ScriptedProvider::new(vec![Reply::truncated(
        r#"{"index.html": "<p>x</p>", "script.js": "const a = [1, 2"#,
    )]);

    let outcome = orchestrator(&provider).generate("Counter").await.unwrap();

    assert!(outcome.partial);
    assert_eq!(provider.calls(), 1);
    match outcome.result {
        CanonicalResult::Project { files } => assert_eq!(files["script.js"], "const a = [1, 2"),
        other => panic!("expected Project, got {:?}", other),
    }
}

#[tokio::test]
async fn unrepairable_truncation_escalates_to_minimal_prompt() {
    let provider = ScriptedProvider::new(vec![
        Reply::truncated(r#"{"index.html": "<p>x</p>", "scri"#),
        Reply::text(r#"{"index.html": "<!DOCTYPE html><style></style><script></script>"}"#),
    ]);

    let outcome = orchestrator(&provider).generate("Counter").await.unwrap();

    assert!(!outcome.partial);
    assert_eq!(provider.calls(), 2);
    let prompts = provider.system_prompts();
    assert!(prompts[1].starts_with("Generate a minimal single-page website"));
    assert!(prompts[1].contains("under 8000 characters"));
}

#[tokio::test]
async fn quota_and_auth_failures_are_never_retried() {
    let failures = vec![
        LlmError::AuthenticationFailed {
            message: "invalid x-api-key".into(),
        },
        LlmError::RateLimited {
            message: "rate limited".into(),
            retry_after: Some(30),
        },
    ];

    for failure in failures {
        let provider = ScriptedProvider::new(vec![
            Reply::error(failure),
            Reply::text(r#"{"index.html": "<p></p>"}"#),
        ]);
        let err = orchestrator(&provider).generate("Shop").await.unwrap_err();

        assert!(matches!(err.status_code(), 401 | 429));
        assert_eq!(provider.calls(), 1);
    }
}

#[tokio::test]
async fn attempts_never_exceed_the_bound() {
    let scripts: Vec<Vec<Reply>> = vec![
        vec![Reply::text("prose"), Reply::text("more prose"), Reply::text("{}")],
        vec![
            Reply::truncated(r#"{"a": "b", "c"#),
            Reply::truncated(r#"{"a": "b", "c"#),
            Reply::truncated(r#"{"a": "b", "c"#),
        ],
        vec![
            Reply::error(LlmError::ServerError {
                message: "overloaded".into(),
                status: Some(529),
            }),
            Reply::error(LlmError::NetworkError {
                message: "reset".into(),
            }),
            Reply::text(r#"{"index.html": "<p></p>"}"#),
        ],
        vec![Reply::text("[1, 2, 3]"), Reply::text("\"a string\""), Reply::text("{}")],
    ];

    for script in scripts {
        let provider = ScriptedProvider::new(script);
        let result = orchestrator(&provider).generate("Anything").await;

        assert!(result.is_err());
        assert_eq!(provider.calls(), 2);
    }
}

#[tokio::test]
async fn legacy_component_falls_back_to_single_file() {
    let provider = ScriptedProvider::new(vec![Reply::text(
        "export default function App() {\n  return <main>Hello</main>;\n}",
    )]);

    let outcome = orchestrator(&provider).generate("Hello").await.unwrap();

    match outcome.result {
        CanonicalResult::SingleFile {
            code,
            language,
            framework,
        } => {
            assert_eq!(
                code,
                "export default function App() {\n  return <main>Hello</main>;\n}"
            );
            assert_eq!(language, "javascript");
            assert_eq!(framework, "react");
        }
        other => panic!("expected SingleFile, got {:?}", other),
    }
}
