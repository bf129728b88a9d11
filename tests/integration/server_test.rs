//! HTTP Transport Integration Tests
//!
//! Starts the server on a loopback port and talks raw HTTP/1.1 to it:
//! - Health, CORS preflight and 404 bodies
//! - The generate endpoint's success and error bodies
//! - The outer request deadline

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use cmdshift_backend::models::settings::{Environment, ServerConfig};
use cmdshift_backend::services::generation::{AttemptBudget, RetryPolicy};
use cmdshift_backend::{AppState, Server};

use crate::support::{app_state, app_state_with_policy, Reply, ScriptedProvider};

struct RawResponse {
    status: u16,
    head: String,
    body: Vec<u8>,
}

impl RawResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn start(state: Arc<AppState>) -> (String, CancellationToken) {
    let server = Server::bind_to("127.0.0.1:0", state).await.unwrap();
    let address = server.local_addr().unwrap().to_string();
    let shutdown = CancellationToken::new();
    tokio::spawn(server.run(shutdown.clone()));
    (address, shutdown)
}

async fn send(address: &str, raw: String) -> RawResponse {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await.unwrap();

    let split = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header block");
    let head = String::from_utf8(bytes[..split].to_vec()).unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    RawResponse {
        status,
        head,
        body: bytes[split + 4..].to_vec(),
    }
}

fn post_json(path: &str, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    )
}

#[tokio::test]
async fn health_reports_service() {
    let provider = ScriptedProvider::new(Vec::new());
    let (address, shutdown) = start(app_state(&provider, ServerConfig::default())).await;

    let response = send(&address, "GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n".into()).await;

    assert_eq!(response.status, 200);
    let json = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "cmdshift-backend");
    assert_eq!(json["provider_configured"], true);
    assert!(response
        .head
        .contains("Access-Control-Allow-Origin: http://localhost:5173"));
    shutdown.cancel();
}

#[tokio::test]
async fn preflight_and_unknown_routes() {
    let provider = ScriptedProvider::new(Vec::new());
    let (address, shutdown) = start(app_state(&provider, ServerConfig::default())).await;

    let response = send(
        &address,
        "OPTIONS /api/generate HTTP/1.1\r\nHost: localhost\r\n\r\n".into(),
    )
    .await;
    assert_eq!(response.status, 204);
    assert!(response.head.contains("Access-Control-Allow-Methods"));

    let response = send(&address, "GET /api/nothing HTTP/1.1\r\nHost: localhost\r\n\r\n".into()).await;
    assert_eq!(response.status, 404);
    let json = response.json();
    assert_eq!(json["error"], "Not Found");
    assert_eq!(json["message"], "Cannot GET /api/nothing");
    shutdown.cancel();
}

#[tokio::test]
async fn generate_returns_project_files() {
    let provider = ScriptedProvider::new(vec![Reply::text(
        "```json\n{\"index.html\": \"<!DOCTYPE html><p>Menu</p>\"}\n```",
    )]);
    let (address, shutdown) = start(app_state(&provider, ServerConfig::default())).await;

    let response = send(&address, post_json("/api/generate", r#"{"prompt": "Cafe menu"}"#)).await;

    assert_eq!(response.status, 200);
    let json = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["isProject"], true);
    assert_eq!(json["files"]["index.html"], "<!DOCTYPE html><p>Menu</p>");
    assert!(json.get("partial").is_none());
    assert_eq!(provider.calls(), 1);
    shutdown.cancel();
}

#[tokio::test]
async fn generate_rejects_missing_prompt() {
    let provider = ScriptedProvider::new(Vec::new());
    let (address, shutdown) = start(app_state(&provider, ServerConfig::default())).await;

    let response = send(&address, post_json("/api/generate", r#"{"prompt": "   "}"#)).await;
    assert_eq!(response.status, 400);
    let json = response.json();
    assert_eq!(json["error"], "Invalid request");
    assert_eq!(json["message"], "Prompt is required and must be a non-empty string");

    let response = send(&address, post_json("/api/generate", "{oops")).await;
    assert_eq!(response.status, 400);
    assert_eq!(provider.calls(), 0);
    shutdown.cancel();
}

#[tokio::test]
async fn generate_without_api_key_is_a_configuration_error() {
    let provider = ScriptedProvider::unconfigured();
    let (address, shutdown) = start(app_state(&provider, ServerConfig::default())).await;

    let response = send(&address, post_json("/api/generate", r#"{"prompt": "Blog"}"#)).await;

    assert_eq!(response.status, 500);
    let json = response.json();
    assert_eq!(json["error"], "Configuration error");
    assert!(json.get("details").is_none());
    assert_eq!(provider.calls(), 0);
    shutdown.cancel();
}

#[tokio::test]
async fn generate_timeout_hides_details_in_production() {
    let provider = ScriptedProvider::new(vec![
        Reply::text("{}").delayed(Duration::from_secs(2))
    ]);
    let config = ServerConfig {
        environment: Environment::Production,
        ..ServerConfig::default()
    };
    let (address, shutdown) = start(app_state(&provider, config)).await;

    let response = send(&address, post_json("/api/generate", r#"{"prompt": "Slow"}"#)).await;

    assert_eq!(response.status, 504);
    let json = response.json();
    assert_eq!(json["error"], "Request timeout");
    assert!(json.get("details").is_none());
    shutdown.cancel();
}

#[tokio::test]
async fn outer_deadline_cuts_off_slow_requests() {
    let provider = ScriptedProvider::new(vec![
        Reply::text("{}").delayed(Duration::from_secs(5))
    ]);
    let mut config = ServerConfig::default();
    config.generation.request_deadline_secs = 1;
    let policy = RetryPolicy {
        initial: AttemptBudget {
            max_tokens: 6000,
            timeout: Duration::from_secs(10),
        },
        ..RetryPolicy::default()
    };
    let (address, shutdown) = start(app_state_with_policy(&provider, config, policy)).await;

    let response = send(&address, post_json("/api/generate", r#"{"prompt": "Slow"}"#)).await;

    assert_eq!(response.status, 504);
    assert_eq!(response.json()["error"], "Request timeout");
    shutdown.cancel();
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let provider = ScriptedProvider::new(Vec::new());
    let (address, shutdown) = start(app_state(&provider, ServerConfig::default())).await;

    let raw = format!(
        "POST /api/generate HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n",
        2 * 1024 * 1024
    );
    let response = send(&address, raw).await;

    assert_eq!(response.status, 413);
    shutdown.cancel();
}
