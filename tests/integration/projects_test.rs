//! Project API Integration Tests
//!
//! Exercises the project routes through the request dispatcher with an
//! in-memory SQLite store:
//! - Save, update, list and delete
//! - Version history, restore and diff
//! - Per-user isolation and authentication
//! - Zip export

use std::io::{Cursor, Read};

use serde_json::{json, Value};

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use cmdshift_backend::models::settings::ServerConfig;
use cmdshift_backend::server::{dispatch, HttpRequest, HttpResponse};
use cmdshift_backend::services::generation::GenerationOrchestrator;
use cmdshift_backend::services::identity::DisabledIdentity;
use cmdshift_backend::services::projects::SqliteProjectStore;
use cmdshift_backend::AppState;

use crate::support::{app_state, bearer, fast_policy, ScriptedProvider};

fn state() -> std::sync::Arc<AppState> {
    app_state(&ScriptedProvider::new(Vec::new()), ServerConfig::default())
}

fn request(method: &str, path: &str, user: Option<&str>, body: Option<Value>) -> HttpRequest {
    let mut req = HttpRequest::new(method, path);
    if let Some(user) = user {
        req = req.with_header("Authorization", &bearer(user));
    }
    if let Some(body) = body {
        req = req
            .with_header("Content-Type", "application/json")
            .with_body(serde_json::to_vec(&body).unwrap());
    }
    req
}

fn body(response: &HttpResponse) -> Value {
    serde_json::from_slice(&response.body).unwrap()
}

async fn create_project(state: &AppState, user: &str) -> String {
    let response = dispatch(
        state,
        &request(
            "POST",
            "/api/projects",
            Some(user),
            Some(json!({
                "prompt": "A recipe site with a search bar and favorites",
                "files": {"index.html": "<h1>\nRecipes\n</h1>\n", "style.css": "h1 {}\n"}
            })),
        ),
    )
    .await;
    assert_eq!(response.status, 201);
    body(&response)["project"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn project_routes_require_identity() {
    let state = state();

    let response = dispatch(&state, &request("GET", "/api/projects", None, None)).await;
    assert_eq!(response.status, 401);
    assert_eq!(body(&response)["error"], "Unauthorized");

    let response = dispatch(
        &state,
        &request("GET", "/api/projects", None, None).with_header("Authorization", "Basic abc"),
    )
    .await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn unsigned_or_bare_tokens_are_rejected() {
    let state = state();
    create_project(&state, "victim").await;

    let unsigned = format!(
        "Bearer {}.{}.not-a-real-signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(r#"{"sub":"victim"}"#)
    );
    for header in [unsigned.as_str(), "Bearer victim"] {
        let response = dispatch(
            &state,
            &HttpRequest::new("GET", "/api/projects").with_header("Authorization", header),
        )
        .await;
        assert_eq!(response.status, 401);
    }
}

#[tokio::test]
async fn project_routes_closed_without_token_secret() {
    let provider = ScriptedProvider::new(Vec::new());
    let state = AppState::new(
        ServerConfig::default(),
        GenerationOrchestrator::new(provider, fast_policy()),
        Arc::new(SqliteProjectStore::in_memory().unwrap()),
        Arc::new(DisabledIdentity),
    );

    let response = dispatch(&state, &request("GET", "/api/projects", Some("alice"), None)).await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn save_and_list_projects() {
    let state = state();
    let id = create_project(&state, "alice").await;

    let response = dispatch(&state, &request("GET", "/api/projects", Some("alice"), None)).await;
    assert_eq!(response.status, 200);
    let json = body(&response);
    let projects = json["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["id"], id.as_str());
    assert_eq!(projects[0]["name"], "A recipe site with a search ba...");
    assert_eq!(projects[0]["project_type"], "multi-file");
    assert_eq!(projects[0]["current_version"], 1);

    let response = dispatch(&state, &request("GET", "/api/projects", Some("bob"), None)).await;
    assert_eq!(body(&response)["projects"], json!([]));
}

#[tokio::test]
async fn save_rejects_ambiguous_snapshot() {
    let state = state();
    let response = dispatch(
        &state,
        &request(
            "POST",
            "/api/projects",
            Some("alice"),
            Some(json!({"prompt": "x", "files": {"a.html": "1"}, "code": "y"})),
        ),
    )
    .await;
    assert_eq!(response.status, 400);

    let response = dispatch(
        &state,
        &request("POST", "/api/projects", Some("alice"), Some(json!({"prompt": "x"}))),
    )
    .await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn version_history_restore_and_diff() {
    let state = state();
    let id = create_project(&state, "alice").await;

    let response = dispatch(
        &state,
        &request(
            "PUT",
            &format!("/api/projects/{}", id),
            Some("alice"),
            Some(json!({
                "files": {"index.html": "<h1>\nCookbook\n</h1>\n", "app.js": "init()\n"},
                "note": "rename"
            })),
        ),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["version"]["version_number"], 2);

    let response = dispatch(
        &state,
        &request("GET", &format!("/api/projects/{}/versions", id), Some("alice"), None),
    )
    .await;
    let json = body(&response);
    assert_eq!(json["currentVersion"], 2);
    assert_eq!(json["versions"].as_array().unwrap().len(), 2);
    assert_eq!(json["versions"][1]["note"], "rename");

    let response = dispatch(
        &state,
        &request("GET", &format!("/api/projects/{}/diff/1/2", id), Some("alice"), None),
    )
    .await;
    let json = body(&response);
    let statuses: Vec<(String, String)> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["path"].as_str().unwrap().to_string(),
                f["status"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("app.js".to_string(), "added".to_string()),
            ("index.html".to_string(), "modified".to_string()),
            ("style.css".to_string(), "removed".to_string()),
        ]
    );
    assert!(json["files"][1]["unified"]
        .as_str()
        .unwrap()
        .contains("-Recipes\n+Cookbook\n"));

    let response = dispatch(
        &state,
        &request("POST", &format!("/api/projects/{}/restore/1", id), Some("alice"), None),
    )
    .await;
    assert_eq!(response.status, 200);
    let json = body(&response);
    assert_eq!(json["version"]["version_number"], 3);
    assert_eq!(json["restoredCode"]["index.html"], "<h1>\nRecipes\n</h1>\n");

    let response = dispatch(
        &state,
        &request("GET", &format!("/api/projects/{}/versions/3", id), Some("alice"), None),
    )
    .await;
    assert_eq!(body(&response)["version"]["code_snapshot"]["style.css"], "h1 {}\n");
}

#[tokio::test]
async fn versions_are_scoped_to_the_owner() {
    let state = state();
    let id = create_project(&state, "alice").await;

    for (method, path) in [
        ("GET", format!("/api/projects/{}/versions", id)),
        ("GET", format!("/api/projects/{}/versions/1", id)),
        ("POST", format!("/api/projects/{}/restore/1", id)),
        ("DELETE", format!("/api/projects/{}", id)),
    ] {
        let response = dispatch(&state, &request(method, &path, Some("mallory"), None)).await;
        assert_eq!(response.status, 404, "{method} {path}");
    }

    let response = dispatch(
        &state,
        &request("GET", &format!("/api/projects/{}/versions/zero", id), Some("alice"), None),
    )
    .await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn delete_project() {
    let state = state();
    let id = create_project(&state, "alice").await;

    let response = dispatch(
        &state,
        &request("DELETE", &format!("/api/projects/{}", id), Some("alice"), None),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response), json!({"success": true}));

    let response = dispatch(
        &state,
        &request("DELETE", &format!("/api/projects/{}", id), Some("alice"), None),
    )
    .await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn export_returns_zip_attachment() {
    let state = state();
    let response = dispatch(
        &state,
        &request(
            "POST",
            "/api/export",
            None,
            Some(json!({
                "name": "Recipe Site",
                "files": {"index.html": "<p>hi</p>", "js/app.js": "init()"}
            })),
        ),
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("application/zip"));
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=\"Recipe-Site.zip\"")
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(response.body.clone())).unwrap();
    let mut content = String::new();
    archive
        .by_name("js/app.js")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "init()");
}

#[tokio::test]
async fn export_rejects_path_traversal() {
    let state = state();
    let response = dispatch(
        &state,
        &request(
            "POST",
            "/api/export",
            None,
            Some(json!({"files": {"../../etc/passwd": "x"}})),
        ),
    )
    .await;
    assert_eq!(response.status, 400);
}
