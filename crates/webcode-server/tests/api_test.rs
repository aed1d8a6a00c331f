use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use webcode_infrastructure::{AppConfig, SqliteDatabase};
use webcode_server::{AppState, bootstrap, router};

struct TestApp {
    state: AppState,
    _workspaces: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let workspaces = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.workspace_root = workspaces.path().to_path_buf();
        let db = SqliteDatabase::open_in_memory().unwrap();
        Self {
            state: bootstrap::build_state(db, &config).unwrap(),
            _workspaces: workspaces,
        }
    }

    fn router(&self) -> Router {
        router(self.state.clone())
    }

    async fn send(&self, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-webcode-user", user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_session_crud_and_output_cleanup() {
    let app = TestApp::new();
    let session = json!({
        "sessionId": "s1",
        "messages": [{"role": "user", "content": "Fix the bug please"}]
    });

    let (status, body) = app.send("PUT", "/api/session/s1", None, Some(session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Fix the bug please");

    let output = json!({"rawOutput": "building...", "displayedEventCount": 5});
    let (status, _) = app.send("PUT", "/api/session/s1/output", None, Some(output)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", "/api/session/s1/output", None, None).await;
    assert_eq!(body["data"]["rawOutput"], "building...");

    let (status, body) = app.send("GET", "/api/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.send("DELETE", "/api/session/s1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("DELETE", "/api/session/s1", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", "/api/session/s1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    let (_, body) = app.send("GET", "/api/session/s1/output", None, None).await;
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_owner_header_isolates_data() {
    let app = TestApp::new();
    let session = json!({"sessionId": "private"});
    app.send("PUT", "/api/session/private", Some("alice"), Some(session))
        .await;

    let (status, _) = app.send("GET", "/api/session/private", Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.send("GET", "/api/session", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (status, _) = app.send("GET", "/api/session/private", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blank_session_id_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app
        .send("POST", "/api/session", None, Some(json!({"title": "x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_templates_defaults_and_render() {
    let app = TestApp::new();

    let (_, body) = app.send("POST", "/api/template/init-defaults", None, None).await;
    assert_eq!(body["data"]["insertedCount"], 6);
    let (_, body) = app.send("POST", "/api/template/init-defaults", None, None).await;
    assert_eq!(body["data"]["insertedCount"], 0);

    let template = json!({
        "id": "greet",
        "title": "Greet",
        "content": "Hello {{ name }}",
        "category": "custom",
        "isFavorite": true
    });
    let (status, _) = app.send("POST", "/api/template", None, Some(template)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send("POST", "/api/template/greet/render", None, Some(json!({"variables": {"name": "Ada"}})))
        .await;
    assert_eq!(body["data"]["content"], "Hello Ada");

    let (_, body) = app.send("GET", "/api/template/favorites", None, None).await;
    assert_eq!(body["data"][0]["id"], "greet");
    let (_, body) = app.send("GET", "/api/template/category/custom", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.send("DELETE", "/api/template/greet", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("DELETE", "/api/template/greet", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings_history_and_quick_actions() {
    let app = TestApp::new();

    app.send("PUT", "/api/setting/theme", None, Some(json!({"value": "dark"})))
        .await;
    let (_, body) = app.send("GET", "/api/setting/theme", None, None).await;
    assert_eq!(body["data"], "dark");
    let (status, _) = app.send("GET", "/api/setting/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send("POST", "/api/setting/input-history", None, Some(json!({"text": "  cargo build "})))
        .await;
    assert_eq!(body["data"], true);
    let (_, body) = app
        .send("GET", "/api/setting/input-history/search?q=build", None, None)
        .await;
    assert_eq!(body["data"][0]["text"], "cargo build");

    let actions = json!([
        {"id": "b", "title": "B", "content": "second", "order": 2},
        {"id": "a", "title": "A", "content": "first", "order": 1}
    ]);
    let (_, body) = app.send("PUT", "/api/setting/quick-actions", None, Some(actions)).await;
    assert_eq!(body["data"], 2);
    let (_, body) = app.send("GET", "/api/setting/quick-actions", None, None).await;
    assert_eq!(body["data"][0]["id"], "a");

    let (_, body) = app.send("DELETE", "/api/setting/quick-actions", None, None).await;
    assert_eq!(body["data"], 2);
}

#[tokio::test]
async fn test_migration_skips_existing_and_reports_status() {
    let app = TestApp::new();
    let sessions = json!([{"sessionId": "legacy-1", "messages": [{"content": "hi"}]}]);

    let (_, body) = app
        .send("POST", "/api/migration/sessions", None, Some(sessions.clone()))
        .await;
    assert_eq!(body["migratedCount"], 1);
    let (_, body) = app
        .send("POST", "/api/migration/sessions", None, Some(sessions))
        .await;
    assert_eq!(body["migratedCount"], 0);
    assert_eq!(body["skippedCount"], 1);

    let (_, body) = app.send("GET", "/api/migration/status", Some("default"), None).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["username"], "default");
    assert_eq!(body["counts"]["sessions"], 1);
}

#[tokio::test]
async fn test_migrated_sessions_are_listed_right_away() {
    let app = TestApp::new();
    let (_, body) = app.send("GET", "/api/session", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let sessions = json!([{"sessionId": "legacy-1", "title": "Old chat", "messages": [{"content": "hi"}]}]);
    let (_, body) = app
        .send("POST", "/api/migration/sessions", None, Some(sessions))
        .await;
    assert_eq!(body["migratedCount"], 1);

    let (_, body) = app.send("GET", "/api/session", None, None).await;
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["sessionId"], "legacy-1");
}

#[tokio::test]
async fn test_project_create_hides_secrets() {
    let app = TestApp::new();
    let input = json!({
        "name": "demo",
        "gitUrl": "https://example.com/demo.git",
        "authType": "https",
        "httpsToken": "super-secret"
    });

    let (status, body) = app.send("POST", "/api/project", None, Some(input.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hasCredentials"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert!(!body.to_string().contains("super-secret"));

    let (status, _) = app.send("POST", "/api/project", None, Some(input)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app.send("DELETE", &format!("/api/project/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &format!("/api/project/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_system_initialization_moves_workspace_root() {
    let app = TestApp::new();
    let (_, body) = app.send("GET", "/api/system/status", None, None).await;
    assert_eq!(body["data"]["isInitialized"], false);

    let (status, _) = app
        .send("PUT", "/api/system/workspace-root", None, Some(json!({"path": "relative"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let root = TempDir::new().unwrap();
    let chosen = root.path().join("clones");
    let (status, body) = app
        .send(
            "POST",
            "/api/system/initialize",
            None,
            Some(json!({"workspaceRoot": chosen.to_string_lossy()})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isInitialized"], true);
    assert_eq!(body["data"]["workspaceRootSource"], "database");
    assert!(chosen.is_dir());

    let input = json!({"name": "demo", "gitUrl": "https://example.com/demo.git"});
    let (_, body) = app.send("POST", "/api/project", Some("alice"), Some(input)).await;
    let local_path = body["data"]["localPath"].as_str().unwrap();
    assert!(std::path::Path::new(local_path).starts_with(chosen.join("alice")));
}

#[tokio::test]
async fn test_option_like_diff_revision_is_rejected() {
    let app = TestApp::new();
    let input = json!({"name": "demo", "gitUrl": "https://example.com/demo.git"});
    let (_, body) = app.send("POST", "/api/project", None, Some(input)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/project/{id}/diff?file=notes.txt&from=--output=/tmp/leak&to=HEAD");
    let (status, _) = app.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let hostile = json!({"name": "evil", "gitUrl": "--upload-pack=touch /tmp/x"});
    let (status, _) = app.send("POST", "/api/project", None, Some(hostile)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
