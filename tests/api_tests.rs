use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use pressroom::config::Config;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ROOT_EMAIL: &str = "root@admin.com";
const ROOT_PASSWORD: &str = "root123456";

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> Router {
    let shared = Arc::new(
        pressroom::state::SharedState::new(test_config())
            .await
            .expect("Failed to create shared state"),
    );
    pressroom::services::bootstrap::initialize(&shared.permission_service).await;

    pressroom::api::router(pressroom::api::create_app_state(shared))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    dispatch(app, request).await
}

/// Posts a body verbatim as `application/json`, valid or not.
async fn send_raw(app: &Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();

    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Registers a user and, when `permission` is given, has root grant it.
/// Returns `(user_id, token)`.
async fn member(app: &Router, email: &str, permission: Option<&str>) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Member", "email": email, "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    let user_id = body["data"]["user"]["id"].as_i64().unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    if let Some(permission) = permission {
        let root = login(app, ROOT_EMAIL, ROOT_PASSWORD).await;
        let (status, _) = send(
            app,
            "POST",
            &format!("/api/users/{user_id}/permissions"),
            Some(&root),
            Some(json!({ "permission": permission })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    (user_id, token)
}

async fn create_article(app: &Router, token: &str, title: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/articles",
        Some(token),
        Some(json!({ "title": title, "content": "Some long enough content" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "João", "email": "joao@x.com", "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "joao@x.com");
    assert!(body["data"]["user"].get("password_hash").is_none());
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));

    let token = login(&app, "joao@x.com", "123456").await;

    let (status, body) = send(&app, "GET", "/api/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "joao@x.com");
    assert_eq!(body["data"]["name"], "João");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app().await;
    member(&app, "dup@x.com", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "dup@x.com", "password": "abcdef" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Email already in use");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    member(&app, "a@x.com", None).await;

    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong-password" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@x.com", "password": "123456" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_request_validation() {
    let app = spawn_app().await;

    for payload in [
        json!({ "name": "A", "email": "a@x.com", "password": "12345" }),
        json!({ "name": "A", "email": "not-an-email", "password": "123456" }),
        json!({ "name": "", "email": "a@x.com", "password": "123456" }),
        json!({ "email": "a@x.com", "password": "123456" }),
    ] {
        let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    let (_, editor) = member(&app, "editor@x.com", Some("editor")).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/articles",
        Some(&editor),
        Some(json!({ "title": "T", "content": "too short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_routes_require_a_valid_token() {
    let app = spawn_app().await;

    let (status, _) = send(&app, "GET", "/api/auth/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/articles/my-articles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/api/auth/profile", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    // A bad token is rejected even on public routes.
    let (status, _) = send(&app, "GET", "/api/articles", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_article_reads() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/articles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = send(&app, "GET", "/api/articles/999", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_some_and(Value::is_null));

    let (_, editor) = member(&app, "editor@x.com", Some("editor")).await;
    let first = create_article(&app, &editor, "First").await;
    let second = create_article(&app, &editor, "Second").await;

    let (_, body) = send(&app, "GET", "/api/articles", None, None).await;
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(body["data"][0]["author"]["email"], "editor@x.com");

    let (_, body) = send(&app, "GET", &format!("/api/articles/{first}"), None, None).await;
    assert_eq!(body["data"]["title"], "First");
}

#[tokio::test]
async fn test_permission_requirements_on_articles() {
    let app = spawn_app().await;
    let (_, nobody) = member(&app, "nobody@x.com", None).await;
    let (_, reader) = member(&app, "reader@x.com", Some("reader")).await;

    let payload = json!({ "title": "Title", "content": "Some long enough content" });

    let (status, body) = send(&app, "POST", "/api/articles", Some(&reader), Some(payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Access denied. Required permissions: admin, editor"
    );

    let (status, _) = send(&app, "GET", "/api/articles/my-articles", Some(&nobody), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&app, "GET", "/api/articles/my-articles", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_article_ownership_and_admin_bypass() {
    let app = spawn_app().await;
    let (_, alice) = member(&app, "alice@x.com", Some("editor")).await;
    let (_, bob) = member(&app, "bob@x.com", Some("editor")).await;
    let root = login(&app, ROOT_EMAIL, ROOT_PASSWORD).await;

    let article = create_article(&app, &alice, "Alice's").await;
    let uri = format!("/api/articles/{article}");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&bob),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only edit your own articles");

    let (status, body) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only delete your own articles");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&root),
        Some(json!({ "title": "Moderated" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Moderated");
    assert_eq!(body["data"]["author"]["email"], "alice@x.com");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&alice),
        Some(json!({ "content": "Rewritten by the author" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Moderated");
    assert_eq!(body["data"]["content"], "Rewritten by the author");

    let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Article not found");

    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&alice),
        Some(json!({ "title": "Gone" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_articles_lists_only_own() {
    let app = spawn_app().await;
    let (_, alice) = member(&app, "alice@x.com", Some("editor")).await;
    let (_, bob) = member(&app, "bob@x.com", Some("editor")).await;

    let mine = create_article(&app, &alice, "Mine").await;
    create_article(&app, &bob, "Theirs").await;

    let (status, body) = send(&app, "GET", "/api/articles/my-articles", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let articles = body["data"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["id"].as_i64(), Some(mine));
}

#[tokio::test]
async fn test_user_routes_are_admin_only() {
    let app = spawn_app().await;
    let (_, editor) = member(&app, "editor@x.com", Some("editor")).await;
    let root = login(&app, ROOT_EMAIL, ROOT_PASSWORD).await;

    let (status, body) = send(&app, "GET", "/api/users", Some(&editor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied. Required permissions: admin");

    let (status, body) = send(&app, "GET", "/api/users", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "GET", "/api/permissions", Some(&editor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/permissions", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "editor", "reader"]);
}

#[tokio::test]
async fn test_my_permissions_overrides_group_requirement() {
    let app = spawn_app().await;
    let (_, reader) = member(&app, "reader@x.com", Some("reader")).await;
    let (_, nobody) = member(&app, "nobody@x.com", None).await;

    let (status, body) = send(&app, "GET", "/api/users/me/permissions", Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["permissions"], json!(["reader"]));

    let (status, _) = send(&app, "GET", "/api/users/me/permissions", Some(&nobody), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let root = login(&app, ROOT_EMAIL, ROOT_PASSWORD).await;
    let (_, body) = send(&app, "GET", "/api/users/me/permissions", Some(&root), None).await;
    assert_eq!(body["data"]["permissions"], json!(["admin", "editor", "reader"]));
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = spawn_app().await;
    let root = login(&app, ROOT_EMAIL, ROOT_PASSWORD).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(&root),
        Some(json!({ "name": "Staff", "email": "staff@x.com", "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/users/{id}");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&root),
        Some(json!({ "name": "Renamed", "password": "new-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");

    login(&app, "staff@x.com", "new-secret").await;

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&root),
        Some(json!({ "email": ROOT_EMAIL })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already in use");

    let (status, body) = send(
        &app,
        "POST",
        &format!("{uri}/permissions"),
        Some(&root),
        Some(json!({ "permission": "superuser" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (status, _) = send(&app, "GET", "/api/users/999", Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/users/999", Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_a_user_cascades_and_revokes_their_token() {
    let app = spawn_app().await;
    let (alice_id, alice) = member(&app, "alice@x.com", Some("editor")).await;
    let root = login(&app, ROOT_EMAIL, ROOT_PASSWORD).await;

    let article = create_article(&app, &alice, "Doomed").await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{alice_id}"),
        Some(&root),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", &format!("/api/articles/{article}"), None, None).await;
    assert!(body["data"].is_null());

    let (status, body) = send(&app, "GET", "/api/auth/profile", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_unparseable_path_id_uses_error_envelope() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/articles/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let root = login(&app, ROOT_EMAIL, ROOT_PASSWORD).await;
    let (status, body) = send(&app, "GET", "/api/users/abc", Some(&root), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = spawn_app().await;

    let (status, body) = send_raw(&app, "/api/auth/login", "{\"email\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = send_raw(&app, "/api/auth/register", r#"{"name": 1}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}
