use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use habitrack::api::AppState;
use habitrack::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = habitrack::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    (habitrack::api::router(state.clone()).await, state)
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
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, email: &str, tg_username: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "email": email,
            "password": "secret123",
            "tg_username": tg_username,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/token",
        None,
        Some(json!({"email": email, "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_auth_endpoints() {
    let (app, _) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/habits", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    register(&app, "ann@example.com", "ann").await;
    let token = login(&app, "ann@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ann@example.com");
    assert!(body["data"].get("api_key").is_none());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_obtain_token_rejects_bad_credentials() {
    let (app, _) = spawn_app().await;
    register(&app, "bob@example.com", "bob").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(json!({"email": "bob@example.com", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token",
        None,
        Some(json!({"email": "ghost@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_regenerate_token_invalidates_old_one() {
    let (app, _) = spawn_app().await;
    register(&app, "cat@example.com", "cat").await;
    let old = login(&app, "cat@example.com").await;

    let (status, body) = send(&app, "POST", "/api/auth/token/regenerate", Some(&old), None).await;
    assert_eq!(status, StatusCode::OK);
    let new = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(old, new);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&old), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&new), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _) = spawn_app().await;

    let user = register(&app, "dan@example.com", "@dan_tg").await;
    assert_eq!(user["tg_username"], "dan_tg");
    assert_eq!(user["tg_chat_id"], Value::Null);
    assert_eq!(user["is_staff"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({"email": "dan@example.com", "password": "secret123", "tg_username": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({"email": "not-an-email", "password": "secret123", "tg_username": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({"email": "eve@example.com", "password": "abc", "tg_username": "eve"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_access_is_limited_to_self() {
    let (app, state) = spawn_app().await;

    let fay = register(&app, "fay@example.com", "fay").await;
    let gus = register(&app, "gus@example.com", "gus").await;
    let fay_token = login(&app, "fay@example.com").await;

    let gus_uri = format!("/api/users/{}", gus["id"]);
    let fay_uri = format!("/api/users/{}", fay["id"]);

    let (status, _) = send(&app, "GET", &gus_uri, Some(&fay_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PATCH",
        &gus_uri,
        Some(&fay_token),
        Some(json!({"first_name": "Hacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &gus_uri, Some(&fay_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/users", Some(&fay_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PATCH",
        &fay_uri,
        Some(&fay_token),
        Some(json!({"first_name": "Fay", "tg_username": "@fay_new"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Fay");
    assert_eq!(body["data"]["tg_username"], "fay_new");
    assert_eq!(body["data"]["email"], "fay@example.com");

    let (status, _) = send(
        &app,
        "PATCH",
        &fay_uri,
        Some(&fay_token),
        Some(json!({"email": "gus@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Staff may read and list everyone.
    state
        .user_service()
        .create_staff("root@example.com", "secret123", "root")
        .await
        .unwrap();
    let staff_token = login(&app, "root@example.com").await;

    let (status, body) = send(&app, "GET", &gus_uri, Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "gus@example.com");

    let (status, body) = send(&app, "GET", "/api/users", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, _) = send(&app, "GET", "/api/users/999", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_self_revokes_access() {
    let (app, _) = spawn_app().await;
    let hal = register(&app, "hal@example.com", "hal").await;
    let token = login(&app, "hal@example.com").await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", hal["id"]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_only_system_routes() {
    let (app, state) = spawn_app().await;
    register(&app, "ivy@example.com", "ivy").await;
    let token = login(&app, "ivy@example.com").await;

    let (status, _) = send(&app, "POST", "/api/system/tasks/notify", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/metrics", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    state
        .user_service()
        .create_staff("ops@example.com", "secret123", "ops")
        .await
        .unwrap();
    let staff = login(&app, "ops@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .header("X-Api-Key", &staff)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_email_domain_is_case_insensitive() {
    let (app, _) = spawn_app().await;
    let user = register(&app, "Jo@Example.COM", "jo").await;
    assert_eq!(user["email"], "Jo@example.com");

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({"email": "Jo@example.com", "password": "secret123", "tg_username": "jo2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let token = login(&app, "Jo@EXAMPLE.com").await;
    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "Jo@example.com");
}

#[tokio::test]
async fn test_names_can_be_cleared() {
    let (app, _) = spawn_app().await;
    let kim = register(&app, "kim@example.com", "kim").await;
    let token = login(&app, "kim@example.com").await;
    let uri = format!("/api/users/{}", kim["id"]);

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({"first_name": " Kim ", "last_name": "Lee"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Kim");
    assert_eq!(body["data"]["last_name"], "Lee");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({"first_name": "   ", "last_name": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], Value::Null);
    assert_eq!(body["data"]["last_name"], Value::Null);

    let (_, body) = send(&app, "PATCH", &uri, Some(&token), Some(json!({"tg_username": "kim2"}))).await;
    assert_eq!(body["data"]["first_name"], Value::Null);
    assert_eq!(body["data"]["tg_username"], "kim2");
}
