use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use habitrack::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = habitrack::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    habitrack::api::router(state).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));
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

/// Registers a user and returns their token.
async fn user(app: &Router, name: &str) -> String {
    let email = format!("{name}@example.com");
    let register = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({"email": email, "password": "secret123", "tg_username": name}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(register).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let login = Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({"email": email, "password": "secret123"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(login).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

fn habit(action: &str) -> Value {
    json!({
        "place": "Park",
        "time": "07:30",
        "action": action,
        "is_pleasant": false,
        "period": 1,
        "length": 60,
        "is_public": false,
    })
}

fn pleasant(action: &str) -> Value {
    let mut body = habit(action);
    body["is_pleasant"] = json!(true);
    body
}

async fn create(app: &Router, token: &str, body: Value) -> Value {
    let (status, response) = send(app, "POST", "/api/habits", token, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    response["data"].clone()
}

async fn rejected(app: &Router, token: &str, body: Value) -> String {
    let (status, response) = send(app, "POST", "/api/habits", token, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{response}");
    assert_eq!(response["success"], false);
    response["error"].as_str().unwrap().to_string()
}

async fn own_count(app: &Router, token: &str) -> u64 {
    let (status, body) = send(app, "GET", "/api/habits", token, None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["count"].as_u64().unwrap()
}

#[tokio::test]
async fn test_create_habit_forces_owner() {
    let app = spawn_app().await;
    let token = user(&app, "ann").await;

    let mut body = habit("Run");
    body["owner"] = json!(999);
    body["reward"] = json!("Smoothie");
    let created = create(&app, &token, body).await;

    assert_eq!(created["owner"], 1);
    assert_eq!(created["time"], "07:30:00");
    assert_eq!(created["reward"], "Smoothie");
    assert_eq!(created["linked"], Value::Null);
    assert_eq!(created["last_dispatch_time"], Value::Null);
}

#[tokio::test]
async fn test_reward_and_linked_rejected() {
    let app = spawn_app().await;
    let token = user(&app, "bob").await;
    let bath = create(&app, &token, pleasant("Hot bath")).await;

    let mut body = habit("Run");
    body["linked"] = bath["id"].clone();
    body["reward"] = json!("X");
    let error = rejected(&app, &token, body).await;

    assert_eq!(error, "cannot choose a linked habit and a reward at the same time.");
    assert_eq!(own_count(&app, &token).await, 1);
}

#[tokio::test]
async fn test_length_over_limit_rejected() {
    let app = spawn_app().await;
    let token = user(&app, "cat").await;

    let mut body = habit("Plank");
    body["length"] = json!(150);
    let error = rejected(&app, &token, body).await;

    assert_eq!(error, "execution time must not exceed 120 seconds.");

    let mut body = habit("Plank");
    body["length"] = json!(120);
    create(&app, &token, body).await;
}

#[tokio::test]
async fn test_linked_must_be_pleasant() {
    let app = spawn_app().await;
    let token = user(&app, "dan").await;
    let chores = create(&app, &token, habit("Dishes")).await;

    let mut body = habit("Run");
    body["linked"] = chores["id"].clone();
    let error = rejected(&app, &token, body).await;

    assert_eq!(error, "only a pleasant habit may be selected as a linked habit.");
}

#[tokio::test]
async fn test_pleasant_habit_exclusivity() {
    let app = spawn_app().await;
    let token = user(&app, "eve").await;

    let mut body = pleasant("Massage");
    body["reward"] = json!("X");
    let error = rejected(&app, &token, body).await;
    assert_eq!(error, "a pleasant habit may not have a reward or a linked habit.");

    let bath = create(&app, &token, pleasant("Hot bath")).await;
    let mut body = pleasant("Massage");
    body["linked"] = bath["id"].clone();
    let error = rejected(&app, &token, body).await;
    assert_eq!(error, "a pleasant habit may not have a reward or a linked habit.");
}

#[tokio::test]
async fn test_period_bounds() {
    let app = spawn_app().await;
    let token = user(&app, "fay").await;

    let mut body = habit("Stretch");
    body["period"] = json!(8);
    let error = rejected(&app, &token, body).await;
    assert_eq!(error, "cannot perform a habit less often than once every 7 days");

    let mut body = habit("Stretch");
    body["period"] = json!(0);
    let error = rejected(&app, &token, body).await;
    assert_eq!(error, "frequency cannot be less than 1");

    let mut body = habit("Stretch");
    body["period"] = json!(7);
    create(&app, &token, body).await;
    assert_eq!(own_count(&app, &token).await, 1);
}

#[tokio::test]
async fn test_field_checks() {
    let app = spawn_app().await;
    let token = user(&app, "gus").await;

    let mut body = habit("Run");
    body["length"] = json!(-5);
    assert_eq!(
        rejected(&app, &token, body).await,
        "execution time cannot be negative"
    );

    let mut body = habit("Run");
    body["linked"] = json!(4242);
    assert_eq!(
        rejected(&app, &token, body).await,
        "linked habit 4242 does not exist"
    );

    let mut body = habit("Run");
    body["place"] = json!("p".repeat(101));
    rejected(&app, &token, body).await;

    let mut body = habit("Run");
    body["action"] = json!("  ");
    rejected(&app, &token, body).await;

    assert_eq!(own_count(&app, &token).await, 0);
}

#[tokio::test]
async fn test_owner_only_access() {
    let app = spawn_app().await;
    let owner = user(&app, "hal").await;
    let other = user(&app, "ivy").await;

    let created = create(&app, &owner, habit("Read")).await;
    let uri = format!("/api/habits/{}", created["id"]);

    let (status, _) = send(&app, "GET", &uri, &other, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PATCH", &uri, &other, Some(json!({"period": 2}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PUT", &uri, &other, Some(habit("Stolen"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, &other, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A forbidden write with an invalid body still answers 403.
    let (status, _) = send(&app, "PATCH", &uri, &other, Some(json!({"period": 99}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", &uri, &owner, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "Read");
    assert_eq!(body["data"]["period"], 1);

    let (status, _) = send(&app, "GET", "/api/habits/999", &owner, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_partial_update_merges_with_stored_values() {
    let app = spawn_app().await;
    let token = user(&app, "jay").await;
    let bath = create(&app, &token, pleasant("Hot bath")).await;

    let mut body = habit("Run");
    body["reward"] = json!("Tea");
    let run = create(&app, &token, body).await;
    let uri = format!("/api/habits/{}", run["id"]);

    // Stored reward plus new linked habit.
    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        &token,
        Some(json!({"linked": bath["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "cannot choose a linked habit and a reward at the same time."
    );

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        &token,
        Some(json!({"linked": bath["id"], "reward": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["linked"], bath["id"]);
    assert_eq!(body["data"]["reward"], Value::Null);
    assert_eq!(body["data"]["action"], "Run");

    let bath_uri = format!("/api/habits/{}", bath["id"]);

    let (status, body) = send(
        &app,
        "PATCH",
        &bath_uri,
        &token,
        Some(json!({"is_pleasant": false, "linked": bath["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "a habit cannot be linked to itself");

    // Run still links to the bath, so it has to stay pleasant.
    let (status, body) = send(
        &app,
        "PATCH",
        &bath_uri,
        &token,
        Some(json!({"is_pleasant": false})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "a habit selected as a linked habit must stay pleasant"
    );
}

#[tokio::test]
async fn test_replace_requires_full_body() {
    let app = spawn_app().await;
    let token = user(&app, "kim").await;
    let created = create(&app, &token, habit("Walk")).await;
    let uri = format!("/api/habits/{}", created["id"]);

    let (status, _) = send(&app, "PUT", &uri, &token, Some(json!({"action": "Jog"}))).await;
    assert!(status.is_client_error());

    let mut body = habit("Jog");
    body["time"] = json!("18:45:00");
    body["is_public"] = json!(true);
    let (status, body) = send(&app, "PUT", &uri, &token, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "Jog");
    assert_eq!(body["data"]["time"], "18:45:00");
    assert_eq!(body["data"]["is_public"], true);
}

#[tokio::test]
async fn test_deleting_pleasant_habit_clears_links() {
    let app = spawn_app().await;
    let token = user(&app, "lea").await;
    let bath = create(&app, &token, pleasant("Hot bath")).await;

    let mut body = habit("Run");
    body["linked"] = bath["id"].clone();
    let run = create(&app, &token, body).await;
    assert_eq!(run["linked"], bath["id"]);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/habits/{}", bath["id"]),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/habits/{}", run["id"]),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["linked"], Value::Null);
}

#[tokio::test]
async fn test_pagination_of_own_habits() {
    let app = spawn_app().await;
    let token = user(&app, "max").await;
    let other = user(&app, "ned").await;
    create(&app, &other, habit("Not mine")).await;

    for i in 0..7 {
        create(&app, &token, habit(&format!("Habit {i}"))).await;
    }

    let (status, body) = send(&app, "GET", "/api/habits", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 7);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["page_size"], 5);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["results"][0]["action"], "Habit 0");

    let (_, body) = send(&app, "GET", "/api/habits?page=2", &token, None).await;
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["action"], "Habit 6");

    let (_, body) = send(&app, "GET", "/api/habits?page=1&page_size=10", &token, None).await;
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 7);

    let (status, _) = send(&app, "GET", "/api/habits?page_size=0", &token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/habits?page=0", &token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_public_list_and_user_cascade() {
    let app = spawn_app().await;
    let alice = user(&app, "olga").await;
    let bob = user(&app, "pete").await;

    let mut shared = habit("Shared run");
    shared["is_public"] = json!(true);
    let olga_public = create(&app, &alice, shared).await;
    create(&app, &alice, habit("Private")).await;

    let mut shared = habit("Shared swim");
    shared["is_public"] = json!(true);
    create(&app, &bob, shared).await;

    let (status, body) = send(&app, "GET", "/api/habits/public", &bob, None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["Shared run", "Shared swim"]);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", olga_public["owner"]),
        &alice,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/habits/public", &bob, None).await;
    let remaining = body["data"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["action"], "Shared swim");
}

#[tokio::test]
async fn test_cannot_link_to_another_users_habit() {
    let app = spawn_app().await;
    let ann = user(&app, "rita").await;
    let bob = user(&app, "sam").await;

    let bath = create(&app, &ann, pleasant("Hot bath")).await;
    let bath_uri = format!("/api/habits/{}", bath["id"]);

    let mut body = habit("Run");
    body["linked"] = bath["id"].clone();
    let error = rejected(&app, &bob, body.clone()).await;
    assert_eq!(error, format!("linked habit {} does not exist", bath["id"]));

    let mut public_bath = pleasant("Sauna");
    public_bath["is_public"] = json!(true);
    let sauna = create(&app, &ann, public_bath).await;
    body["linked"] = sauna["id"].clone();
    rejected(&app, &bob, body).await;

    let own = create(&app, &bob, habit("Walk")).await;
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/habits/{}", own["id"]),
        &bob,
        Some(json!({"linked": bath["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing links to the bath, so its owner may still change it.
    let (status, body) = send(
        &app,
        "PATCH",
        &bath_uri,
        &ann,
        Some(json!({"is_pleasant": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_pleasant"], false);
}
