use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = engine::Engine::builder().database(db.clone()).build();
    server::app(std::sync::Arc::new(engine), db)
}

fn basic_auth(user: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:password"));
    format!("Basic {encoded}")
}

async fn send(
    app: &Router,
    user: &str,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(user));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_category(app: &Router, user: &str, name: &str, kind: &str) -> String {
    let (status, body) = send(
        app,
        user,
        "POST",
        "/categories",
        Some(json!({ "name": name, "kind": kind })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let app = test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/transactions")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/transactions")
        .header(header::AUTHORIZATION, "Basic bm9ib2R5Ondyb25n")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transaction_crud_round_trip() {
    let app = test_app().await;
    let category_id = create_category(&app, "alice", "Groceries", "expense").await;

    let (status, created) = send(
        &app,
        "alice",
        "POST",
        "/transactions",
        Some(json!({
            "amount_minor": 12_50,
            "description": "lunch",
            "date": "2024-01-10T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["amount_minor"], 12_50);
    assert_eq!(created["is_recurring"], false);
    let id = created["id"].as_str().unwrap();

    let (status, listed) = send(&app, "alice", "GET", "/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        "alice",
        "PUT",
        &format!("/transactions/{id}"),
        Some(json!({
            "amount_minor": 15_00,
            "description": "lunch and coffee",
            "date": "2024-01-10T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount_minor"], 15_00);

    let (status, _) = send(&app, "alice", "DELETE", &format!("/transactions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = send(&app, "alice", "GET", "/transactions", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn non_positive_amount_is_unprocessable() {
    let app = test_app().await;
    let category_id = create_category(&app, "alice", "Groceries", "expense").await;

    let (status, body) = send(
        &app,
        "alice",
        "POST",
        "/transactions",
        Some(json!({
            "amount_minor": 0,
            "description": "nothing",
            "date": "2024-01-10T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("amount"));
}

#[tokio::test]
async fn users_cannot_see_each_others_resources() {
    let app = test_app().await;
    let category_id = create_category(&app, "alice", "Groceries", "expense").await;

    let (_, created) = send(
        &app,
        "alice",
        "POST",
        "/transactions",
        Some(json!({
            "amount_minor": 12_50,
            "description": "lunch",
            "date": "2024-01-10T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, "bob", "GET", &format!("/transactions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, "bob", "GET", "/transactions", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn budget_tracks_spend_and_notifies_over_http() {
    let app = test_app().await;
    let category_id = create_category(&app, "alice", "Groceries", "expense").await;

    let (status, budget) = send(
        &app,
        "alice",
        "POST",
        "/budgets",
        Some(json!({
            "name": "January food",
            "amount_minor": 1_000_00,
            "period": "monthly",
            "start_date": "2024-01-01T00:00:00Z",
            "end_date": "2024-01-31T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_id = budget["id"].as_str().unwrap().to_string();

    send(
        &app,
        "alice",
        "POST",
        "/transactions",
        Some(json!({
            "amount_minor": 850_00,
            "description": "monthly shop",
            "date": "2024-01-10T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;

    let (status, budget) = send(&app, "alice", "GET", &format!("/budgets/{budget_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(budget["spent_minor"], 850_00);

    let (status, notifications) =
        send(&app, "alice", "GET", "/notifications?unread=true", None).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = notifications.as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "budget");
    assert_eq!(notifications[0]["severity"], "normal");

    let id = notifications[0]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "alice",
        "POST",
        &format!("/notifications/{id}/read"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, unread) = send(&app, "alice", "GET", "/notifications?unread=true", None).await;
    assert!(unread.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn manual_trigger_materializes_due_rules() {
    let app = test_app().await;
    let category_id = create_category(&app, "alice", "Subscriptions", "expense").await;

    let (status, rule) = send(
        &app,
        "alice",
        "POST",
        "/recurring-rules",
        Some(json!({
            "amount_minor": 9_99,
            "description": "music streaming",
            "category_id": category_id,
            "frequency": "monthly",
            "start_date": "2024-01-01T00:00:00Z",
            "end_date": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let rule_id = rule["id"].as_str().unwrap().to_string();

    let (status, processed) =
        send(&app, "alice", "POST", "/recurring-rules/process", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(processed["processed_count"], 1);

    let (_, listed) = send(&app, "alice", "GET", "/transactions", None).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["is_recurring"], true);
    assert_eq!(listed[0]["recurring_rule_id"].as_str().unwrap(), rule_id);
    assert_eq!(listed[0]["date"], "2024-01-01T00:00:00Z");

    let (_, rule) = send(
        &app,
        "alice",
        "GET",
        &format!("/recurring-rules/{rule_id}"),
        None,
    )
    .await;
    assert_ne!(rule["next_execute_date"], "2024-01-01T00:00:00Z");

    let (status, toggled) = send(
        &app,
        "alice",
        "POST",
        &format!("/recurring-rules/{rule_id}/toggle"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);
}

#[tokio::test]
async fn manual_trigger_alerts_every_user() {
    let app = test_app().await;
    let category_id = create_category(&app, "bob", "Rent", "expense").await;

    let (status, _) = send(
        &app,
        "bob",
        "POST",
        "/budgets",
        Some(json!({
            "name": "January rent",
            "amount_minor": 100_000,
            "period": "monthly",
            "start_date": "2024-01-01T00:00:00Z",
            "end_date": "2024-01-31T00:00:00Z",
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "bob",
        "POST",
        "/recurring-rules",
        Some(json!({
            "amount_minor": 90_000,
            "description": "monthly rent",
            "category_id": category_id,
            "frequency": "monthly",
            "start_date": "2024-01-10T00:00:00Z",
            "end_date": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Alice pulls the trigger, but the materialized rent pushes Bob's budget
    // over a threshold; Bob still gets the alert.
    let (status, processed) = send(&app, "alice", "POST", "/recurring-rules/process", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(processed["processed_count"], 1);

    let (_, notifications) = send(&app, "bob", "GET", "/notifications", None).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let app = test_app().await;
    create_category(&app, "alice", "Groceries", "expense").await;

    let (status, _) = send(
        &app,
        "alice",
        "POST",
        "/categories",
        Some(json!({ "name": "Groceries", "kind": "expense" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
