//! API tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`. The pool
//! connects lazily and every request here is answered before a query runs:
//! - Missing or bad bearer tokens are rejected with 401
//! - Role checks run before any storage access (403)
//! - Malformed bodies are rejected with 400

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shared::{Actor, Role};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use trackit_backend::{
    config::{DatabaseConfig, InventoryConfig, JwtConfig, ServerConfig},
    create_app,
    middleware::issue_token,
    AppState, Config,
};
use uuid::Uuid;

const SECRET: &str = "api-test-secret";

fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/trackit_test".to_string(),
            max_connections: 1,
            min_connections: 0,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        inventory: InventoryConfig::default(),
    }
}

fn app() -> Router {
    let config = test_config();
    let db = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(&config.database.url)
        .unwrap();
    create_app(AppState {
        db,
        config: Arc::new(config),
    })
}

fn token(role: Role) -> String {
    issue_token(&Actor::new(Uuid::new_v4(), role), SECRET, 3600).unwrap()
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn booking_body(items: Value) -> Value {
    json!({
        "customer_name": "Rina Akter",
        "customer_phone": "01711000000",
        "customer_address": "House 4, Road 2, Dhaka",
        "payment_type": "cash_on_delivery",
        "items": items,
    })
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_root_is_public() {
    let response = app()
        .oneshot(request(Method::GET, "/", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (status, body) = send(request(Method::GET, "/api/v1/bookings", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_foreign_token_is_unauthorized() {
    let foreign = issue_token(
        &Actor::new(Uuid::new_v4(), Role::Moderator),
        "some-other-secret",
        3600,
    )
    .unwrap();

    let (status, _) = send(request(Method::GET, "/api/v1/ledger", Some(&foreign), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_categories_listed_for_any_role() {
    let (status, body) = send(request(
        Method::GET,
        "/api/v1/products/categories",
        Some(&token(Role::Moderator)),
        None,
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().unwrap();
    assert!(categories
        .iter()
        .any(|c| c["name"] == "Electronics" && c["prefix"] == "EC"));
}

// ============================================================================
// Role Enforcement
// ============================================================================

#[tokio::test]
async fn test_storeman_cannot_create_booking() {
    let items = json!([{ "product_id": Uuid::new_v4(), "quantity": 1 }]);
    let (status, body) = send(request(
        Method::POST,
        "/api/v1/bookings",
        Some(&token(Role::Storeman)),
        Some(booking_body(items)),
    ))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(body["error"]["details"]["actual"], "storeman");
}

#[tokio::test]
async fn test_moderator_cannot_approve_booking() {
    let uri = format!("/api/v1/bookings/{}/approve", Uuid::new_v4());
    let (status, _) = send(request(
        Method::POST,
        &uri,
        Some(&token(Role::Moderator)),
        None,
    ))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_accountant_cannot_record_delivery() {
    let uri = format!("/api/v1/bookings/{}/delivery", Uuid::new_v4());
    let (status, _) = send(request(
        Method::PUT,
        &uri,
        Some(&token(Role::Accountant)),
        Some(json!({ "status": "delivered" })),
    ))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_moderator_cannot_submit_permission_request() {
    let (status, _) = send(request(
        Method::POST,
        "/api/v1/permission-requests",
        Some(&token(Role::Moderator)),
        Some(json!({
            "supplier_name": "Acme Supply",
            "product_name": "USB Hub",
            "category": "Electronics",
            "mrp": "25.00",
            "selling_price": "20.00",
            "quantity": 10,
        })),
    ))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_storeman_generates_codes() {
    let (status, _) = send(request(
        Method::POST,
        "/api/v1/products/generate-code",
        Some(&token(Role::Accountant)),
        Some(json!({ "category": "Electronics" })),
    ))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Input Validation
// ============================================================================

#[tokio::test]
async fn test_booking_without_items_is_rejected() {
    let (status, body) = send(request(
        Method::POST,
        "/api/v1/bookings",
        Some(&token(Role::Moderator)),
        Some(booking_body(json!([]))),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_booking_with_bad_phone_is_rejected() {
    let mut body = booking_body(json!([{ "product_id": Uuid::new_v4(), "quantity": 1 }]));
    body["customer_phone"] = json!("call me now");

    let (status, _) = send(request(
        Method::POST,
        "/api/v1/bookings",
        Some(&token(Role::Moderator)),
        Some(body),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_with_zero_quantity_is_rejected() {
    let (status, body) = send(request(
        Method::POST,
        "/api/v1/bookings",
        Some(&token(Role::Moderator)),
        Some(booking_body(json!([{ "product_id": Uuid::new_v4(), "quantity": 0 }]))),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "lines.quantity");
}

#[tokio::test]
async fn test_negative_line_is_not_merged_away() {
    let product_id = Uuid::new_v4();
    let (status, body) = send(request(
        Method::POST,
        "/api/v1/bookings",
        Some(&token(Role::Moderator)),
        Some(booking_body(json!([
            { "product_id": product_id, "quantity": -3 },
            { "product_id": product_id, "quantity": 5 },
        ]))),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "lines.quantity");
}

#[tokio::test]
async fn test_adjustment_outside_range_is_rejected() {
    let (status, body) = send(request(
        Method::POST,
        "/api/v1/ledger/adjustments",
        Some(&token(Role::Accountant)),
        Some(json!({
            "product_id": Uuid::new_v4(),
            "entry_type": "adjustment",
            "quantity_change": i32::MIN,
        })),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
