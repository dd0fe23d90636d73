//! Router tests that never reach the database: the pool is lazy and every
//! request here is answered by the auth gate, an extractor, or a public route.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use shoecare_orderservice::{
    app,
    core::{
        app_state::AppState,
        config::Config,
        db,
        middleware::{ADMIN_ROLE, create_token},
        swagger::OPENAPI_JSON_PATH,
    },
    repos::employees::STAFF_ROLE,
};
use tower::ServiceExt;

const SECRET: &str = "http-test-secret";

fn test_app() -> Router {
    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://shoecare@127.0.0.1:1/unused".into()),
        "JWT_SECRET" => Some(SECRET.into()),
        _ => None,
    })
    .unwrap();
    let pool = db::create_lazy_pool(&config.database.url);
    app(AppState::new(pool, config))
}

fn bearer(role: &str) -> String {
    format!("Bearer {}", create_token(1, "Ana", role, SECRET).unwrap())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let response = test_app()
        .oneshot(Request::get("/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["kind"], "unauthorized");
}

#[tokio::test]
async fn token_from_another_secret_is_unauthorized() {
    let token = create_token(1, "Ana", ADMIN_ROLE, "someone-else").unwrap();
    let response = test_app()
        .oneshot(
            Request::get("/storage/map")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_cannot_use_admin_endpoints() {
    let response = test_app()
        .oneshot(
            Request::post("/orders/1/status")
                .header(header::AUTHORIZATION, bearer(STAFF_ROLE))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status_id": 2}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["kind"], "forbidden");
}

#[tokio::test]
async fn malformed_body_is_rejected_before_any_query() {
    let response = test_app()
        .oneshot(
            Request::post("/orders/1/payments")
                .header(header::AUTHORIZATION, bearer(ADMIN_ROLE))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_lists_the_workflow_routes() {
    let response = test_app()
        .oneshot(Request::get(OPENAPI_JSON_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    let paths = doc["paths"].as_object().unwrap();
    for path in [
        "/orders/{id}/status",
        "/orders/{id}/payments",
        "/reservations/{id}/transfer",
        "/orders/{id}/services/{line_id}/storage",
        "/storage/stats",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
}
