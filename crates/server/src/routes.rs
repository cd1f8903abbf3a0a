pub mod catalog;
pub mod legacy;
pub mod rest;

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use common::types::{ApiTest, Health};
use service::CatalogService;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use crate::observability::encode_metrics;
use crate::openapi::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn banner() -> &'static str {
    "Catalog API is running..."
}

#[utoipa::path(get, path = "/api/test", tag = "health", responses((status = 200, description = "API reachable", body = crate::openapi::ApiTestResponse)))]
pub async fn api_test() -> Json<ApiTest> {
    Json(ApiTest {
        success: true,
        message: "API is working correctly".into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    let (status, body) = encode_metrics();
    (status, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: both catalog route families, misc
/// endpoints and uploaded images under `/Uploads`.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let uploads = ServeDir::new(state.catalog.images().root());
    // multipart overhead on top of several max-size images
    let body_limit = state.catalog.images().max_bytes().saturating_mul(8).max(2 * 1024 * 1024);

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api/test", get(api_test))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(legacy::router())
        .merge(rest::router())
        .nest_service("/Uploads", uploads)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and transport failures
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
