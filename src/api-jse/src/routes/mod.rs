use axum::http::{HeaderValue, Method, StatusCode};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod logging_middleware;
pub mod process;
pub mod records;

pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "healthy")
}

//
// Router
//

pub fn router(cors_origin: HeaderValue) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/{site}/process", post(process::post_process))
        .route("/api/{site}/application_links", get(records::get_application_links))
        .route("/api/{site}/descriptions", get(records::get_descriptions))
        .route("/api/{site}/failed_jobs", get(records::get_failed_jobs))
        .route("/api/{site}/jobs", get(records::get_jobs))
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        .layer(cors)
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
