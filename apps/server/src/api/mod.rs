//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_request_body_size;
    let cors_origins = state.config.server.cors_origins.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .merge(routes::metrics::metrics_routes())
        .nest("/api/companies", routes::companies::company_routes())
        .nest("/api/enrichment", routes::companies::enrichment_routes())
        .nest("/api/saved-companies", routes::saved::saved_company_routes())
        .with_state(state)
        // Applied in reverse order
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(middleware::compression())
        .layer(middleware::cors(&cors_origins))
        .layer(middleware::trace())
        .layer(middleware::body_limit(max_body_size))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "company-directory"
    }))
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "server": "Company Directory",
        "version": env!("CARGO_PKG_VERSION"),
        "ai_enabled": state.config.ai.api_key.is_some(),
        "status": "running"
    }))
}
