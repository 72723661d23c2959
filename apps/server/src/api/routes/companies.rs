//! Company directory routes

use crate::api::handlers::{companies, enrichment, search};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Routes nested under `/api/companies`
pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search_companies))
        .route("/:id", get(companies::get_company))
}

/// Routes nested under `/api/enrichment`
pub fn enrichment_routes() -> Router<AppState> {
    Router::new()
        .route("/company/:id", post(enrichment::enrich_company))
        .route("/batch", post(enrichment::batch_enrich))
}
