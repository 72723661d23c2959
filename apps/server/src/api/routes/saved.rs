//! Saved company routes

use crate::api::handlers::saved;
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

/// Routes nested under `/api/saved-companies`
pub fn saved_company_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(saved::list_saved_companies).post(saved::save_company),
        )
        .route(
            "/:id",
            patch(saved::update_saved_company).delete(saved::delete_saved_company),
        )
}
