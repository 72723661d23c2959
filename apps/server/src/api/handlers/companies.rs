//! Company lookup handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value as JsonValue};

use crate::{state::AppState, Error, Result};

/// GET /api/companies/:id
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<JsonValue>> {
    let company = state
        .store
        .get_company(id)
        .await?
        .ok_or(Error::CompanyNotFound(id))?;

    Ok(Json(json!({ "company": company })))
}
