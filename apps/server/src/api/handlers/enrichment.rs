//! Enrichment handlers
//!
//! - POST /api/enrichment/company/:id
//! - POST /api/enrichment/batch with `{"company_ids": [..]}`

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::{state::AppState, Result};

#[derive(Debug, Deserialize)]
pub struct BatchEnrichRequest {
    #[serde(default)]
    pub company_ids: Vec<i32>,
}

pub async fn enrich_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<JsonValue>> {
    let company = state.enrichment_service.enrich_company(id).await?;
    Ok(Json(json!({ "company": company })))
}

pub async fn batch_enrich(
    State(state): State<AppState>,
    Json(request): Json<BatchEnrichRequest>,
) -> Result<Json<JsonValue>> {
    let report = state
        .enrichment_service
        .batch_enrich(&request.company_ids)
        .await?;

    Ok(Json(json!({
        "count": report.enriched.len(),
        "enriched_companies": report.enriched,
        "errors": report.errors,
    })))
}
