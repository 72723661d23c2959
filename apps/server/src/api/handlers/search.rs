//! Company search handler
//!
//! GET /api/companies/search
//!
//! Query parameters:
//! - filter fields: name, industry, country, region, size, locality,
//!   founded_from, founded_to (unknown keys are ignored)
//! - `q`: free-text query
//! - `page`, `per_page`: pagination; invalid values fall back to defaults

use axum::{
    extract::{Query, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    db::search::Pagination,
    models::{Record, SearchFilters},
    state::AppState,
    Result,
};

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub companies: Vec<Record>,
    pub total: u64,
    pub pages: u32,
    pub current_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
}

pub async fn search_companies(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let pagination = Pagination::from_query(
        params.get("page").map(String::as_str),
        params.get("per_page").map(String::as_str),
    );
    let filters = SearchFilters::from_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let text_query = params.get("q").map(String::as_str);

    let outcome = state
        .search_service
        .unified_search(&filters, text_query, pagination)
        .await?;

    let body = SearchResponse {
        companies: outcome.page.items,
        total: outcome.page.total,
        pages: outcome.page.total_pages,
        current_page: outcome.page.current_page,
        sql_query: outcome.sql_query,
    };

    let mut response = Json(body).into_response();
    response.headers_mut().insert(
        "x-search-strategy",
        HeaderValue::from_static(outcome.strategy.as_str()),
    );
    Ok(response)
}
