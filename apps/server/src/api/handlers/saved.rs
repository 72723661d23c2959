//! Saved company handlers
//!
//! - GET /api/saved-companies?user_id=&page=&per_page=
//! - POST /api/saved-companies with `{"company_id", "user_id"?, "notes"?}`
//! - PATCH /api/saved-companies/:id with `{"notes"}`
//! - DELETE /api/saved-companies/:id

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

use crate::{
    db::search::Pagination,
    models::DEFAULT_USER_ID,
    state::AppState,
    Error, Result,
};

#[derive(Debug, Deserialize)]
pub struct SaveCompanyRequest {
    pub company_id: Option<i32>,
    pub user_id: Option<i32>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSavedCompanyRequest {
    pub notes: Option<String>,
}

fn user_id(params: &HashMap<String, String>) -> Result<i32> {
    match params.get("user_id").map(|v| v.trim()) {
        None | Some("") => Ok(DEFAULT_USER_ID),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid user_id: {raw}"))),
    }
}

pub async fn list_saved_companies(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<JsonValue>> {
    let pagination = Pagination::from_query(
        params.get("page").map(String::as_str),
        params.get("per_page").map(String::as_str),
    );
    let page = state
        .saved_service
        .list(user_id(&params)?, pagination)
        .await?;

    Ok(Json(json!({
        "saved_companies": page.items,
        "total": page.total,
        "pages": page.total_pages,
        "current_page": page.current_page,
    })))
}

pub async fn save_company(
    State(state): State<AppState>,
    Json(request): Json<SaveCompanyRequest>,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let company_id = request
        .company_id
        .ok_or_else(|| Error::Validation("Company ID is required".to_string()))?;
    let saved = state
        .saved_service
        .save(
            request.user_id.unwrap_or(DEFAULT_USER_ID),
            company_id,
            &request.notes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "saved_company": saved }))))
}

pub async fn update_saved_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateSavedCompanyRequest>,
) -> Result<Json<JsonValue>> {
    let saved = state
        .saved_service
        .update_notes(id, request.notes.as_deref())
        .await?;
    Ok(Json(json!({ "saved_company": saved })))
}

pub async fn delete_saved_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<JsonValue>> {
    state.saved_service.delete(id).await?;
    Ok(Json(json!({ "success": true })))
}
