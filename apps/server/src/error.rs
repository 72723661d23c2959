//! Error types for the directory server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::search::safety::RejectionReason;
use crate::services::text_generation::GenerationError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid value for filter '{field}': {value}")]
    InvalidFilterValue { field: String, value: String },

    #[error("Text generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Generated SQL rejected: {0}")]
    ValidationRejected(RejectionReason),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(i32),

    #[error("Saved company not found: {0}")]
    SavedCompanyNotFound(i32),

    #[error("Company {company_id} already saved by user {user_id}")]
    AlreadySaved { company_id: i32, user_id: i32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable, machine-checkable category for the public error body.
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidFilterValue { .. } => "invalid_filter_value",
            Error::Generation(_) => "generation_error",
            Error::ValidationRejected(_) => "validation_rejected",
            Error::Execution(_) => "execution_error",
            Error::CompanyNotFound(_) | Error::SavedCompanyNotFound(_) => "not_found",
            Error::AlreadySaved { .. } => "already_saved",
            Error::Validation(_) => "invalid_request",
            Error::Database(_) | Error::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidFilterValue { .. } | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::CompanyNotFound(_) | Error::SavedCompanyNotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadySaved { .. } => StatusCode::CONFLICT,
            Error::Generation(_) => StatusCode::BAD_GATEWAY,
            Error::ValidationRejected(_)
            | Error::Execution(_)
            | Error::Database(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show callers; server-side details are replaced.
    pub fn public_message(&self) -> String {
        if !self.status().is_server_error() {
            return self.to_string();
        }
        match self {
            Error::Generation(_) => "Text generation service unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(category = self.category(), error = %self, "Request failed");
        }
        let message = self.public_message();

        let body = Json(json!({
            "status": "error",
            "category": self.category(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = Error::InvalidFilterValue {
            field: "founded_from".to_string(),
            value: "soon".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.category(), "invalid_filter_value");
        assert_eq!(
            err.public_message(),
            "Invalid value for filter 'founded_from': soon"
        );

        let err = Error::CompanyNotFound(9);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Company not found: 9");

        let err = Error::AlreadySaved {
            company_id: 3,
            user_id: 1,
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.category(), "already_saved");
        assert_eq!(err.public_message(), "Company 3 already saved by user 1");
    }

    #[test]
    fn server_errors_hide_internal_text() {
        let err = Error::Execution("relation \"secrets\" does not exist".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");

        let err = Error::Generation(GenerationError::EmptyResponse);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.category(), "generation_error");
        assert_eq!(err.public_message(), "Text generation service unavailable");
    }
}
