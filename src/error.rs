use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use rust_xlsxwriter::XlsxError;
use serde_json::json;
use thiserror::Error;

use crate::payroll::{InvalidMonth, PayrollInputError, service::PayrollServiceError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("export failed: {0}")]
    Export(#[from] XlsxError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal(_) | ApiError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "message": message }))
    }
}

impl From<InvalidMonth> for ApiError {
    fn from(e: InvalidMonth) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<PayrollInputError> for ApiError {
    fn from(e: PayrollInputError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<PayrollServiceError> for ApiError {
    fn from(e: PayrollServiceError) -> Self {
        match e {
            PayrollServiceError::EmployeeNotFound(_) => ApiError::NotFound(e.to_string()),
            PayrollServiceError::Input(e) => e.into(),
            PayrollServiceError::Store(e) => ApiError::Internal(e),
        }
    }
}
