use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bizdock_core::AppError;
use serde::Serialize;
use tracing::{error, warn};
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SessionResolution(_) => StatusCode::UNAUTHORIZED,
            AppError::RelationshipResolution(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Resolution and internal details stay in the logs.
    fn public_message(&self) -> String {
        match &self.0 {
            AppError::Validation(_) | AppError::NotFound(_) => self.0.to_string(),
            AppError::SessionResolution(_) => "authentication required".to_owned(),
            AppError::RelationshipResolution(_) => {
                "access could not be determined, try again later".to_owned()
            }
            AppError::Internal(_) => "internal server error".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            AppError::RelationshipResolution(_) | AppError::SessionResolution(_) => {
                warn!(error = %self.0, "request failed");
            }
            AppError::Internal(_) => error!(error = %self.0, "request failed"),
            AppError::Validation(_) | AppError::NotFound(_) => {}
        }

        let payload = Json(ErrorResponse {
            message: self.public_message(),
        });

        (self.status(), payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
