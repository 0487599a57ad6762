use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chart::DeriveError;
use crate::reading::ReadingError;
use crate::render::RenderError;
use crate::web::auth::Forbidden;

pub enum ApiError {
    Forbidden(Forbidden),
    Derivation(DeriveError),
    NoImage(RenderError),
    ReadingUnavailable,
    Reading(ReadingError),
}

impl From<Forbidden> for ApiError {
    fn from(e: Forbidden) -> Self {
        ApiError::Forbidden(e)
    }
}

impl From<DeriveError> for ApiError {
    fn from(e: DeriveError) -> Self {
        ApiError::Derivation(e)
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::NoImage(e)
    }
}

impl From<ReadingError> for ApiError {
    fn from(e: ReadingError) -> Self {
        ApiError::Reading(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Forbidden(e) => e.into_response(),
            ApiError::Derivation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::with_message("derivation_failed", &e.to_string())),
            )
                .into_response(),
            ApiError::NoImage(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::with_message("no_image_available", &e.to_string())),
            )
                .into_response(),
            ApiError::ReadingUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::with_message(
                    "reading_unavailable",
                    "No language model is configured",
                )),
            )
                .into_response(),
            ApiError::Reading(e) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::with_message("reading_failed", &e.to_string())),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
