use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chart::{ChartExport, ChartRecord};
use crate::config::Permission;
use crate::reading::History;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{AppState, Caller};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReadingRequest {
    #[schema(value_type = ChartExport)]
    pub chart: ChartRecord,
    /// Follow-up question; omit for the full reading.
    #[serde(default)]
    pub question: Option<String>,
    /// Conversation so far, as returned by the previous call.
    #[serde(default)]
    pub history: History,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingResponse {
    pub answer: String,
    pub history: History,
}

#[utoipa::path(
    post,
    path = "/api/reading",
    tag = "reading",
    request_body = ReadingRequest,
    responses(
        (status = 200, description = "Reading or answer", body = ReadingResponse),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Language model request failed", body = ErrorResponse),
        (status = 503, description = "No language model configured", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn reading(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<ReadingRequest>,
) -> ApiResult<Json<ReadingResponse>> {
    caller.require(Permission::GenerateReading)?;

    let generator = state.reading.as_ref().ok_or(ApiError::ReadingUnavailable)?;
    let reply = generator
        .ask(&request.chart, request.question.as_deref(), &request.history)
        .await?;

    Ok(Json(ReadingResponse {
        answer: reply.answer,
        history: reply.history,
    }))
}
