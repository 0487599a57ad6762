use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::chart::{derive_chart_params, ChartParams, ChartRecord};
use crate::config::Permission;
use crate::render::ChartImage;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{AppState, Caller};

#[utoipa::path(
    post,
    path = "/api/chart/params",
    tag = "chart",
    request_body = crate::chart::ChartExport,
    responses(
        (status = 200, description = "Renderer parameter set", body = ChartParams),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid birth data or derivation failed", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn chart_params(
    State(state): State<AppState>,
    caller: Caller,
    Json(chart): Json<ChartRecord>,
) -> ApiResult<Json<ChartParams>> {
    caller.require(Permission::DeriveChart)?;

    let params = derive_chart_params(&chart.snapshot, &chart.birth, state.ephemeris.as_ref())?;
    Ok(Json(params))
}

#[utoipa::path(
    post,
    path = "/api/chart/image",
    tag = "chart",
    request_body = crate::chart::ChartExport,
    responses(
        (status = 200, description = "Chart image", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid birth data or derivation failed", body = ErrorResponse),
        (status = 503, description = "No chart image available", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn chart_image(
    State(state): State<AppState>,
    caller: Caller,
    Json(chart): Json<ChartRecord>,
) -> ApiResult<Response> {
    caller.require(Permission::RenderChart)?;

    let params = derive_chart_params(&chart.snapshot, &chart.birth, state.ephemeris.as_ref())?;
    let image = state.renderer.fetch(&params).await.map_err(|e| {
        log::warn!("Chart image for {} unavailable: {}", chart.name, e);
        e
    })?;
    let png = image.to_png()?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        ChartImage::download_file_name(&chart.name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}
