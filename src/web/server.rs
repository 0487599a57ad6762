use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::ephemeris;
use crate::reading::{GeminiClient, ReadingGenerator};
use crate::render::ChartRenderer;

use super::api::chart as chart_handlers;
use super::api::reading as reading_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chart/params", post(chart_handlers::chart_params))
        .route("/api/chart/image", post(chart_handlers::chart_image))
        .route("/api/reading", post(reading_handlers::reading))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let renderer = ChartRenderer::new(&config.renderer).map_err(std::io::Error::other)?;

    let reading = match GeminiClient::from_config(&config.llm) {
        Ok(client) => Some(ReadingGenerator::new(Arc::new(client))),
        Err(e) => {
            log::warn!("Readings disabled: {}", e);
            None
        }
    };

    if config.api_keys.is_empty() {
        log::warn!("No API keys configured, the API is open to anyone who can reach it");
    }

    let state = AppState {
        ephemeris: ephemeris::from_config(&config.ephemeris),
        config: Arc::new(config),
        renderer: Arc::new(renderer),
        reading,
    };

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
