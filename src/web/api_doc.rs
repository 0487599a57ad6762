use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::reading::{ReadingRequest, ReadingResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::chart::chart_params,
        super::api::chart::chart_image,
        super::api::reading::reading,
    ),
    components(
        schemas(
            ErrorResponse,
            ReadingRequest,
            ReadingResponse,
            crate::chart::ChartExport,
            crate::chart::BirthExport,
            crate::chart::PlanetPosition,
            crate::chart::HouseCusp,
            crate::chart::Significators,
            crate::chart::ChartParams,
            crate::chart::ParamValue,
            crate::reading::History,
            crate::reading::ChatTurn,
            crate::reading::ChatRole,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Vedic Chart API",
        description = "Chart parameter derivation, chart images and readings",
        version = "0.1.0"
    ),
    tags(
        (name = "chart", description = "Chart parameters and images"),
        (name = "reading", description = "Language model readings")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
