mod chart_image;
mod error;

pub use chart_image::ChartImage;
pub use error::RenderError;

use reqwest::Client;

use crate::chart::ChartParams;
use crate::config::RendererConfig;

/// Client for the external chart drawing service.
pub struct ChartRenderer {
    client: Client,
    url: String,
    max_image_bytes: u64,
}

impl ChartRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            max_image_bytes: config.max_image_bytes,
        })
    }

    /// Requests a chart drawn from `params` and decodes the returned image.
    pub async fn fetch(&self, params: &ChartParams) -> Result<ChartImage, RenderError> {
        log::info!("Requesting chart image from {}", self.url);

        let mut response = self
            .client
            .get(&self.url)
            .query(&params.to_query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let limit = self.max_image_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(RenderError::TooLarge { limit });
        }

        // Content-Length can be absent
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(RenderError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        let image = ChartImage::decode(&body)?;
        let (width, height) = image.dimensions();
        log::debug!(
            "Received {:?} chart image, {}x{}, {} bytes",
            image.format(),
            width,
            height,
            body.len()
        );
        Ok(image)
    }

    /// Like [`fetch`](Self::fetch), but a failure only means no image is
    /// available this time.
    pub async fn fetch_or_none(&self, params: &ChartParams) -> Option<ChartImage> {
        match self.fetch(params).await {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("No chart image available: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::{extract::Query, http::header, http::StatusCode, routing::get, Router};

    use super::*;
    use crate::chart::{derive_chart_params, BirthData, EphemerisSnapshot, Planet, PlanetPosition};
    use crate::ephemeris::FixedAyanamsa;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn renderer(url: String) -> ChartRenderer {
        ChartRenderer::new(&RendererConfig {
            url,
            timeout: Duration::from_secs(5),
            ..RendererConfig::default()
        })
        .unwrap()
    }

    fn params() -> ChartParams {
        let snapshot = EphemerisSnapshot::default()
            .with_planet(Planet::Saturn, PlanetPosition::new(40.0, true))
            .with_house(1, 10.0);
        let birth = BirthData::new(2000, 1, 9, 14, 30, 0, 5.5).unwrap();
        derive_chart_params(&snapshot, &birth, &FixedAyanamsa(23.85)).unwrap()
    }

    async fn printout(Query(query): Query<HashMap<String, String>>) -> (StatusCode, Vec<u8>) {
        let expected = [
            ("Width", "850"),
            ("Height", "1100"),
            ("Sa_Retro", "-1"),
            ("Sa_Full_Degree_Sidereal", "40"),
        ];
        for (key, value) in expected {
            if query.get(key).map(String::as_str) != Some(value) {
                return (StatusCode::BAD_REQUEST, Vec::new());
            }
        }
        (StatusCode::OK, png_bytes(4, 6))
    }

    #[tokio::test]
    async fn fetches_and_decodes_chart() {
        let base = serve(Router::new().route(
            "/BasicPrintout.aspx",
            get(|q: Query<HashMap<String, String>>| async move {
                let (status, body) = printout(q).await;
                (status, [(header::CONTENT_TYPE, "image/png")], body)
            }),
        ))
        .await;

        let image = renderer(format!("{}/BasicPrintout.aspx", base))
            .fetch(&params())
            .await
            .unwrap();
        assert_eq!(image.dimensions(), (4, 6));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = serve(Router::new().route(
            "/chart",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;

        let result = renderer(format!("{}/chart", base)).fetch(&params()).await;
        assert!(matches!(result, Err(RenderError::Status(500))));
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let base = serve(Router::new().route(
            "/chart",
            get(|| async { "<html>Server Error</html>" }),
        ))
        .await;

        let result = renderer(format!("{}/chart", base)).fetch(&params()).await;
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }

    #[tokio::test]
    async fn oversized_image_is_refused() {
        let base = serve(Router::new().route("/chart", get(|| async { png_bytes(64, 64) }))).await;

        let small = ChartRenderer::new(&RendererConfig {
            url: format!("{}/chart", base),
            max_image_bytes: 16,
            ..RendererConfig::default()
        })
        .unwrap();
        let result = small.fetch(&params()).await;
        assert!(matches!(result, Err(RenderError::TooLarge { limit: 16 })));

        let roomy = renderer(format!("{}/chart", base));
        assert_eq!(roomy.fetch(&params()).await.unwrap().dimensions(), (64, 64));
    }

    #[tokio::test]
    async fn unreachable_renderer_yields_no_image() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let image = renderer(format!("http://{}/chart", addr))
            .fetch_or_none(&params())
            .await;
        assert!(image.is_none());
    }
}
