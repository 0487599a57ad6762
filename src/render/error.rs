use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("request to chart renderer failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chart renderer returned HTTP {0}")]
    Status(u16),
    #[error("chart image exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("response is not a decodable image: {0}")]
    Decode(#[from] image::ImageError),
}
