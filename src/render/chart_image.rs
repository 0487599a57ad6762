use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};

use crate::render::RenderError;

/// A chart image returned by the renderer.
#[derive(Debug, Clone)]
pub struct ChartImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl ChartImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, RenderError> {
        let format = image::guess_format(bytes)?;
        let image = image::load_from_memory_with_format(bytes, format)?;
        Ok(Self { image, format })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Re-encodes the chart as PNG for download.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut buf = Cursor::new(Vec::new());
        self.image.write_to(&mut buf, ImageOutputFormat::Png)?;
        Ok(buf.into_inner())
    }

    pub fn download_file_name(person: &str) -> String {
        let stem: String = person
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() { "chart".to_string() } else { stem };
        format!("{}_vedic_chart.png", stem)
    }
}
