use crate::{
    error::{LensError, Result},
    models::{scaled_dimensions, ImagePreview},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops::FilterType, ImageOutputFormat};
use std::io::Cursor;

/// Fetches a user-supplied image URL and prepares a height-bounded preview.
#[derive(Clone)]
pub struct PreviewClient {
    http: reqwest::Client,
}

impl PreviewClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Downloads the image, decodes it, and scales it down so the height does
    /// not exceed `max_height`. The preview is re-encoded as PNG and base64'd
    /// for inline display.
    pub async fn fetch(&self, url: &str, max_height: u32) -> Result<ImagePreview> {
        log::info!("Fetching preview image: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LensError::HttpError(format!("image fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LensError::ApiError(format!(
                "image fetch returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LensError::HttpError(e.to_string()))?;

        let img = image::load_from_memory(&bytes)
            .map_err(|e| LensError::ImageError(format!("could not decode image: {}", e)))?;

        let (width, height) = (img.width(), img.height());
        let (display_width, display_height) = scaled_dimensions(width, height, max_height);

        let display = if (display_width, display_height) == (width, height) {
            img
        } else {
            log::debug!(
                "Scaling preview {}x{} -> {}x{}",
                width,
                height,
                display_width,
                display_height
            );
            img.resize_exact(display_width, display_height, FilterType::Lanczos3)
        };

        let mut png = Vec::new();
        display
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|e| LensError::ImageError(format!("could not encode preview: {}", e)))?;

        Ok(ImagePreview {
            source_url: url.to_string(),
            width,
            height,
            display_width,
            display_height,
            png_base64: BASE64.encode(&png),
        })
    }
}
