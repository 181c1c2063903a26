use serde::Serialize;

/// A fetched image prepared for inline display.
#[derive(Debug, Clone, Serialize)]
pub struct ImagePreview {
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub png_base64: String,
}

impl ImagePreview {
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.png_base64)
    }

    pub fn is_scaled(&self) -> bool {
        self.display_width != self.width || self.display_height != self.height
    }
}

/// Display dimensions for an image bounded to `max_height`.
///
/// Images taller than the bound are scaled so the height equals `max_height`
/// and the width keeps the original aspect ratio, rounded to the nearest
/// pixel with a 1px minimum. Images within the bound keep their dimensions.
pub fn scaled_dimensions(width: u32, height: u32, max_height: u32) -> (u32, u32) {
    if height <= max_height {
        return (width, height);
    }
    let aspect_ratio = width as f64 / height as f64;
    let new_width = ((max_height as f64 * aspect_ratio).round() as u32).max(1);
    (new_width, max_height)
}
