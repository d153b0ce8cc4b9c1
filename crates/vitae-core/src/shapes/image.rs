//! Image object for embedding raster pictures.

use super::{ObjectCommon, ObjectTrait};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Raster formats accepted for embedded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }

    /// Encode raw bytes as a `data:` URL of this format.
    pub fn data_url(&self, data: &[u8]) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(data))
    }
}

/// Decode the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

/// A raster image referenced by URL or embedded as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(flatten)]
    pub common: ObjectCommon,
    #[serde(default)]
    pub src: String,
    /// Natural width in pixels.
    #[serde(default)]
    pub width: f64,
    /// Natural height in pixels.
    #[serde(default)]
    pub height: f64,
}

impl Image {
    pub fn new(left: f64, top: f64, src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            common: ObjectCommon::at(left, top),
            src: src.into(),
            width: width as f64,
            height: height as f64,
        }
    }

    /// Apply a uniform display scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.common.scale_x = scale;
        self.common.scale_y = scale;
        self
    }

    /// Decoded bytes when the source is an embedded data URL.
    pub fn data(&self) -> Option<Vec<u8>> {
        decode_data_url(&self.src)
    }

    pub fn is_embedded(&self) -> bool {
        self.src.starts_with("data:")
    }
}

impl ObjectTrait for Image {
    fn common(&self) -> &ObjectCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ObjectCommon {
        &mut self.common
    }

    fn bounds(&self) -> Rect {
        self.common.scaled_box(self.width, self.height)
    }
}
