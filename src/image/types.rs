//! Core image types.

use crate::error::{LuminaError, Result};
use base64::Engine;
use serde::Serialize;

/// Image formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
    /// Windows bitmap.
    Bmp,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// An image as a self-describing base64 data URI plus its media type.
///
/// Produced once per upload (or per AI result) and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImage {
    data: String,
    mime_type: String,
}

impl EncodedImage {
    /// Encodes raw bytes under the given media type.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::from_inline(mime_type, payload)
    }

    /// Wraps an already base64-encoded payload, as returned inline by the AI.
    pub fn from_inline(mime_type: impl Into<String>, base64_data: impl AsRef<str>) -> Self {
        let mime_type = mime_type.into();
        Self {
            data: format!("data:{};base64,{}", mime_type, base64_data.as_ref()),
            mime_type,
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn parse(data_uri: &str) -> Result<Self> {
        let rest = data_uri
            .strip_prefix("data:")
            .ok_or_else(|| LuminaError::Decode("not a data URI".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| LuminaError::Decode("data URI has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| LuminaError::Decode("data URI is not base64 encoded".into()))?;
        if mime_type.is_empty() {
            return Err(LuminaError::Decode("data URI has no media type".into()));
        }
        Ok(Self::from_inline(mime_type, payload))
    }

    /// The full data URI.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// The declared media type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload with the data-URI prefix stripped.
    pub fn payload(&self) -> &str {
        self.data
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or_default()
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload())
            .map_err(|e| LuminaError::Decode(e.to_string()))
    }

}
