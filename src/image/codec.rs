//! Turns uploaded files into [`EncodedImage`]s.

use crate::error::{LuminaError, Result};
use crate::image::types::{EncodedImage, ImageFormat};
use std::path::Path;

/// Media type declared for files whose extension is not a known image type.
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Returns the media type a file declares through its extension.
pub fn declared_media_type(path: impl AsRef<Path>) -> &'static str {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .map(|f| f.mime_type())
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
}

/// Encodes an in-memory blob, rejecting anything not declared as `image/*`.
pub fn encode_blob(mime_type: &str, bytes: &[u8]) -> Result<EncodedImage> {
    if !mime_type.starts_with("image/") {
        return Err(LuminaError::Validation(format!(
            "expected an image/* media type, got {mime_type}"
        )));
    }
    Ok(EncodedImage::from_bytes(bytes, mime_type))
}

/// Reads an image file from disk and encodes it.
///
/// The media type is validated before the file is read.
pub async fn read_image(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let mime_type = declared_media_type(path);
    if !mime_type.starts_with("image/") {
        return Err(LuminaError::Validation(format!(
            "{} is not an image file",
            path.display()
        )));
    }

    let bytes = tokio::fs::read(path).await?;
    tracing::debug!(
        path = %path.display(),
        mime_type,
        size_bytes = bytes.len(),
        "encoded upload"
    );
    encode_blob(mime_type, &bytes)
}
