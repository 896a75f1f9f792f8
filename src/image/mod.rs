//! Image encoding: formats, data URIs and upload handling.

pub mod codec;
mod types;

pub use codec::{declared_media_type, encode_blob, read_image};
pub use types::{EncodedImage, ImageFormat};
