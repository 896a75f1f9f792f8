//! Image editor trait.

use crate::error::Result;
use crate::image::EncodedImage;
use async_trait::async_trait;

/// A service that edits an image according to a text instruction.
///
/// One call is one request to the service: implementations do not retry.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Edits `image` as described by `prompt` and returns the resulting image.
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
