//! Provider-agnostic edit request payload.

use crate::image::EncodedImage;

/// One part of an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPart {
    /// Raw base64 image data (no data-URI prefix) tagged with its media type.
    InlineData {
        /// Media type of the image.
        mime_type: String,
        /// Base64 payload.
        data: String,
    },
    /// The natural-language instruction.
    Text {
        /// Instruction text.
        text: String,
    },
}

/// An edit request: the source image followed by the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    parts: Vec<EditPart>,
}

impl EditRequest {
    /// Builds the two-part request for `image` and `prompt`.
    ///
    /// Callers are responsible for rejecting blank prompts.
    pub fn new(image: &EncodedImage, prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![
                EditPart::InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: image.payload().to_string(),
                },
                EditPart::Text {
                    text: prompt.into(),
                },
            ],
        }
    }

    /// The parts in send order.
    pub fn parts(&self) -> &[EditPart] {
        &self.parts
    }

}
