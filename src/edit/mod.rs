//! AI image editing: request payloads, the editor trait and the Gemini client.

pub mod gemini;
mod provider;
mod request;

pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use provider::ImageEditor;
pub use request::{EditPart, EditRequest};
