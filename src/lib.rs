#![warn(missing_docs)]
//! Lumina - AI photo editing sessions.
//!
//! Upload a photo, describe an edit in plain language, and let a Gemini image
//! model produce the result. A [`Session`] keeps the original upload, the
//! image currently shown, a short history of edits, and makes sure only one
//! edit runs at a time.
//!
//! # Quick Start
//!
//! ```no_run
//! use lumina::{GeminiEditor, QuickAction, Session};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> lumina::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let session = Session::new(Arc::new(editor));
//!
//!     session.select_image("portrait.jpg").await?;
//!     session.apply_quick_action(QuickAction::RemoveBackground).await?;
//!     let saved = session.save_current(".").await?;
//!     println!("saved {}", saved.display());
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `lumina` binary and the interactive [`shell`].

pub mod edit;
mod error;
pub mod image;
pub mod session;

#[cfg(feature = "cli")]
pub mod shell;

// Re-export error types at crate root
pub use error::{LuminaError, Result};

pub use edit::{EditPart, EditRequest, GeminiEditor, GeminiEditorBuilder, GeminiModel, ImageEditor};
pub use image::{EncodedImage, ImageFormat};
pub use session::{
    EditMode, HistoryItem, ProcessingState, QuickAction, Session, SessionSnapshot, SessionView,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::edit::{GeminiEditor, ImageEditor};
    pub use crate::error::{LuminaError, Result};
    pub use crate::image::EncodedImage;
    pub use crate::session::{EditMode, QuickAction, Session, SessionView};
}
