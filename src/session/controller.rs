//! The editing session: one original image, one current image, one edit in
//! flight at most.

use crate::edit::ImageEditor;
use crate::error::{LuminaError, Result};
use crate::image::{read_image, EncodedImage};
use crate::session::history::{History, HistoryItem};
use crate::session::mode::{EditMode, QuickAction};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Prefix of exported file names.
pub const EXPORT_PREFIX: &str = "lumina-edit-";

/// Name for an exported image.
///
/// Always `.png`, whatever the image's actual media type.
pub fn export_file_name(timestamp_ms: i64) -> String {
    format!("{EXPORT_PREFIX}{timestamp_ms}.png")
}

/// Whether an edit is running, and what to tell the user meanwhile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingState {
    /// True while a request to the editor is in flight.
    pub is_processing: bool,
    /// Advisory status text; empty when idle.
    pub status_message: String,
}

impl ProcessingState {
    fn processing(status: &str) -> Self {
        Self {
            is_processing: true,
            status_message: status.to_string(),
        }
    }
}

/// Read-only copy of a session's state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    /// The uploaded image.
    pub original: Option<EncodedImage>,
    /// The image on the canvas.
    pub current: Option<EncodedImage>,
    /// Processing status.
    pub processing: ProcessingState,
    /// Mode of the most recently started edit.
    pub active_mode: Option<EditMode>,
    /// Pending free-form instruction.
    pub custom_prompt: String,
    /// Recent edits, newest first.
    pub history: Vec<HistoryItem>,
    /// Message about the last failure, if not dismissed.
    pub notice: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    original: Option<EncodedImage>,
    current: Option<EncodedImage>,
    processing: ProcessingState,
    active_mode: Option<EditMode>,
    custom_prompt: String,
    history: History,
    notice: Option<String>,
    // Bumped by `reset`; edits started under an older epoch are discarded.
    epoch: u64,
}

/// An editing session.
///
/// Owns all session state. Handlers share it by reference (or `Arc`); every
/// method takes `&self` and the state lock is never held across an await.
pub struct Session {
    editor: Arc<dyn ImageEditor>,
    state: Mutex<SessionState>,
    next_id: AtomicU64,
}

impl Session {
    /// Creates an empty session that edits through `editor`.
    pub fn new(editor: Arc<dyn ImageEditor>) -> Self {
        Self {
            editor,
            state: Mutex::new(SessionState::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Name of the underlying editor.
    pub fn editor_name(&self) -> &str {
        self.editor.name()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads an image file as both the original and current image.
    ///
    /// On failure the session is left untouched.
    pub async fn select_image(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = read_image(path).await?;
        self.select_encoded(image)
    }

    /// Loads an already encoded image as both the original and current image.
    pub fn select_encoded(&self, image: EncodedImage) -> Result<()> {
        let mut state = self.lock();
        if state.processing.is_processing {
            return Err(LuminaError::Busy);
        }
        tracing::debug!(mime_type = image.mime_type(), "image selected");
        state.original = Some(image.clone());
        state.current = Some(image);
        state.active_mode = None;
        state.processing = ProcessingState::default();
        state.notice = None;
        state.epoch += 1;
        Ok(())
    }

    /// Sends the original image and `prompt` to the editor.
    ///
    /// Returns `Ok(None)` without calling the editor when no image is loaded,
    /// `Err(EmptyPrompt)` for a blank prompt, and `Err(Busy)` while another
    /// edit is in flight. On success the result
    /// becomes the current image and is recorded in history. On failure the
    /// current image and history are unchanged and a notice is recorded.
    pub async fn apply_edit(&self, prompt: &str, mode: EditMode) -> Result<Option<HistoryItem>> {
        let (source, epoch) = {
            let mut state = self.lock();
            let Some(original) = state.original.clone() else {
                tracing::debug!("edit ignored: no image loaded");
                return Ok(None);
            };
            if prompt.trim().is_empty() {
                return Err(LuminaError::EmptyPrompt);
            }
            if state.processing.is_processing {
                return Err(LuminaError::Busy);
            }
            state.processing = ProcessingState::processing(mode.status_message());
            state.active_mode = Some(mode);
            state.notice = None;
            (original, state.epoch)
        };

        tracing::debug!(%mode, editor = self.editor.name(), "edit started");
        let mut in_flight = InFlight {
            session: self,
            armed: true,
        };
        let result = self.editor.edit(&source, prompt).await;
        in_flight.armed = false;

        let mut state = self.lock();
        state.processing = ProcessingState::default();

        match result {
            Ok(image) => {
                if state.epoch != epoch {
                    tracing::debug!(%mode, "session reset during edit, result discarded");
                    return Ok(None);
                }
                let timestamp = chrono::Utc::now().timestamp_millis();
                let item = HistoryItem {
                    id: format!(
                        "{}-{}",
                        timestamp,
                        self.next_id.fetch_add(1, Ordering::Relaxed)
                    ),
                    image: image.clone(),
                    prompt: prompt.to_string(),
                    timestamp,
                };
                state.current = Some(image);
                state.history.push(item.clone());
                tracing::debug!(%mode, id = %item.id, "edit applied");
                Ok(Some(item))
            }
            Err(e) => {
                tracing::warn!(%mode, "edit failed: {e}");
                if state.epoch == epoch {
                    state.notice = Some(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Runs a preset edit.
    pub async fn apply_quick_action(&self, action: QuickAction) -> Result<Option<HistoryItem>> {
        self.apply_edit(&action.prompt(), action.mode()).await
    }

    /// Replaces the pending free-form instruction.
    pub fn set_custom_prompt(&self, text: impl Into<String>) {
        self.lock().custom_prompt = text.into();
    }

    /// Runs the pending free-form instruction in [`EditMode::Style`].
    ///
    /// A blank instruction sends nothing and returns `Ok(None)`.
    pub async fn apply_custom_edit(&self) -> Result<Option<HistoryItem>> {
        let prompt = self.lock().custom_prompt.clone();
        if prompt.trim().is_empty() {
            return Ok(None);
        }
        self.apply_edit(&prompt, EditMode::Style).await
    }

    /// Shows the original image again. History is unaffected.
    pub fn revert_to_original(&self) {
        let mut state = self.lock();
        state.current = state.original.clone();
    }

    /// Shows a previous edit. History is unaffected.
    pub fn select_history_item(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        let image = state
            .history
            .get(id)
            .map(|item| item.image.clone())
            .ok_or_else(|| LuminaError::UnknownHistoryItem(id.to_string()))?;
        state.current = Some(image);
        Ok(())
    }

    /// Clears the images, active mode and pending instruction. History stays.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.original = None;
        state.current = None;
        state.active_mode = None;
        state.custom_prompt.clear();
        state.notice = None;
        state.epoch += 1;
    }

    /// Clears the failure notice.
    pub fn dismiss_notice(&self) {
        self.lock().notice = None;
    }

    /// Copies out the full state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            original: state.original.clone(),
            current: state.current.clone(),
            processing: state.processing.clone(),
            active_mode: state.active_mode,
            custom_prompt: state.custom_prompt.clone(),
            history: state.history.to_vec(),
            notice: state.notice.clone(),
        }
    }

    /// The image on the canvas.
    pub fn current_image(&self) -> Option<EncodedImage> {
        self.lock().current.clone()
    }

    /// The uploaded image.
    pub fn original_image(&self) -> Option<EncodedImage> {
        self.lock().original.clone()
    }

    /// Processing status.
    pub fn processing(&self) -> ProcessingState {
        self.lock().processing.clone()
    }

    /// Recent edits, newest first.
    pub fn history(&self) -> Vec<HistoryItem> {
        self.lock().history.to_vec()
    }

    /// Writes the current image into `dir` under [`export_file_name`].
    pub async fn save_current(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let image = self.current_image().ok_or(LuminaError::NoImageLoaded)?;
        let bytes = image.decode()?;
        let path = dir
            .as_ref()
            .join(export_file_name(chrono::Utc::now().timestamp_millis()));
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "image exported");
        Ok(path)
    }
}

/// Returns the session to idle if an edit future is dropped mid-flight.
struct InFlight<'a> {
    session: &'a Session,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.lock().processing = ProcessingState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct FixedEditor {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FixedEditor {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl ImageEditor for FixedEditor {
        async fn edit(&self, _image: &EncodedImage, prompt: &str) -> Result<EncodedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LuminaError::NoImageInResponse);
            }
            Ok(EncodedImage::from_bytes(prompt.as_bytes(), "image/png"))
        }

        fn name(&self) -> &str {
            "fixed"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn upload() -> EncodedImage {
        EncodedImage::from_bytes(b"original", "image/jpeg")
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(1700000000123), "lumina-edit-1700000000123.png");
    }

    #[tokio::test]
    async fn test_apply_without_image_is_noop() {
        let editor = FixedEditor::ok();
        let session = Session::new(editor.clone());
        let result = session
            .apply_edit("remove background", EditMode::RemoveBackground)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(editor.calls.load(Ordering::SeqCst), 0);
        assert!(!session.processing().is_processing);
    }

    #[tokio::test]
    async fn test_blank_prompt_without_image_is_noop() {
        let editor = FixedEditor::ok();
        let session = Session::new(editor.clone());
        let result = session.apply_edit("", EditMode::Style).await.unwrap();
        assert!(result.is_none());
        assert_eq!(editor.calls.load(Ordering::SeqCst), 0);
        assert!(session.snapshot().notice.is_none());
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected() {
        let editor = FixedEditor::ok();
        let session = Session::new(editor.clone());
        session.select_encoded(upload()).unwrap();
        let err = session.apply_edit("   ", EditMode::Style).await.unwrap_err();
        assert!(matches!(err, LuminaError::EmptyPrompt));
        assert_eq!(editor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_edit_updates_current_and_history() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();

        let item = session
            .apply_edit("make it blue", EditMode::Style)
            .await
            .unwrap()
            .unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.current.as_ref(), Some(&item.image));
        assert_eq!(snap.original, Some(upload()));
        assert_eq!(snap.history.len(), 1);
        assert_eq!(snap.history[0].prompt, "make it blue");
        assert_eq!(snap.active_mode, Some(EditMode::Style));
        assert_eq!(snap.processing, ProcessingState::default());
        assert_eq!(item.image_url(), item.image.data());
    }

    #[tokio::test]
    async fn test_edits_always_start_from_original() {
        struct EchoEditor;

        #[async_trait]
        impl ImageEditor for EchoEditor {
            async fn edit(&self, image: &EncodedImage, _prompt: &str) -> Result<EncodedImage> {
                let mut bytes = image.decode()?;
                bytes.push(b'!');
                Ok(EncodedImage::from_bytes(&bytes, image.mime_type()))
            }

            fn name(&self) -> &str {
                "echo"
            }

            async fn health_check(&self) -> Result<()> {
                Ok(())
            }
        }

        let session = Session::new(Arc::new(EchoEditor));
        session.select_encoded(upload()).unwrap();
        session.apply_edit("a", EditMode::Style).await.unwrap();
        session.apply_edit("b", EditMode::Style).await.unwrap();

        let current = session.current_image().unwrap();
        assert_eq!(current.decode().unwrap(), b"original!");
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_state_and_sets_notice() {
        let session = Session::new(FixedEditor::failing());
        session.select_encoded(upload()).unwrap();

        let err = session
            .apply_edit("remove background", EditMode::RemoveBackground)
            .await
            .unwrap_err();
        assert!(matches!(err, LuminaError::NoImageInResponse));

        let snap = session.snapshot();
        assert_eq!(snap.current, Some(upload()));
        assert!(snap.history.is_empty());
        assert!(!snap.processing.is_processing);
        assert_eq!(
            snap.notice.as_deref(),
            Some(LuminaError::NoImageInResponse.user_message().as_str())
        );

        session.dismiss_notice();
        assert!(session.snapshot().notice.is_none());
    }

    #[tokio::test]
    async fn test_revert_is_idempotent() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();
        session.apply_edit("x", EditMode::Enhance).await.unwrap();
        assert_ne!(session.current_image(), session.original_image());

        for _ in 0..3 {
            session.revert_to_original();
            assert_eq!(session.current_image(), session.original_image());
        }
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_select_history_item() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();
        let first = session.apply_edit("first", EditMode::Style).await.unwrap().unwrap();
        session.apply_edit("second", EditMode::Style).await.unwrap();

        session.select_history_item(&first.id).unwrap();
        assert_eq!(session.current_image(), Some(first.image.clone()));
        assert_eq!(session.history().len(), 2);

        let err = session.select_history_item("nope").unwrap_err();
        assert!(matches!(err, LuminaError::UnknownHistoryItem(_)));
        assert_eq!(session.current_image(), Some(first.image));
    }

    #[tokio::test]
    async fn test_history_ids_unique() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();
        for i in 0..4 {
            session.apply_edit(&format!("edit {i}"), EditMode::Style).await.unwrap();
        }
        let history = session.history();
        let mut ids: Vec<_> = history.iter().map(|h| h.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(history[0].prompt, "edit 3");
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();
        session.set_custom_prompt("sepia");
        session.apply_custom_edit().await.unwrap();

        session.reset();
        let snap = session.snapshot();
        assert!(snap.original.is_none());
        assert!(snap.current.is_none());
        assert!(snap.active_mode.is_none());
        assert!(snap.custom_prompt.is_empty());
        assert_eq!(snap.history.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_edit_blank_sends_nothing() {
        let editor = FixedEditor::ok();
        let session = Session::new(editor.clone());
        session.select_encoded(upload()).unwrap();
        session.set_custom_prompt("  ");
        assert!(session.apply_custom_edit().await.unwrap().is_none());
        assert_eq!(editor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quick_action_sets_mode() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();
        let item = session
            .apply_quick_action(QuickAction::Cyberpunk)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.prompt, QuickAction::Cyberpunk.prompt());
        assert_eq!(
            session.snapshot().active_mode,
            Some(EditMode::ReplaceBackground)
        );
    }

    #[tokio::test]
    async fn test_select_resets_mode() {
        let session = Session::new(FixedEditor::ok());
        session.select_encoded(upload()).unwrap();
        session.apply_edit("x", EditMode::Enhance).await.unwrap();

        let next = EncodedImage::from_bytes(b"next", "image/png");
        session.select_encoded(next.clone()).unwrap();
        let snap = session.snapshot();
        assert!(snap.active_mode.is_none());
        assert_eq!(snap.original, Some(next.clone()));
        assert_eq!(snap.current, Some(next));
    }

    #[tokio::test]
    async fn test_save_current() {
        let session = Session::new(FixedEditor::ok());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            session.save_current(dir.path()).await.unwrap_err(),
            LuminaError::NoImageLoaded
        ));

        session.select_encoded(upload()).unwrap();
        let path = session.save_current(dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(EXPORT_PREFIX));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"original");
    }
}
