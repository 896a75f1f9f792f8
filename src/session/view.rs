//! View model derived from a session snapshot.

use crate::session::controller::SessionSnapshot;
use crate::session::mode::QuickAction;
use serde::Serialize;

/// A quick-action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickActionView {
    /// The preset.
    pub action: QuickAction,
    /// Button label.
    pub label: &'static str,
    /// Highlighted because the last edit used this preset's mode.
    pub active: bool,
    /// Clickable.
    pub enabled: bool,
}

/// A history thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntryView {
    /// History item id.
    pub id: String,
    /// Instruction that produced it.
    pub prompt: String,
    /// Completion time, ms since epoch.
    pub timestamp: i64,
}

/// Everything a front end needs to render the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// An image is on the canvas.
    pub has_image: bool,
    /// Media type of the image on the canvas.
    pub current_mime_type: Option<String>,
    /// The canvas shows the unedited upload.
    pub showing_original: bool,
    /// Draw the processing overlay.
    pub show_overlay: bool,
    /// Overlay status text.
    pub status: String,
    /// Preset buttons.
    pub quick_actions: Vec<QuickActionView>,
    /// The custom-edit trigger is enabled.
    pub can_submit_custom: bool,
    /// Recent edits, newest first.
    pub history: Vec<HistoryEntryView>,
    /// Failure message to show.
    pub notice: Option<String>,
}

impl SessionView {
    /// Derives the view from a snapshot.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let busy = snapshot.processing.is_processing;
        let has_image = snapshot.current.is_some();

        Self {
            has_image,
            current_mime_type: snapshot.current.as_ref().map(|i| i.mime_type().to_string()),
            showing_original: has_image && snapshot.current == snapshot.original,
            show_overlay: busy,
            status: snapshot.processing.status_message.clone(),
            quick_actions: QuickAction::ALL
                .into_iter()
                .map(|action| QuickActionView {
                    action,
                    label: action.label(),
                    active: snapshot.active_mode == Some(action.mode()),
                    enabled: has_image && !busy,
                })
                .collect(),
            can_submit_custom: !snapshot.custom_prompt.trim().is_empty() && !busy,
            history: snapshot
                .history
                .iter()
                .map(|item| HistoryEntryView {
                    id: item.id.clone(),
                    prompt: item.prompt.clone(),
                    timestamp: item.timestamp,
                })
                .collect(),
            notice: snapshot.notice.clone(),
        }
    }
}

impl From<&SessionSnapshot> for SessionView {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::EncodedImage;
    use crate::session::controller::ProcessingState;
    use crate::session::mode::EditMode;

    #[test]
    fn test_empty_session_view() {
        let view = SessionView::from_snapshot(&SessionSnapshot::default());
        assert!(!view.has_image);
        assert!(!view.show_overlay);
        assert!(!view.can_submit_custom);
        assert!(view.quick_actions.iter().all(|a| !a.enabled && !a.active));
    }

    #[test]
    fn test_custom_trigger_needs_text_and_idle() {
        let image = EncodedImage::from_inline("image/png", "AAAA");
        let mut snapshot = SessionSnapshot {
            original: Some(image.clone()),
            current: Some(image),
            custom_prompt: "   ".into(),
            ..Default::default()
        };
        assert!(!SessionView::from_snapshot(&snapshot).can_submit_custom);

        snapshot.custom_prompt = "add a hat".into();
        let view = SessionView::from_snapshot(&snapshot);
        assert!(view.can_submit_custom);
        assert!(view.showing_original);

        snapshot.processing = ProcessingState {
            is_processing: true,
            status_message: "Applying Your Edit...".into(),
        };
        let view = SessionView::from_snapshot(&snapshot);
        assert!(!view.can_submit_custom);
        assert!(view.show_overlay);
        assert_eq!(view.status, "Applying Your Edit...");
        assert!(view.quick_actions.iter().all(|a| !a.enabled));
    }

    #[test]
    fn test_active_mode_marks_matching_actions() {
        let snapshot = SessionSnapshot {
            current: Some(EncodedImage::from_inline("image/png", "AAAA")),
            active_mode: Some(EditMode::ReplaceBackground),
            ..Default::default()
        };
        let view = SessionView::from_snapshot(&snapshot);
        let active: Vec<_> = view
            .quick_actions
            .iter()
            .filter(|a| a.active)
            .map(|a| a.action)
            .collect();
        assert_eq!(
            active,
            [
                QuickAction::IndoorSet,
                QuickAction::Outdoor,
                QuickAction::Cyberpunk
            ]
        );
    }
}
