//! Edit modes and preset quick actions.

use serde::{Deserialize, Serialize};

/// The kind of edit that produced (or is producing) the current image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditMode {
    /// Cut the subject out onto a plain background.
    RemoveBackground,
    /// Put the subject into a different environment.
    ReplaceBackground,
    /// General quality enhancement.
    Enhance,
    /// Free-form instruction typed by the user.
    Style,
}

impl EditMode {
    /// Advisory status text shown while an edit of this mode runs.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "Removing Background...",
            Self::ReplaceBackground => "Building New Scene...",
            Self::Enhance => "Enhancing Details...",
            Self::Style => "Applying Your Edit...",
        }
    }
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoveBackground => write!(f, "remove-background"),
            Self::ReplaceBackground => write!(f, "replace-background"),
            Self::Enhance => write!(f, "enhance"),
            Self::Style => write!(f, "style"),
        }
    }
}

/// One-click preset edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickAction {
    /// Solid white studio background.
    RemoveBackground,
    /// Luxury apartment interior.
    IndoorSet,
    /// Mountain landscape at sunset.
    Outdoor,
    /// Neon geometric backdrop.
    Cyberpunk,
    /// Lighting, sharpness and color cleanup.
    Enhance,
}

impl QuickAction {
    /// Every preset, in display order.
    pub const ALL: [QuickAction; 5] = [
        Self::RemoveBackground,
        Self::IndoorSet,
        Self::Outdoor,
        Self::Cyberpunk,
        Self::Enhance,
    ];

    /// Short button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "Remove BG",
            Self::IndoorSet => "Indoor Set",
            Self::Outdoor => "Outdoor",
            Self::Cyberpunk => "Cyberpunk",
            Self::Enhance => "Enhance",
        }
    }

    /// Command-line name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "remove-bg",
            Self::IndoorSet => "indoor",
            Self::Outdoor => "outdoor",
            Self::Cyberpunk => "cyberpunk",
            Self::Enhance => "enhance",
        }
    }

    /// Looks up a preset by its command-line name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// The mode this preset runs under.
    pub fn mode(&self) -> EditMode {
        match self {
            Self::RemoveBackground => EditMode::RemoveBackground,
            Self::IndoorSet | Self::Outdoor | Self::Cyberpunk => EditMode::ReplaceBackground,
            Self::Enhance => EditMode::Enhance,
        }
    }

    /// The instruction sent to the AI.
    pub fn prompt(&self) -> String {
        match self {
            Self::RemoveBackground => "Remove the background of this image completely and replace it with a clean, solid studio white background. Keep the subject crisp and clear.".to_string(),
            Self::IndoorSet => replace_environment_prompt("luxury apartment with soft natural light"),
            Self::Outdoor => replace_environment_prompt("serene mountain landscape during sunset"),
            Self::Cyberpunk => replace_environment_prompt("abstract neon geometric futuristic background"),
            Self::Enhance => "Enhance this photo: improve lighting, sharpness and color balance while keeping the composition and subject unchanged.".to_string(),
        }
    }
}

/// Prompt asking the AI to move the subject into `environment`.
pub fn replace_environment_prompt(environment: &str) -> String {
    format!(
        "Keep the main subject of this image exactly as is, but change the background to a {environment}. \
         Ensure the lighting on the subject matches the new {environment} environment for a realistic look."
    )
}
