//! Bounded edit history.

use crate::image::EncodedImage;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of edits kept in a session's history.
pub const HISTORY_CAPACITY: usize = 5;

/// A successful edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    /// Time-based identifier, unique within the session.
    pub id: String,
    /// The edited image.
    pub image: EncodedImage,
    /// The instruction that produced it.
    pub prompt: String,
    /// Completion time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl HistoryItem {
    /// The image as a data URI, suitable for display.
    pub fn image_url(&self) -> &str {
        self.image.data()
    }
}

/// Most-recent-first ring of the last [`HISTORY_CAPACITY`] edits.
#[derive(Debug, Clone, Default)]
pub struct History {
    items: VecDeque<HistoryItem>,
}

impl History {
    /// Adds an item at the front, evicting the oldest beyond capacity.
    pub fn push(&mut self, item: HistoryItem) {
        self.items.push_front(item);
        self.items.truncate(HISTORY_CAPACITY);
    }

    /// Finds an item by id.
    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Items, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no edits have been recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copies the items out, newest first.
    pub fn to_vec(&self) -> Vec<HistoryItem> {
        self.items.iter().cloned().collect()
    }
}
