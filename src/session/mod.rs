//! Editing session state and its derived view.

mod controller;
mod history;
mod mode;
mod view;

pub use controller::{
    export_file_name, ProcessingState, Session, SessionSnapshot, EXPORT_PREFIX,
};
pub use history::{History, HistoryItem, HISTORY_CAPACITY};
pub use mode::{replace_environment_prompt, EditMode, QuickAction};
pub use view::{HistoryEntryView, QuickActionView, SessionView};
