//! Notes state: the in-memory collection mirrored from the backend, plus
//! debounced autosave of the note open in the editor.

pub mod autosave;
pub mod store;

pub use autosave::{AutosaveConfig, AutosaveScheduler};
pub use store::{NoteStore, UpdateOutcome};
