//! Question answering against the note collection: rebuild the backend's
//! index, then query it.

pub mod coordinator;

pub use coordinator::{AskOrdering, AskPhase, AskSession, QueryCoordinator};
