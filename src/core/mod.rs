//! In-memory undo/redo history.

/// Bounded ring-buffer journal with undo/redo cursor.
pub mod journal;
