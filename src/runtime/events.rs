//! Runtime event stream payloads.

use crate::stats::Statistics;

/// Events emitted from the single-writer model loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A command changed the journal (an edit was recorded or history dropped).
    Changed {
        /// Journal revision after the command.
        revision: u64,
    },
    /// One undo step was applied.
    UndoApplied {
        /// Outcome counts of the step.
        stats: Statistics,
    },
    /// One redo step was applied.
    RedoApplied {
        /// Outcome counts of the step.
        stats: Statistics,
    },
    /// A batch delete completed.
    SetDeleted {
        /// Outcome counts of the batch.
        stats: Statistics,
    },
}
