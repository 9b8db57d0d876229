//! Controller-level error type and the flat code reported to the UI.

use thiserror::Error;

use crate::persist::StoreError;

/// Errors returned by controllers, the journal and the facade.
#[derive(Debug, Error)]
pub enum CtrlError {
    /// Failure reported by the store, propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The request makes no sense in the current state; nothing was changed.
    #[error("invalid request: {}", .0)]
    InvalidRequest(&'static str),
    /// Undo would need history already overwritten by newer entries.
    #[error("undo history exceeded: older entries were overwritten")]
    ArrayBufferExceeded,
    /// The listener is already registered.
    #[error("listener already registered")]
    ListenerDuplicate,
    /// The listener list is full.
    #[error("too many listeners")]
    ListenerOverflow,
    /// The listener was never registered.
    #[error("listener not registered")]
    ListenerUnknown,
}

/// Result alias for controller operations.
pub type CtrlResult<T> = Result<T, CtrlError>;

/// Flat error classification for user-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A referenced row does not exist.
    NotFound,
    /// Stored data is inconsistent.
    DbStructure,
    /// Nothing to undo/redo, or malformed input.
    InvalidRequest,
    /// Undo history was truncated by wraparound.
    ArrayBufferExceeded,
    /// The store failed to apply a write.
    StoreWriteFailed,
    /// Listener registration failed.
    Listener,
}

impl CtrlError {
    /// Classifies this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CtrlError::Store(StoreError::NotFound { .. }) => ErrorCode::NotFound,
            CtrlError::Store(StoreError::DbStructure(_)) => ErrorCode::DbStructure,
            CtrlError::Store(StoreError::WriteFailed(_) | StoreError::LockPoisoned) => {
                ErrorCode::StoreWriteFailed
            }
            CtrlError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            CtrlError::ArrayBufferExceeded => ErrorCode::ArrayBufferExceeded,
            CtrlError::ListenerDuplicate
            | CtrlError::ListenerOverflow
            | CtrlError::ListenerUnknown => ErrorCode::Listener,
        }
    }
}
