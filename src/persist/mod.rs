/// SQLite-backed store implementation.
pub mod sqlite;

use thiserror::Error;

use crate::{
    entity::{DiagramRecord, EntitySnapshot, FieldChange},
    types::{EntityKind, RowId},
};

/// Failures raised by a [`Reader`] or [`Writer`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row id does not resolve in the store.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Table searched.
        kind: EntityKind,
        /// Missing row id.
        id: RowId,
    },
    /// Stored data violates the expected structure.
    #[error("inconsistent database structure: {}", .0)]
    DbStructure(String),
    /// The underlying store operation failed (I/O, constraint violation).
    #[error("store write failed: {}", .0)]
    WriteFailed(#[from] rusqlite::Error),
    /// Another user of the connection panicked while holding it.
    #[error("store connection lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of the store contract.
///
/// Implementations guard their own query state; read-only users such as a
/// search index may call in from other threads.
pub trait Reader {
    /// Current snapshot of row `id` in the `kind` table.
    fn read(&self, kind: EntityKind, id: RowId) -> StoreResult<EntitySnapshot>;

    /// A root diagram (one without parent), lowest id first.
    fn find_root_diagram(&self) -> StoreResult<Option<DiagramRecord>>;
}

/// Write side of the store contract; one call is one durable mutation.
pub trait Writer {
    /// Inserts `snapshot` and returns its row id.
    ///
    /// A snapshot whose id is not [`crate::types::ROW_ID_VOID`] is inserted under
    /// that id, which is how undo and redo restore deleted rows.
    fn create(&self, snapshot: &EntitySnapshot) -> StoreResult<RowId>;

    /// Writes one field of row `id`.
    fn update_field(&self, id: RowId, change: &FieldChange) -> StoreResult<()>;

    /// Rewrites every field of the row identified by `snapshot`.
    fn update_record(&self, snapshot: &EntitySnapshot) -> StoreResult<()>;

    /// Removes row `id` from the `kind` table.
    fn delete(&self, kind: EntityKind, id: RowId) -> StoreResult<()>;
}

/// A complete store: both sides of the contract.
pub trait Store: Reader + Writer {}

impl<T: Reader + Writer + ?Sized> Store for T {}
