//! Entity controllers and the facade that owns the store and the journal.

/// Classifier, feature and relationship operations.
pub mod classifier;
/// Diagram and diagram element operations.
pub mod diagram;
/// Facade: undo/redo, batch delete, store switching.
pub mod facade;
/// Store open/close observers.
pub mod listener;

use log::trace;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    core::journal::{DEFAULT_JOURNAL_CAPACITY, Journal},
    entity::{EntitySnapshot, FieldChange},
    entry::JournalEntry,
    error::{CtrlError, CtrlResult},
    persist::{Store, StoreError},
    types::{BoundaryPolicy, EntityKind, ROW_ID_VOID, RowId},
};

/// Facade tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Journal slots, boundaries included.
    pub journal_capacity: usize,
    /// Maximum number of registered store listeners.
    pub max_listeners: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            max_listeners: listener::DEFAULT_MAX_LISTENERS,
        }
    }
}

fn create_entity<S: Store + ?Sized>(
    store: &S,
    journal: &mut Journal,
    mut snapshot: EntitySnapshot,
    policy: BoundaryPolicy,
) -> CtrlResult<RowId> {
    if snapshot.id() != ROW_ID_VOID {
        return Err(CtrlError::InvalidRequest("new record already carries a row id"));
    }
    if snapshot.uuid().is_empty() {
        *snapshot.uuid_mut() = Uuid::new_v4().to_string();
    }

    let id = store.create(&snapshot)?;
    snapshot.set_id(id);
    trace!("created {} {id}", snapshot.kind());
    journal.append(JournalEntry::Create { after: snapshot }, policy);
    Ok(id)
}

fn update_entity<S: Store + ?Sized>(
    store: &S,
    journal: &mut Journal,
    id: RowId,
    change: FieldChange,
) -> CtrlResult<()> {
    let kind = change.kind();
    let before = store.read(kind, id)?;
    if before.kind() != kind {
        return Err(StoreError::DbStructure(format!("{kind} {id} read back as {}", before.kind())).into());
    }

    store.update_field(id, &change)?;

    let mut after = before.clone();
    change.apply_to(&mut after);
    let entry = JournalEntry::update(before, after)
        .ok_or_else(|| StoreError::DbStructure(format!("{kind} {id} changed identity")))?;
    trace!("updated {kind} {id}: {change:?}");
    journal.append(entry, BoundaryPolicy::Append);
    Ok(())
}

fn delete_entity<S: Store + ?Sized>(
    store: &S,
    journal: &mut Journal,
    kind: EntityKind,
    id: RowId,
    policy: BoundaryPolicy,
) -> CtrlResult<()> {
    let before = store.read(kind, id)?;
    store.delete(kind, id)?;
    trace!("deleted {kind} {id}");
    journal.append(JournalEntry::Delete { before }, policy);
    Ok(())
}
