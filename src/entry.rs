//! Reversible journal entries.

use serde::{Deserialize, Serialize};

use crate::{entity::EntitySnapshot, types::EntityKind};

/// What a journal entry records: a group boundary or one mutation of one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Delimits two undo groups.
    Boundary,
    /// A row was inserted.
    Create(EntityKind),
    /// A row was modified.
    Update(EntityKind),
    /// A row was removed.
    Delete(EntityKind),
}

impl ActionKind {
    /// Entity kind touched, `None` for a boundary.
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            ActionKind::Boundary => None,
            ActionKind::Create(k) | ActionKind::Update(k) | ActionKind::Delete(k) => Some(k),
        }
    }
}

/// One immutable, independently invertible journal record.
///
/// The variant fixes which snapshots are present: a create carries only the
/// inserted row, a delete only the removed row, an update both sides of the
/// same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// Group delimiter without payload.
    Boundary,
    /// A row was inserted.
    Create {
        /// Row as written, including its assigned id.
        after: EntitySnapshot,
    },
    /// A row was modified.
    Update {
        /// Row before the change.
        before: EntitySnapshot,
        /// Row after the change; same id as `before`.
        after: EntitySnapshot,
    },
    /// A row was removed.
    Delete {
        /// Row before removal.
        before: EntitySnapshot,
    },
}

impl JournalEntry {
    /// Builds an update entry, rejecting pairs that describe different rows.
    pub fn update(before: EntitySnapshot, after: EntitySnapshot) -> Option<Self> {
        if before.kind() != after.kind() || before.id() != after.id() {
            return None;
        }
        Some(Self::Update { before, after })
    }

    /// Action kind, derived from the variant and the snapshot kind.
    pub fn action(&self) -> ActionKind {
        match self {
            JournalEntry::Boundary => ActionKind::Boundary,
            JournalEntry::Create { after } => ActionKind::Create(after.kind()),
            JournalEntry::Update { after, .. } => ActionKind::Update(after.kind()),
            JournalEntry::Delete { before } => ActionKind::Delete(before.kind()),
        }
    }

    /// Pre-mutation snapshot, present for updates and deletes.
    pub fn before(&self) -> Option<&EntitySnapshot> {
        match self {
            JournalEntry::Update { before, .. } | JournalEntry::Delete { before } => Some(before),
            _ => None,
        }
    }

    /// Post-mutation snapshot, present for creates and updates.
    pub fn after(&self) -> Option<&EntitySnapshot> {
        match self {
            JournalEntry::Create { after } | JournalEntry::Update { after, .. } => Some(after),
            _ => None,
        }
    }

    /// True for group delimiters.
    pub fn is_boundary(&self) -> bool {
        matches!(self, JournalEntry::Boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ClassifierRecord, FeatureRecord};
    use crate::types::{ClassifierType, FeatureType};

    fn classifier(id: i64) -> EntitySnapshot {
        let mut rec = ClassifierRecord::new(ClassifierType::Class, "C");
        rec.id = id;
        rec.into()
    }

    #[test]
    fn snapshot_presence_follows_variant() {
        let create = JournalEntry::Create { after: classifier(3) };
        assert_eq!(create.action(), ActionKind::Create(EntityKind::Classifier));
        assert!(create.before().is_none());
        assert_eq!(create.after().map(EntitySnapshot::id), Some(3));

        let delete = JournalEntry::Delete { before: classifier(3) };
        assert!(delete.after().is_none());
        assert_eq!(delete.action().entity_kind(), Some(EntityKind::Classifier));

        assert_eq!(JournalEntry::Boundary.action().entity_kind(), None);
        assert!(JournalEntry::Boundary.before().is_none());
    }

    #[test]
    fn update_requires_same_row() {
        assert!(JournalEntry::update(classifier(1), classifier(2)).is_none());

        let mut feature = FeatureRecord::new(1, FeatureType::Property, "x");
        feature.id = 1;
        assert!(JournalEntry::update(classifier(1), feature.into()).is_none());

        let entry = JournalEntry::update(classifier(1), classifier(1)).expect("same row");
        assert_eq!(entry.action(), ActionKind::Update(EntityKind::Classifier));
    }
}
