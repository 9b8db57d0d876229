//! Bounded undo/redo journal.
//!
//! Entries live in a fixed ring of slots. Every entry gets a position that
//! only grows between two [`Journal::clear`] calls; the slot for position `p`
//! is `p % capacity`, and the slot remembers `p` as its generation. A slot
//! whose generation differs from the requested position has been reused by
//! a newer entry, so reading it would cross evicted history.

use log::{debug, trace, warn};

use crate::{
    entity::EntitySnapshot,
    entry::JournalEntry,
    error::{CtrlError, CtrlResult},
    persist::{StoreError, StoreResult, Writer},
    stats::{Outcome, Statistics},
    types::{BoundaryPolicy, EntityKind},
};

/// Journal capacity used by [`Journal::new`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 512;

#[derive(Debug)]
struct Slot {
    generation: u64,
    entry: JournalEntry,
}

/// Range of positions one undo or redo step will process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    first: u64,
    last: u64,
    cursor_after: u64,
}

/// Fixed-capacity undo/redo history with a done/undone cursor.
#[derive(Debug)]
pub struct Journal {
    slots: Vec<Option<Slot>>,
    begin: u64,
    end: u64,
    cursor: u64,
    revision: u64,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    /// Journal with [`DEFAULT_JOURNAL_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// Journal with `capacity` slots; zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            begin: 0,
            end: 0,
            cursor: 0,
            revision: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of retained entries, boundaries included.
    pub fn len(&self) -> usize {
        (self.end - self.begin) as usize
    }

    /// True when no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.end == self.begin
    }

    /// Index of the first undone entry among the retained ones.
    pub fn cursor(&self) -> usize {
        (self.cursor - self.begin) as usize
    }

    /// Counter bumped by every append, undo, redo and clear.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True once wraparound has overwritten at least one entry.
    pub fn is_truncated(&self) -> bool {
        self.begin > 0
    }

    /// True when [`Journal::undo`] would find a group to revert.
    pub fn can_undo(&self) -> bool {
        self.plan_undo().is_ok()
    }

    /// True when [`Journal::redo`] would find a group to re-apply.
    pub fn can_redo(&self) -> bool {
        self.plan_redo().is_ok()
    }

    /// Retained entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &JournalEntry> + '_ {
        (self.begin..self.end).filter_map(move |pos| self.entry_at(pos))
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.begin = 0;
        self.end = 0;
        self.cursor = 0;
        self.revision += 1;
        debug!("journal cleared");
    }

    /// Records `entry`, opening a new undo group first when `policy` asks for it.
    ///
    /// Undone entries are discarded: after a new edit there is nothing left to redo.
    pub fn append(&mut self, entry: JournalEntry, policy: BoundaryPolicy) {
        if policy == BoundaryPolicy::StartNew {
            self.push(JournalEntry::Boundary);
        }
        self.push(entry);
    }

    /// Opens a new undo group without recording a change yet.
    pub fn begin_group(&mut self) {
        self.push(JournalEntry::Boundary);
    }

    /// Reverts the most recent done group, newest entry first.
    ///
    /// Validation failures ([`CtrlError::InvalidRequest`],
    /// [`CtrlError::ArrayBufferExceeded`]) change nothing. A store failure
    /// stops processing; the cursor then sits just past the last reverted
    /// entry and `stats` holds what was done.
    pub fn undo<W: Writer + ?Sized>(&mut self, writer: &W, stats: &mut Statistics) -> CtrlResult<()> {
        let plan = self.plan_undo()?;
        let mut reached = self.cursor;
        let mut failure = None;

        for pos in (plan.first..plan.last).rev() {
            let Some(entry) = self.entry_at(pos) else {
                failure = Some(CtrlError::ArrayBufferExceeded);
                break;
            };
            match revert(entry, writer, stats) {
                Ok(()) => reached = pos,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        match failure {
            None => {
                self.cursor = plan.cursor_after;
                self.revision += 1;
                debug!("undo applied: {stats}");
                Ok(())
            }
            Some(err) => {
                self.cursor = reached;
                self.revision += 1;
                warn!("undo stopped after partial progress {stats}: {err}");
                Err(err)
            }
        }
    }

    /// Re-applies the oldest undone group, oldest entry first.
    ///
    /// The cursor ends past the group and past the boundary that follows it,
    /// if any. Failure handling mirrors [`Journal::undo`].
    pub fn redo<W: Writer + ?Sized>(&mut self, writer: &W, stats: &mut Statistics) -> CtrlResult<()> {
        let plan = self.plan_redo()?;
        let mut reached = self.cursor;
        let mut failure = None;

        for pos in plan.first..plan.last {
            let Some(entry) = self.entry_at(pos) else {
                failure = Some(CtrlError::ArrayBufferExceeded);
                break;
            };
            match reapply(entry, writer, stats) {
                Ok(()) => reached = pos + 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        match failure {
            None => {
                self.cursor = plan.cursor_after;
                self.revision += 1;
                debug!("redo applied: {stats}");
                Ok(())
            }
            Some(err) => {
                self.cursor = reached;
                self.revision += 1;
                warn!("redo stopped after partial progress {stats}: {err}");
                Err(err)
            }
        }
    }

    fn push(&mut self, entry: JournalEntry) {
        if self.end > self.cursor {
            trace!("journal: discarding {} undone entries", self.end - self.cursor);
            self.end = self.cursor;
        }

        let pos = self.end;
        let idx = self.slot_index(pos);
        self.slots[idx] = Some(Slot {
            generation: pos,
            entry,
        });
        self.end += 1;
        self.cursor = self.end;
        self.revision += 1;

        let capacity = self.slots.len() as u64;
        if self.end - self.begin > capacity {
            self.begin = self.end - capacity;
            trace!("journal: evicted position {}", self.begin - 1);
        }
    }

    fn slot_index(&self, pos: u64) -> usize {
        (pos % self.slots.len() as u64) as usize
    }

    fn entry_at(&self, pos: u64) -> Option<&JournalEntry> {
        if pos >= self.end {
            return None;
        }
        match &self.slots[self.slot_index(pos)] {
            Some(slot) if slot.generation == pos => Some(&slot.entry),
            _ => None,
        }
    }

    fn plan_undo(&self) -> CtrlResult<StepPlan> {
        if self.cursor == 0 {
            return Err(CtrlError::InvalidRequest("nothing to undo"));
        }

        // Boundaries right before the cursor delimit empty groups.
        let mut pos = self.cursor;
        loop {
            if pos == 0 {
                return Err(CtrlError::InvalidRequest("nothing to undo"));
            }
            let entry = self.entry_at(pos - 1).ok_or(CtrlError::ArrayBufferExceeded)?;
            if !entry.is_boundary() {
                break;
            }
            pos -= 1;
        }
        let last = pos;

        while pos > 0 {
            let entry = self.entry_at(pos - 1).ok_or(CtrlError::ArrayBufferExceeded)?;
            if entry.is_boundary() {
                break;
            }
            pos -= 1;
        }
        let first = pos;

        Ok(StepPlan {
            first,
            last,
            cursor_after: first.saturating_sub(1),
        })
    }

    fn plan_redo(&self) -> CtrlResult<StepPlan> {
        let is_boundary = |pos: u64| self.entry_at(pos).is_none_or(JournalEntry::is_boundary);

        let mut pos = self.cursor;
        while pos < self.end && is_boundary(pos) {
            pos += 1;
        }
        if pos == self.end {
            return Err(CtrlError::InvalidRequest("nothing to redo"));
        }
        let first = pos;

        while pos < self.end && !is_boundary(pos) {
            pos += 1;
        }
        let last = pos;

        // The following boundary is consumed with the group.
        if self.entry_at(pos).is_some_and(JournalEntry::is_boundary) {
            pos += 1;
        }

        Ok(StepPlan {
            first,
            last,
            cursor_after: pos,
        })
    }
}

fn revert<W: Writer + ?Sized>(entry: &JournalEntry, writer: &W, stats: &mut Statistics) -> CtrlResult<()> {
    match entry {
        JournalEntry::Boundary => Ok(()),
        JournalEntry::Create { after } => count(
            writer.delete(after.kind(), after.id()),
            after.kind(),
            Outcome::Deleted,
            stats,
        ),
        JournalEntry::Update { before, .. } => count(
            writer.update_record(before),
            before.kind(),
            Outcome::Modified,
            stats,
        ),
        JournalEntry::Delete { before } => count(
            recreate(writer, before),
            before.kind(),
            Outcome::Created,
            stats,
        ),
    }
}

fn reapply<W: Writer + ?Sized>(entry: &JournalEntry, writer: &W, stats: &mut Statistics) -> CtrlResult<()> {
    match entry {
        JournalEntry::Boundary => Ok(()),
        JournalEntry::Create { after } => {
            count(recreate(writer, after), after.kind(), Outcome::Created, stats)
        }
        JournalEntry::Update { after, .. } => count(
            writer.update_record(after),
            after.kind(),
            Outcome::Modified,
            stats,
        ),
        JournalEntry::Delete { before } => count(
            writer.delete(before.kind(), before.id()),
            before.kind(),
            Outcome::Deleted,
            stats,
        ),
    }
}

/// Re-inserts a row under its original id; later entries refer to that id.
fn recreate<W: Writer + ?Sized>(writer: &W, snapshot: &EntitySnapshot) -> StoreResult<()> {
    let id = writer.create(snapshot)?;
    if id != snapshot.id() {
        return Err(StoreError::DbStructure(format!(
            "{} {} re-created as {id}",
            snapshot.kind(),
            snapshot.id()
        )));
    }
    Ok(())
}

fn count(
    result: StoreResult<()>,
    kind: EntityKind,
    outcome: Outcome,
    stats: &mut Statistics,
) -> CtrlResult<()> {
    match result {
        Ok(()) => {
            stats.inc(kind, outcome);
            Ok(())
        }
        Err(err) => {
            stats.inc(kind, Outcome::Error);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        entity::{ClassifierRecord, FieldChange},
        types::{ClassifierType, RowId},
    };

    /// Records write calls; fails the call numbered `fail_at` (0-based).
    #[derive(Default)]
    struct RecordingWriter {
        calls: RefCell<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl RecordingWriter {
        fn log(&self, call: String) -> StoreResult<()> {
            let mut calls = self.calls.borrow_mut();
            if self.fail_at == Some(calls.len()) {
                return Err(StoreError::DbStructure("injected".into()));
            }
            calls.push(call);
            Ok(())
        }
    }

    impl Writer for RecordingWriter {
        fn create(&self, snapshot: &EntitySnapshot) -> StoreResult<RowId> {
            self.log(format!("create {}", snapshot.id()))?;
            Ok(snapshot.id())
        }

        fn update_field(&self, id: RowId, _change: &FieldChange) -> StoreResult<()> {
            self.log(format!("field {id}"))
        }

        fn update_record(&self, snapshot: &EntitySnapshot) -> StoreResult<()> {
            self.log(format!("update {}", snapshot.id()))
        }

        fn delete(&self, _kind: EntityKind, id: RowId) -> StoreResult<()> {
            self.log(format!("delete {id}"))
        }
    }

    fn classifier(id: RowId) -> EntitySnapshot {
        let mut rec = ClassifierRecord::new(ClassifierType::Class, format!("C{id}"));
        rec.id = id;
        rec.into()
    }

    fn create(id: RowId) -> JournalEntry {
        JournalEntry::Create { after: classifier(id) }
    }

    #[test]
    fn undo_and_redo_walk_whole_groups() {
        let mut journal = Journal::with_capacity(16);
        journal.append(create(1), BoundaryPolicy::StartNew);
        journal.append(create(2), BoundaryPolicy::StartNew);
        journal.append(create(3), BoundaryPolicy::Append);

        let writer = RecordingWriter::default();
        let mut stats = Statistics::new();
        journal.undo(&writer, &mut stats).expect("undo");
        assert_eq!(*writer.calls.borrow(), ["delete 3", "delete 2"]);
        assert_eq!(stats.count(EntityKind::Classifier, Outcome::Deleted), 2);
        assert_eq!(journal.cursor(), 2);

        let mut stats = Statistics::new();
        journal.redo(&writer, &mut stats).expect("redo");
        assert_eq!(
            writer.calls.borrow()[2..],
            ["create 2".to_string(), "create 3".to_string()]
        );
        assert_eq!(stats.count(EntityKind::Classifier, Outcome::Created), 2);
        assert_eq!(journal.cursor(), journal.len());
        assert!(!journal.can_redo());
    }

    #[test]
    fn redo_consumes_the_following_boundary() {
        let mut journal = Journal::with_capacity(16);
        journal.append(create(1), BoundaryPolicy::StartNew);
        journal.append(create(2), BoundaryPolicy::StartNew);

        let writer = RecordingWriter::default();
        journal.undo(&writer, &mut Statistics::new()).expect("undo 2");
        journal.undo(&writer, &mut Statistics::new()).expect("undo 1");
        journal.redo(&writer, &mut Statistics::new()).expect("redo 1");
        assert_eq!(journal.cursor(), 3);
        assert!(journal.can_redo());

        journal.append(create(9), BoundaryPolicy::Append);
        assert!(!journal.can_redo());

        let mut stats = Statistics::new();
        journal.undo(&writer, &mut stats).expect("undo appended edit");
        assert_eq!(stats.count(EntityKind::Classifier, Outcome::Deleted), 1);
        assert_eq!(writer.calls.borrow().last().map(String::as_str), Some("delete 9"));
        assert_eq!(journal.cursor(), 2);
    }

    #[test]
    fn empty_history_is_an_invalid_request() {
        let mut journal = Journal::new();
        let writer = RecordingWriter::default();
        let mut stats = Statistics::new();
        assert!(matches!(
            journal.undo(&writer, &mut stats),
            Err(CtrlError::InvalidRequest(_))
        ));
        assert!(matches!(
            journal.redo(&writer, &mut stats),
            Err(CtrlError::InvalidRequest(_))
        ));

        journal.begin_group();
        assert!(!journal.can_undo());
        assert!(stats.is_empty());
    }

    #[test]
    fn trailing_empty_group_is_skipped() {
        let mut journal = Journal::new();
        journal.append(create(1), BoundaryPolicy::StartNew);
        journal.begin_group();

        let writer = RecordingWriter::default();
        let mut stats = Statistics::new();
        journal.undo(&writer, &mut stats).expect("undo");
        assert_eq!(*writer.calls.borrow(), ["delete 1"]);
        assert_eq!(journal.cursor(), 0);
    }

    #[test]
    fn wraparound_forecloses_undo_without_side_effects() {
        let mut journal = Journal::with_capacity(4);
        journal.append(create(1), BoundaryPolicy::StartNew);
        journal.append(create(2), BoundaryPolicy::StartNew);
        journal.append(create(3), BoundaryPolicy::StartNew);
        assert!(journal.is_truncated());
        assert_eq!(journal.len(), 4);

        let writer = RecordingWriter::default();
        let mut stats = Statistics::new();
        journal.undo(&writer, &mut stats).expect("newest group is intact");
        journal.undo(&writer, &mut stats).expect("second group is intact");
        let cursor = journal.cursor();

        // Group 1 has been overwritten entirely.
        let mut stats = Statistics::new();
        assert!(matches!(
            journal.undo(&writer, &mut stats),
            Err(CtrlError::ArrayBufferExceeded)
        ));
        assert_eq!(journal.cursor(), cursor);
        assert!(stats.is_empty());
        assert_eq!(writer.calls.borrow().len(), 2);
    }

    #[test]
    fn append_after_undo_discards_redo_tail() {
        let mut journal = Journal::new();
        journal.append(create(1), BoundaryPolicy::StartNew);
        journal.append(create(2), BoundaryPolicy::StartNew);

        let writer = RecordingWriter::default();
        journal.undo(&writer, &mut Statistics::new()).expect("undo");
        assert!(journal.can_redo());

        journal.append(create(4), BoundaryPolicy::StartNew);
        assert!(!journal.can_redo());
        assert_eq!(journal.len(), 4);
        assert_eq!(journal.iter().filter(|e| !e.is_boundary()).count(), 2);
    }

    #[test]
    fn store_failure_leaves_cursor_after_last_success() {
        let mut journal = Journal::new();
        journal.append(create(1), BoundaryPolicy::StartNew);
        journal.append(create(2), BoundaryPolicy::Append);
        journal.append(create(3), BoundaryPolicy::Append);

        let writer = RecordingWriter {
            fail_at: Some(1),
            ..RecordingWriter::default()
        };
        let mut stats = Statistics::new();
        let err = journal.undo(&writer, &mut stats).expect_err("second write fails");
        assert!(matches!(err, CtrlError::Store(StoreError::DbStructure(_))));
        assert_eq!(stats.count(EntityKind::Classifier, Outcome::Deleted), 1);
        assert_eq!(stats.count(EntityKind::Classifier, Outcome::Error), 1);
        assert_eq!(journal.cursor(), 3);

        let writer = RecordingWriter::default();
        let mut stats = Statistics::new();
        journal.undo(&writer, &mut stats).expect("remaining entries");
        assert_eq!(*writer.calls.borrow(), ["delete 2", "delete 1"]);
        assert_eq!(journal.cursor(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut journal = Journal::with_capacity(2);
        for id in 0..5 {
            journal.append(create(id), BoundaryPolicy::StartNew);
        }
        journal.clear();
        assert!(journal.is_empty());
        assert!(!journal.is_truncated());
        assert_eq!(journal.iter().count(), 0);
        assert!(!journal.can_undo());
    }
}
