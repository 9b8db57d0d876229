use std::sync::Arc;

use hashbrown::HashSet;
use log::{debug, info, warn};

use crate::{
    core::journal::Journal,
    error::CtrlResult,
    persist::Store,
    stats::{Outcome, Statistics},
    types::{BoundaryPolicy, EntityKind, EntityRef},
};

use super::{
    ControllerConfig,
    classifier::ClassifierController,
    diagram::DiagramController,
    listener::{ListenerRegistry, StoreListener},
};

/// Owner of one open store, its undo/redo journal and its listeners.
///
/// All methods are meant to be called from a single writer; see
/// [`crate::runtime::handle::spawn_model`] for sharing one facade between tasks.
pub struct ControllerFacade<S: Store> {
    store: S,
    journal: Journal,
    listeners: ListenerRegistry,
}

impl<S: Store> ControllerFacade<S> {
    /// Facade over `store` with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, &ControllerConfig::default())
    }

    /// Facade over `store`.
    pub fn with_config(store: S, config: &ControllerConfig) -> Self {
        Self {
            store,
            journal: Journal::with_capacity(config.journal_capacity),
            listeners: ListenerRegistry::new(config.max_listeners),
        }
    }

    /// The open store, for read-only queries.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The undo/redo history.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Controller for classifiers, features and relationships.
    pub fn classifiers(&mut self) -> ClassifierController<'_, S> {
        ClassifierController::new(&self.store, &mut self.journal)
    }

    /// Controller for diagrams and diagram elements.
    pub fn diagrams(&mut self) -> DiagramController<'_, S> {
        DiagramController::new(&self.store, &mut self.journal)
    }

    /// Opens a new undo group; following `Append` edits land in it.
    pub fn begin_group(&mut self) {
        self.journal.begin_group();
    }

    /// Reverts the latest undo group, counting into `stats`.
    pub fn undo(&mut self, stats: &mut Statistics) -> CtrlResult<()> {
        self.journal.undo(&self.store, stats)
    }

    /// Re-applies the oldest undone group, counting into `stats`.
    pub fn redo(&mut self, stats: &mut Statistics) -> CtrlResult<()> {
        self.journal.redo(&self.store, stats)
    }

    /// Deletes every entity in `ids` as one undo group.
    ///
    /// `policy` applies to the first delete, the rest join its group.
    /// Duplicates are ignored. Dependents go before what they reference, so
    /// undo re-creates parents first. The first failure stops the batch;
    /// `stats` then counts the deletes already done plus one error.
    pub fn delete_set(
        &mut self,
        ids: &[EntityRef],
        policy: BoundaryPolicy,
        stats: &mut Statistics,
    ) -> CtrlResult<()> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut ordered: Vec<EntityRef> = ids.iter().copied().filter(|r| seen.insert(*r)).collect();
        ordered.sort_by_key(|r| delete_rank(r.kind));

        let mut policy = policy;
        for target in ordered {
            let res = match target.kind {
                EntityKind::Classifier => self.classifiers().delete_classifier(target.id, policy),
                EntityKind::Feature => self.classifiers().delete_feature(target.id, policy),
                EntityKind::Relationship => self.classifiers().delete_relationship(target.id, policy),
                EntityKind::Diagram => self.diagrams().delete_diagram(target.id, policy),
                EntityKind::DiagramElement => self.diagrams().delete_diagramelement(target.id, policy),
            };
            match res {
                Ok(()) => stats.inc(target.kind, Outcome::Deleted),
                Err(err) => {
                    stats.inc(target.kind, Outcome::Error);
                    warn!("delete_set stopped at {} {}: {err}", target.kind, target.id);
                    return Err(err);
                }
            }
            policy = BoundaryPolicy::Append;
        }
        debug!("delete_set done: {stats}");
        Ok(())
    }

    /// Registers a store listener.
    pub fn add_listener(&mut self, listener: Arc<dyn StoreListener>) -> CtrlResult<()> {
        self.listeners.add(listener)
    }

    /// Unregisters a store listener.
    pub fn remove_listener(&mut self, listener: &Arc<dyn StoreListener>) -> CtrlResult<()> {
        self.listeners.remove(listener)
    }

    /// Replaces the open store, dropping all history, and returns the old one.
    pub fn switch_store(&mut self, store: S) -> S {
        info!("switching store, dropping {} journal entries", self.journal.len());
        self.listeners.notify_closing();
        self.journal.clear();
        let old = std::mem::replace(&mut self.store, store);
        self.listeners.notify_opened();
        old
    }

    /// Closes the facade and hands the store back.
    pub fn close(self) -> S {
        info!("closing store");
        self.listeners.notify_closing();
        self.store
    }
}

fn delete_rank(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Relationship => 0,
        EntityKind::Feature => 1,
        EntityKind::DiagramElement => 2,
        EntityKind::Classifier => 3,
        EntityKind::Diagram => 4,
    }
}
