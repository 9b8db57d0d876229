use std::sync::Arc;

use log::trace;

use crate::error::{CtrlError, CtrlResult};

/// Default size of the listener list.
pub const DEFAULT_MAX_LISTENERS: usize = 16;

/// Observer notified when the facade's store is swapped or closed.
pub trait StoreListener: Send + Sync {
    /// The current store is about to go away; its ids become meaningless.
    fn on_store_closing(&self);
    /// A new store is in place.
    fn on_store_opened(&self);
}

/// Bounded list of store listeners, compared by identity.
pub struct ListenerRegistry {
    listeners: Vec<Arc<dyn StoreListener>>,
    max: usize,
}

impl ListenerRegistry {
    /// Empty registry holding at most `max` listeners.
    pub fn new(max: usize) -> Self {
        Self {
            listeners: Vec::new(),
            max,
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True when nobody listens.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Registers `listener`.
    pub fn add(&mut self, listener: Arc<dyn StoreListener>) -> CtrlResult<()> {
        if self.position(&listener).is_some() {
            return Err(CtrlError::ListenerDuplicate);
        }
        if self.listeners.len() >= self.max {
            return Err(CtrlError::ListenerOverflow);
        }
        self.listeners.push(listener);
        trace!("listener added, {} registered", self.listeners.len());
        Ok(())
    }

    /// Unregisters `listener`.
    pub fn remove(&mut self, listener: &Arc<dyn StoreListener>) -> CtrlResult<()> {
        let idx = self.position(listener).ok_or(CtrlError::ListenerUnknown)?;
        self.listeners.remove(idx);
        Ok(())
    }

    pub(crate) fn notify_closing(&self) {
        for l in &self.listeners {
            l.on_store_closing();
        }
    }

    pub(crate) fn notify_opened(&self) {
        for l in &self.listeners {
            l.on_store_opened();
        }
    }

    fn position(&self, listener: &Arc<dyn StoreListener>) -> Option<usize> {
        let wanted = Arc::as_ptr(listener) as *const ();
        self.listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == wanted)
    }
}
