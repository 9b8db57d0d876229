use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    ctrl::facade::ControllerFacade,
    error::CtrlError,
    persist::Store,
    stats::Statistics,
    types::{BoundaryPolicy, EntityRef},
};

use super::events::ModelEvent;

/// Errors surfaced through a [`ModelHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The controller failed; `partial` holds what was done before the failure.
    #[error("{error} (partial: {partial})")]
    Ctrl {
        /// The first error encountered.
        error: CtrlError,
        /// Counts of the steps completed before it.
        partial: Statistics,
    },
    /// The model loop is gone.
    #[error("model loop channel closed")]
    ChannelClosed,
}

/// Queue sizing for [`spawn_model`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Pending commands before senders wait.
    pub command_queue_bound: usize,
    /// Buffered events per subscriber before the oldest are dropped.
    pub event_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_queue_bound: 1024,
        }
    }
}

type Job<S> = Box<dyn FnOnce(&mut ControllerFacade<S>) + Send>;
type StatsReply = oneshot::Sender<Result<Statistics, RuntimeError>>;

enum Command<S: Store> {
    Exec { job: Job<S> },
    Undo { resp: StatsReply },
    Redo { resp: StatsReply },
    DeleteSet {
        ids: Vec<EntityRef>,
        policy: BoundaryPolicy,
        resp: StatsReply,
    },
    Shutdown {
        resp: oneshot::Sender<ControllerFacade<S>>,
    },
}

/// Cloneable handle to a facade owned by one task.
///
/// Commands from all clones are processed strictly in arrival order.
pub struct ModelHandle<S: Store> {
    cmd_tx: mpsc::Sender<Command<S>>,
    events_tx: broadcast::Sender<ModelEvent>,
}

impl<S: Store> Clone for ModelHandle<S> {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

/// Moves `facade` into a tokio task and returns a handle to it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_model<S>(facade: ControllerFacade<S>, config: RuntimeConfig) -> ModelHandle<S>
where
    S: Store + Send + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command<S>>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<ModelEvent>(config.event_queue_bound.max(1));
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut facade = facade;
        while let Some(cmd) = cmd_rx.recv().await {
            if let Some(resp) = handle_command(cmd, &mut facade, &events_tx_loop) {
                let _ = resp.send(facade);
                return;
            }
        }
        log::debug!("model loop ended: all handles dropped");
    });

    ModelHandle { cmd_tx, events_tx }
}

impl<S: Store + Send + 'static> ModelHandle<S> {
    /// Subscribes to model events.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.events_tx.subscribe()
    }

    /// Runs `f` against the facade inside the model loop and returns its result.
    pub async fn exec<R, F>(&self, f: F) -> Result<R, RuntimeError>
    where
        F: FnOnce(&mut ControllerFacade<S>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job<S> = Box::new(move |facade| {
            let _ = tx.send(f(facade));
        });
        self.cmd_tx
            .send(Command::Exec { job })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Undoes one group.
    pub async fn undo(&self) -> Result<Statistics, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Undo { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Redoes one group.
    pub async fn redo(&self) -> Result<Statistics, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Redo { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Deletes a set of entities as one undo group.
    pub async fn delete_set(
        &self,
        ids: Vec<EntityRef>,
        policy: BoundaryPolicy,
    ) -> Result<Statistics, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DeleteSet {
                ids,
                policy,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stops the loop after queued commands and returns the facade.
    pub async fn shutdown(&self) -> Result<ControllerFacade<S>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

/// Runs one command; returns the reply channel when the loop must stop.
fn handle_command<S: Store>(
    cmd: Command<S>,
    facade: &mut ControllerFacade<S>,
    events_tx: &broadcast::Sender<ModelEvent>,
) -> Option<oneshot::Sender<ControllerFacade<S>>> {
    match cmd {
        Command::Exec { job } => {
            let before = facade.journal().revision();
            job(facade);
            let revision = facade.journal().revision();
            if revision != before {
                let _ = events_tx.send(ModelEvent::Changed { revision });
            }
        }
        Command::Undo { resp } => {
            let mut stats = Statistics::new();
            let res = finish(facade.undo(&mut stats), stats);
            if let Ok(stats) = &res {
                let _ = events_tx.send(ModelEvent::UndoApplied { stats: *stats });
            }
            let _ = resp.send(res);
        }
        Command::Redo { resp } => {
            let mut stats = Statistics::new();
            let res = finish(facade.redo(&mut stats), stats);
            if let Ok(stats) = &res {
                let _ = events_tx.send(ModelEvent::RedoApplied { stats: *stats });
            }
            let _ = resp.send(res);
        }
        Command::DeleteSet { ids, policy, resp } => {
            let mut stats = Statistics::new();
            let res = finish(facade.delete_set(&ids, policy, &mut stats), stats);
            if let Ok(stats) = &res {
                let _ = events_tx.send(ModelEvent::SetDeleted { stats: *stats });
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => return Some(resp),
    }
    None
}

fn finish(res: Result<(), CtrlError>, stats: Statistics) -> Result<Statistics, RuntimeError> {
    match res {
        Ok(()) => Ok(stats),
        Err(error) => Err(RuntimeError::Ctrl {
            error,
            partial: stats,
        }),
    }
}
