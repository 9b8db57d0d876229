//! Journaled editing of a diagram model stored in SQLite, with grouped undo/redo.
//!
//! # Examples
//!
//! Direct usage with [`ctrl::facade::ControllerFacade`]:
//! ```
//! use modelctl::{
//!     ctrl::facade::ControllerFacade,
//!     entity::ClassifierRecord,
//!     persist::sqlite::SqliteStore,
//!     stats::{Outcome, Statistics},
//!     types::{BoundaryPolicy, ClassifierType, EntityKind},
//! };
//!
//! let store = SqliteStore::open_in_memory().expect("open store");
//! let mut facade = ControllerFacade::new(store);
//! let id = facade
//!     .classifiers()
//!     .create_classifier(ClassifierRecord::new(ClassifierType::Class, "Order"), BoundaryPolicy::StartNew)
//!     .expect("create");
//! facade.classifiers().update_classifier_stereotype(id, "entity").expect("update");
//!
//! let mut stats = Statistics::new();
//! facade.undo(&mut stats).expect("undo");
//! assert_eq!(stats.count(EntityKind::Classifier, Outcome::Deleted), 1);
//! assert_eq!(stats.count(EntityKind::Classifier, Outcome::Modified), 1);
//! ```
//!
//! Runtime usage with a single-writer task:
//! ```no_run
//! use modelctl::{
//!     ctrl::facade::ControllerFacade,
//!     entity::ClassifierRecord,
//!     persist::sqlite::SqliteStore,
//!     runtime::handle::{spawn_model, RuntimeConfig},
//!     types::{BoundaryPolicy, ClassifierType},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteStore::open("model.db").expect("open sqlite");
//! let handle = spawn_model(ControllerFacade::new(store), RuntimeConfig::default());
//! let _id = handle
//!     .exec(|f| {
//!         f.classifiers()
//!             .create_classifier(ClassifierRecord::new(ClassifierType::Block, "Pump"), BoundaryPolicy::StartNew)
//!     })
//!     .await
//!     .expect("loop alive")
//!     .expect("create");
//! handle.undo().await.expect("undo");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Undo/redo journal.
pub mod core;
/// Entity controllers and the controller facade.
pub mod ctrl;
/// Entity records, snapshots and single-field changes.
pub mod entity;
/// Journal entry model.
pub mod entry;
/// Controller error type.
pub mod error;
/// Store contract and SQLite implementation.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Undo/redo and batch-delete outcome counters.
pub mod stats;
/// Shared primitive types and enums.
pub mod types;
