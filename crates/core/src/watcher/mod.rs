//! Watcher module - the check-price consumer and the reconcile step it shares
//! with the periodic sweep.

mod keyed_lock;
mod reconciler;
mod watcher_config;
mod watcher_service;


pub use keyed_lock::KeyedLocks;
pub use reconciler::{PriceReconciler, ReconcileOutcome};
pub use watcher_config::{AlertPolicy, PollBackoff, WatcherConfig};
pub use watcher_service::{spawn_watcher, TaskOutcome, Watcher};
