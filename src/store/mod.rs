//! Hierarchical key-value data store abstraction.
//!
//! Records live under slash-separated paths such as `motorcycles/{id}`.
//! Reads are one-shot (`get`) or live (`subscribe`); writes replace a whole
//! value (`set`) or merge fields (`update`, where a `null` field deletes it).
//! Writes are last-writer-wins and no transaction spans multiple paths.

pub mod events;
pub mod memory;
pub mod realtime;
pub mod tree;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub use memory::MemoryStore;
pub use realtime::RealtimeStore;

/// Async key-value interface with push notifications
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    /// One-shot read; `None` when nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Live read. The subscription starts at the current value and then
    /// observes every later change of `path` or anything below it.
    async fn subscribe(&self, path: &str) -> Result<Subscription>;

    /// Replace the whole value at `path`.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Merge `fields` into the value at `path`; `null` fields are removed.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()>;

    /// Remove the value at `path` and everything below it.
    async fn remove(&self, path: &str) -> Result<()>;
}

/// Stream of snapshots for one path.
///
/// Snapshots for a single subscription are delivered in write order;
/// intermediate snapshots may be skipped when the reader is slower than the
/// writers, but the latest one is never lost.
pub struct Subscription {
    path: String,
    receiver: watch::Receiver<Option<Value>>,
    feeder: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(path: impl Into<String>, receiver: watch::Receiver<Option<Value>>) -> Self {
        Self {
            path: path.into(),
            receiver,
            feeder: None,
        }
    }

    /// Attach the background task feeding this subscription; it is aborted on drop.
    pub fn with_feeder(mut self, feeder: JoinHandle<()>) -> Self {
        self.feeder = Some(feeder);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Latest snapshot without waiting
    pub fn current(&mut self) -> Option<Value> {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next snapshot. Returns `None` once the store side is gone.
    pub async fn changed(&mut self) -> Option<Option<Value>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("has_feeder", &self.feeder.is_some())
            .finish()
    }
}
