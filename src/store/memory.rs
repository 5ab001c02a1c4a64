use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use super::tree::{self, segments};
use super::{DataStore, Subscription};
use crate::{FleetError, Result};

struct Watcher {
    segments: Vec<String>,
    sender: watch::Sender<Option<Value>>,
}

#[derive(Default)]
struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
}

/// In-process data store.
///
/// Optionally mirrors the whole tree into a JSON file after every write, which
/// makes it usable as a small local database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    backing_file: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an initial tree, e.g. `{"motorcycles": {...}}`.
    pub fn with_data(root: Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root,
                watchers: Vec::new(),
            })),
            backing_file: None,
        }
    }

    /// Open a file-backed store, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let root = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Value::Null,
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No local database yet, starting empty");
                Value::Null
            }
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), "Opened local database");

        let mut store = Self::with_data(root);
        store.backing_file = Some(path);
        Ok(store)
    }

    /// Copy of the whole tree
    pub async fn dump(&self) -> Value {
        self.inner.lock().await.root.clone()
    }

    async fn write<F>(&self, path: &str, operation: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Value, &[&str]),
    {
        let segs = segments(path);
        let mut inner = self.inner.lock().await;
        let mut next = inner.root.clone();
        mutate(&mut next, &segs);

        // Persist first so a failed write leaves memory and subscribers untouched.
        if let Some(file) = &self.backing_file {
            persist(file, &next)
                .await
                .map_err(|e| FleetError::persistence(format!("{operation} {path}"), e))?;
        }
        inner.root = next;

        let Inner { root, watchers } = &mut *inner;
        watchers.retain(|w| !w.sender.is_closed());
        for watcher in watchers.iter() {
            if !tree::overlaps(&watcher.segments, &segs) {
                continue;
            }
            let watched: Vec<&str> = watcher.segments.iter().map(String::as_str).collect();
            let snapshot = tree::snapshot(root, &watched);
            watcher.sender.send_if_modified(|current| {
                if *current == snapshot {
                    false
                } else {
                    *current = snapshot;
                    true
                }
            });
        }
        debug!(path = %path, operation = %operation, "Store write applied");
        Ok(())
    }
}

async fn persist(file: &Path, root: &Value) -> std::io::Result<()> {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(root)?;
    tokio::fs::write(file, bytes).await
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let inner = self.inner.lock().await;
        Ok(tree::snapshot(&inner.root, &segments(path)))
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        let mut inner = self.inner.lock().await;
        let segs = segments(path);
        let (sender, receiver) = watch::channel(tree::snapshot(&inner.root, &segs));
        inner.watchers.push(Watcher {
            segments: segs.iter().map(|s| s.to_string()).collect(),
            sender,
        });
        Ok(Subscription::new(path, receiver))
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.write(path, "set", |root, segs| tree::set_at(root, segs, value))
            .await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        self.write(path, "update", |root, segs| tree::update_at(root, segs, fields))
            .await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.write(path, "remove", |root, segs| {
            tree::set_at(root, segs, Value::Null)
        })
        .await
    }
}
