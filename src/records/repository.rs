use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use crate::models::Record;
use crate::store::{DataStore, Subscription};
use crate::{FleetError, Result};

/// Typed access to record collections in a [`DataStore`].
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DataStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    pub async fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        match self.store.get(&T::KIND.path(id)).await? {
            Some(value) => Ok(Some(T::from_value(id, value)?)),
            None => Ok(None),
        }
    }

    pub async fn require<T: Record>(&self, id: &str) -> Result<T> {
        self.get(id).await?.ok_or_else(|| FleetError::NotFound {
            kind: T::KIND.label(),
            id: id.to_string(),
        })
    }

    pub async fn list<T: Record>(&self) -> Result<Vec<T>> {
        let snapshot = self.store.get(T::KIND.collection()).await?;
        Ok(decode_collection(snapshot))
    }

    pub async fn subscribe<T: Record>(&self) -> Result<RecordFeed<T>> {
        let subscription = self.store.subscribe(T::KIND.collection()).await?;
        Ok(RecordFeed::new(subscription))
    }

    pub async fn set<T: Record>(&self, record: &T) -> Result<()> {
        let path = T::KIND.path(record.id());
        self.store
            .set(&path, record.to_value()?)
            .await
            .map_err(|e| into_persistence(e, "set", &path))
    }

    pub async fn update<T: Record>(&self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let path = T::KIND.path(id);
        self.store
            .update(&path, fields)
            .await
            .map_err(|e| into_persistence(e, "update", &path))
    }

    pub async fn remove<T: Record>(&self, id: &str) -> Result<()> {
        let path = T::KIND.path(id);
        self.store
            .remove(&path)
            .await
            .map_err(|e| into_persistence(e, "remove", &path))
    }
}

fn into_persistence(err: FleetError, operation: &str, path: &str) -> FleetError {
    match err {
        FleetError::Persistence { .. } => err,
        other => FleetError::persistence(format!("{operation} {path}"), other),
    }
}

/// Decode a collection snapshot; malformed entries are logged and skipped.
///
/// Records come back ordered by key, which for timestamp ids is creation order.
pub fn decode_collection<T: Record>(snapshot: Option<Value>) -> Vec<T> {
    let entries: Vec<(String, Value)> = match snapshot {
        Some(Value::Object(map)) => map.into_iter().collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|(id, value)| match T::from_value(&id, value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind = T::KIND.label(), id = %id, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// Live, typed view of one collection.
pub struct RecordFeed<T> {
    subscription: Subscription,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordFeed<T> {
    pub fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            _record: PhantomData,
        }
    }

    pub fn current(&mut self) -> Vec<T> {
        decode_collection(self.subscription.current())
    }

    /// Wait for the next change; `None` once the store stops publishing.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        let snapshot = self.subscription.changed().await?;
        Some(decode_collection(snapshot))
    }
}
