//! Key-value storage contract and the typed adapter the service reads and writes through.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::debug;

/// Durable mapping from string key to a JSON value.
///
/// Every write replaces the whole value under its key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
    /// Returns `true` if a value was removed.
    async fn remove(&self, key: &str) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
}

/// Typed access to a [`KeyValueStore`] that may not be ready yet.
///
/// Until [`Storage::init`] runs, reads resolve to `None` and writes are dropped.
pub struct Storage {
    backend: OnceLock<Arc<dyn KeyValueStore>>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl Storage {
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            backend: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let storage = Self::uninitialized();
        storage.init(store);
        storage
    }

    /// Attach the backing store. Returns `false` if one was already attached.
    pub fn init(&self, store: Arc<dyn KeyValueStore>) -> bool {
        self.backend.set(store).is_ok()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(store) = self.backend.get() else {
            debug!(key, "storage not ready, treating read as absent");
            return Ok(None);
        };
        match store.get(key).await? {
            Some(value) => {
                let decoded = serde_json::from_value(value)
                    .with_context(|| format!("Stored value for '{key}' has an unexpected shape"))?;
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let Some(store) = self.backend.get() else {
            debug!(key, "storage not ready, dropping write");
            return Ok(());
        };
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize value for '{key}'"))?;
        store.set(key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        match self.backend.get() {
            Some(store) => store.remove(key).await,
            None => Ok(false),
        }
    }

    pub async fn clear(&self) -> Result<()> {
        match self.backend.get() {
            Some(store) => store.clear().await,
            None => Ok(()),
        }
    }
}

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    fn with_data(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    async fn len(&self) -> usize {
        self.data.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.data.write().await.clear();
        Ok(())
    }
}
