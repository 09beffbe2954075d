//! In-memory cache store backend
//!
//! Entries are keyed by request URL, matching the host cache API's lookup
//! semantics. A store handle obtained before its store is deleted stays
//! usable but orphaned; the registry simply stops reporting it.

use crate::error::AppshellResult;
use crate::http::{Request, Response};
use crate::store::{CacheStorage, CacheStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A stored response plus write-time metadata
#[derive(Debug, Clone)]
struct StoredEntry {
    response: Response,
    stored_at: DateTime<Utc>,
}

/// In-memory registry of named stores
#[derive(Default)]
pub struct MemoryStorage {
    stores: RwLock<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryStorage {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a store with this name currently exists
    pub async fn contains(&self, name: &str) -> bool {
        self.stores.read().await.contains_key(name)
    }

    /// Number of entries in the named store, if it exists
    pub async fn store_len(&self, name: &str) -> Option<usize> {
        let store = self.stores.read().await.get(name).cloned()?;
        Some(store.len().await)
    }

    /// When the entry for a URL was written in the named store, if present
    pub async fn stored_at(&self, name: &str, url: &str) -> Option<DateTime<Utc>> {
        let store = self.stores.read().await.get(name).cloned()?;
        store.stored_at(url).await
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> AppshellResult<Arc<dyn CacheStore>> {
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Creating cache store: {}", name);
                Arc::new(MemoryStore::new(name))
            })
            .clone();
        Ok(store)
    }

    async fn keys(&self) -> AppshellResult<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> AppshellResult<bool> {
        let existed = self.stores.write().await.remove(name).is_some();
        if existed {
            debug!("Deleted cache store: {}", name);
        }
        Ok(existed)
    }
}

/// One named in-memory store
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// When the entry for a URL was written, if present
    pub async fn stored_at(&self, url: &str) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(url).map(|e| e.stored_at)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn matching(&self, request: &Request) -> AppshellResult<Option<Response>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&request.url).map(|e| e.response.clone()))
    }

    async fn put(&self, request: &Request, response: Response) -> AppshellResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            request.url.clone(),
            StoredEntry {
                response,
                stored_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn add_all(&self, batch: Vec<(Request, Response)>) -> AppshellResult<()> {
        // Single write-lock acquisition keeps the batch atomic
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        for (request, response) in batch {
            entries.insert(
                request.url,
                StoredEntry {
                    response,
                    stored_at: now,
                },
            );
        }
        Ok(())
    }
}
