//! Cache store abstraction
//!
//! Models the host-provided cache API as a pair of capability traits:
//! [`CacheStorage`] is the platform-wide registry of named stores, and
//! [`CacheStore`] is one named store holding request/response pairs.
//! Any backend satisfies them — the in-memory implementation in
//! [`memory`] backs the tests; a browser or on-disk backend slots in
//! the same way.

pub mod memory;

pub use memory::{MemoryStorage, MemoryStore};

use crate::error::AppshellResult;
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// Registry of named cache stores
///
/// One store exists per cache generation. Stores are created lazily on
/// [`open`](CacheStorage::open) and live until explicitly deleted.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the store with the given name, creating it if absent
    async fn open(&self, name: &str) -> AppshellResult<Arc<dyn CacheStore>>;

    /// Names of every store currently known to the platform
    async fn keys(&self) -> AppshellResult<Vec<String>>;

    /// Delete the named store; returns whether it existed
    async fn delete(&self, name: &str) -> AppshellResult<bool>;
}

/// A single named cache store
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name of this store (the generation identifier it belongs to)
    fn name(&self) -> &str;

    /// Look up the stored response for a request, if any
    async fn matching(&self, request: &Request) -> AppshellResult<Option<Response>>;

    /// Store a single response under a request
    async fn put(&self, request: &Request, response: Response) -> AppshellResult<()>;

    /// Store a batch of responses as one atomic operation.
    ///
    /// Either every pair lands in the store or none does; partial
    /// batches are never observable.
    async fn add_all(&self, entries: Vec<(Request, Response)>) -> AppshellResult<()>;
}
