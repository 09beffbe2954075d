//! Asset cache worker lifecycle
//!
//! The worker owns one named cache store per generation and reacts to
//! three events: install (pre-cache the manifest, best-effort), activate
//! (sweep stale generations, claim clients), and fetch (route through a
//! cache-first or network-first strategy). All platform capabilities are
//! injected: the store registry, the network fetcher, and the client
//! registry.

pub mod strategy;

pub use strategy::RouteClass;

use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::error::{AppshellError, AppshellResult};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::manifest::PrecacheManifest;
use crate::store::{CacheStorage, CacheStore};
use futures_util::future::join_all;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, install not yet run
    Parsed,
    /// Install completed, eligible for activation
    Installed,
    /// Active and governing clients
    Activated,
}

impl WorkerState {
    /// Whether fetch interception is expected in this state
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Installed => write!(f, "installed"),
            Self::Activated => write!(f, "activated"),
        }
    }
}

/// The asset cache manager: one generation, three handlers
pub struct AssetCacheWorker {
    config: Config,
    manifest: PrecacheManifest,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<ClientRegistry>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
}

impl AssetCacheWorker {
    /// Create a worker over injected platform capabilities
    pub fn new(
        config: Config,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<ClientRegistry>,
    ) -> Self {
        let manifest = PrecacheManifest::new(config.cache.precache.clone());
        Self {
            config,
            manifest,
            storage,
            fetcher,
            clients,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
        }
    }

    /// The current cache generation identifier
    pub fn generation(&self) -> &str {
        &self.config.cache.generation
    }

    /// The pre-cache manifest for this generation
    pub fn manifest(&self) -> &PrecacheManifest {
        &self.manifest
    }

    /// The client registry this worker governs
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Current lifecycle state
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether the worker has requested immediate promotion, bypassing
    /// the wait for a prior instance to be released
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Install handler: open the generation's store and attempt the
    /// pre-cache batch.
    ///
    /// Pre-cache failure is non-fatal by contract; it is logged and the
    /// worker still becomes eligible for activation.
    pub async fn handle_install(&self) -> AppshellResult<()> {
        info!(
            "Install: generation {} ({})",
            self.generation(),
            self.manifest
        );

        let store = self.storage.open(self.generation()).await?;

        match self.precache(store.as_ref()).await {
            Ok(count) => info!("Pre-cached {} asset(s)", count),
            Err(err) => warn!("Pre-cache failed, continuing install: {}", err),
        }

        // Skip-waiting: do not hold activation for the old instance
        self.skip_waiting.store(true, Ordering::SeqCst);
        *self.state.write().await = WorkerState::Installed;
        Ok(())
    }

    /// Fetch every manifest entry in order and store the batch atomically.
    ///
    /// Failures are aggregated, not short-circuited: every entry is
    /// attempted, and if any failed (transport error or non-2xx status)
    /// the batch errors without writing anything.
    async fn precache(&self, store: &dyn CacheStore) -> AppshellResult<usize> {
        let mut staged = Vec::with_capacity(self.manifest.len());
        let mut failed = Vec::new();

        for url in self.manifest.urls() {
            let request = Request::get(url);
            match self.fetcher.fetch(&request).await {
                Ok(response) if response.ok() => staged.push((request, response)),
                Ok(response) => {
                    debug!("Pre-cache fetch for {} returned {}", url, response.status);
                    failed.push(format!("{} (status {})", url, response.status));
                }
                Err(err) => {
                    debug!("Pre-cache fetch for {} failed: {}", url, err);
                    failed.push(format!("{} ({})", url, err));
                }
            }
        }

        if !failed.is_empty() {
            return Err(AppshellError::Precache {
                generation: self.generation().to_string(),
                failed,
            });
        }

        let count = staged.len();
        store.add_all(staged).await?;
        Ok(count)
    }

    /// Activate handler: delete every stale generation's store, then claim
    /// all open clients.
    ///
    /// Deletions run concurrently and activation waits for all of them to
    /// settle; a failed delete only leaves an unused store behind and is
    /// logged at low severity. Returns the number of stores deleted.
    pub async fn handle_activate(&self) -> AppshellResult<usize> {
        info!("Activate: generation {}", self.generation());

        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != self.generation())
            .collect();

        let sweeps = stale.iter().map(|name| {
            let storage = Arc::clone(&self.storage);
            async move { (name.clone(), storage.delete(name).await) }
        });

        let mut deleted = 0;
        for (name, result) in join_all(sweeps).await {
            match result {
                Ok(true) => {
                    info!("Deleted stale cache store: {}", name);
                    deleted += 1;
                }
                Ok(false) => debug!("Stale cache store already gone: {}", name),
                Err(err) => warn!("Failed to delete stale cache store {}: {}", name, err),
            }
        }

        let claimed = self.clients.claim(self.generation()).await;
        debug!("Governing {} client(s)", claimed);

        *self.state.write().await = WorkerState::Activated;
        Ok(deleted)
    }

    /// Fetch handler: classify the request and resolve it through the
    /// matching strategy.
    pub async fn handle_fetch(&self, request: &Request) -> AppshellResult<Response> {
        let state = self.state().await;
        if !state.can_intercept_fetch() {
            debug!("Fetch intercepted while {}: {}", state, request.url);
        }

        match RouteClass::classify(&request.url, &self.config.routes.api_host) {
            RouteClass::Api => strategy::network_first(self.fetcher.as_ref(), request).await,
            RouteClass::Static => {
                let store = self.storage.open(self.generation()).await?;
                strategy::cache_first(store.as_ref(), self.fetcher.as_ref(), request).await
            }
        }
    }
}
