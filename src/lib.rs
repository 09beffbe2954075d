//! Appshell - Offline App-Shell Caching Worker
//!
//! Pre-populates a named cache with a fixed manifest of static assets,
//! evicts stale cache generations on activation, and routes intercepted
//! requests cache-first or network-first depending on whether they target
//! the configured API host.

pub mod clients;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod manifest;
pub mod store;
pub mod worker;

pub use clients::ClientRegistry;
pub use config::Config;
pub use error::{AppshellError, AppshellResult};
pub use fetch::{Fetcher, UreqFetcher};
pub use http::{Method, Request, Response};
pub use manifest::PrecacheManifest;
pub use store::{CacheStorage, CacheStore, MemoryStorage};
pub use worker::{AssetCacheWorker, RouteClass, WorkerState};
