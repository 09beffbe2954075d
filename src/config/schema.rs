//! Configuration schema for Appshell
//!
//! Configuration is stored at `~/.config/appshell/config.toml` and is
//! immutable once a worker has been constructed from it. Changing the
//! pre-cache list without bumping the generation leaves stale entries
//! under the old cache key, so the two travel together in `[cache]`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache generation and pre-cache manifest
    pub cache: CacheConfig,

    /// Request routing settings
    pub routes: RouteConfig,
}

/// Cache generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Generation identifier naming the current cache store
    pub generation: String,

    /// Ordered list of resources fetched into the cache at install time
    pub precache: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generation: "appshell-cache-v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
        }
    }
}

/// Request routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Requests whose URL contains this substring are API traffic and
    /// resolved network-first; everything else is cache-first
    pub api_host: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            api_host: "generativelanguage.googleapis.com".to_string(),
        }
    }
}
