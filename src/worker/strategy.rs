//! Request classification and retrieval strategies
//!
//! Every intercepted request is classified once, by a substring predicate
//! on its URL, and then resolved by exactly one of two strategies:
//!
//! | Class | Strategy | Fallback |
//! |-------|----------|----------|
//! | Api | network-first | synthesized 503 JSON on transport failure |
//! | Static | cache-first | network on miss, no write-back |

use crate::error::AppshellResult;
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::store::CacheStore;
use std::fmt;
use tracing::{debug, warn};

/// Classification of an intercepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// API traffic, resolved network-first
    Api,
    /// Static asset, resolved cache-first
    Static,
}

impl RouteClass {
    /// Classify a URL against the configured API host substring
    pub fn classify(url: &str, api_host: &str) -> Self {
        if url.contains(api_host) {
            Self::Api
        } else {
            Self::Static
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// Network-first resolution.
///
/// The network response is returned unmodified whatever its status;
/// only a transport-level failure produces the 503 substitute.
pub async fn network_first(fetcher: &dyn Fetcher, request: &Request) -> AppshellResult<Response> {
    match fetcher.fetch(request).await {
        Ok(response) => Ok(response),
        Err(err) if err.is_transport() => {
            warn!("API request failed: {}", err);
            Ok(Response::offline_api_fallback())
        }
        Err(err) => Err(err),
    }
}

/// Cache-first resolution.
///
/// A hit is served from the store without touching the network. A miss
/// goes to the network and the response is returned verbatim; the miss
/// path never writes back into the store, and a transport failure
/// surfaces to the caller.
pub async fn cache_first(
    store: &dyn CacheStore,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> AppshellResult<Response> {
    if let Some(hit) = store.matching(request).await? {
        debug!("Cache hit: {}", request.url);
        return Ok(hit);
    }

    debug!("Cache miss, fetching: {}", request.url);
    fetcher.fetch(request).await
}
