//! Network fetch abstraction
//!
//! The worker never talks to the network directly; it goes through the
//! [`Fetcher`] trait so tests can substitute fakes. [`UreqFetcher`] is the
//! real backend, driven through `spawn_blocking` since ureq is synchronous.
//!
//! A `Fetcher` error means transport-level failure only (DNS, refused
//! connection, TLS, …). HTTP error statuses are successful fetches and come
//! back as ordinary responses.

use crate::error::{AppshellError, AppshellResult};
use crate::http::{Method, Request, Response};
use async_trait::async_trait;
use ureq::Agent;

/// Abstract network fetch interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue the request and return the response, whatever its status
    async fn fetch(&self, request: &Request) -> AppshellResult<Response>;
}

/// Real HTTP backend built on a shared ureq agent
pub struct UreqFetcher {
    agent: Agent,
}

impl UreqFetcher {
    /// Create a fetcher whose agent passes HTTP error statuses through
    /// as responses instead of errors
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }

    fn fetch_blocking(agent: Agent, request: Request) -> AppshellResult<Response> {
        let result = match request.method {
            Method::Get | Method::Head | Method::Delete => {
                let mut builder = match request.method {
                    Method::Get => agent.get(&request.url),
                    Method::Head => agent.head(&request.url),
                    _ => agent.delete(&request.url),
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            Method::Post | Method::Put | Method::Patch => {
                let mut builder = match request.method {
                    Method::Post => agent.post(&request.url),
                    Method::Put => agent.put(&request.url),
                    _ => agent.patch(&request.url),
                };
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                let body = request.body.clone().unwrap_or_default();
                builder.send(&body[..])
            }
            Method::Options => {
                return Err(AppshellError::UnsupportedMethod(
                    request.method.to_string(),
                ))
            }
        };

        let mut raw = result.map_err(|e| AppshellError::fetch(&request.url, e.to_string()))?;

        let status = raw.status().as_u16();
        let headers = raw
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = raw
            .body_mut()
            .read_to_vec()
            .map_err(|e| AppshellError::fetch(&request.url, e.to_string()))?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for UreqFetcher {
    async fn fetch(&self, request: &Request) -> AppshellResult<Response> {
        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || Self::fetch_blocking(agent, request))
            .await
            .map_err(|e| AppshellError::Internal(format!("fetch task panicked: {}", e)))?
    }
}
