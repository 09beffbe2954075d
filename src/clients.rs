//! Governed consumer registry
//!
//! Tracks the open consumers (tabs, windows, contexts) a worker can
//! govern. Claiming sets the controlling generation on every registered
//! client at once, so already-open pages fall under a freshly activated
//! worker without a reload.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A single governed consumer
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique client identifier
    pub id: Uuid,
    /// URL of the page the client has loaded
    pub url: String,
    /// When the client connected
    pub connected_at: DateTime<Utc>,
    /// Generation identifier currently controlling this client, if any
    pub controller: Option<String>,
}

/// Registry of currently open consumers
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<Uuid, Client>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened consumer; returns its identifier.
    ///
    /// A new client starts uncontrolled until some generation claims it.
    pub async fn connect(&self, url: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        let client = Client {
            id,
            url: url.into(),
            connected_at: Utc::now(),
            controller: None,
        };
        self.clients.write().await.insert(id, client);
        id
    }

    /// Remove a consumer; returns whether it was registered
    pub async fn disconnect(&self, id: Uuid) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    /// Look up a consumer by id
    pub async fn get(&self, id: Uuid) -> Option<Client> {
        self.clients.read().await.get(&id).cloned()
    }

    /// Number of registered consumers
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no consumers are registered
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Put every registered consumer under the given generation's control.
    ///
    /// Idempotent; returns how many clients are now controlled.
    pub async fn claim(&self, generation: &str) -> usize {
        let mut clients = self.clients.write().await;
        for client in clients.values_mut() {
            client.controller = Some(generation.to_string());
        }
        let claimed = clients.len();
        debug!("Claimed {} client(s) for generation {}", claimed, generation);
        claimed
    }

    /// Number of consumers controlled by the given generation
    pub async fn controlled_by(&self, generation: &str) -> usize {
        self.clients
            .read()
            .await
            .values()
            .filter(|c| c.controller.as_deref() == Some(generation))
            .count()
    }
}
