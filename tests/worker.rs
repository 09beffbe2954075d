//! Lifecycle tests for the asset cache worker
//!
//! Drives install / activate / fetch end-to-end over the in-memory store
//! backend and a scripted fetcher that records every network call.

use appshell::config::{CacheConfig, RouteConfig};
use appshell::{
    AppshellResult, AssetCacheWorker, CacheStorage, ClientRegistry, Config, Fetcher,
    MemoryStorage, Request, Response, WorkerState,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const API_HOST: &str = "generativelanguage.googleapis.com";
const GENERATION: &str = "appshell-cache-v2";

const OFFLINE_BODY: &str = r#"{"error": "Network connection required for AI analysis."}"#;

/// What the scripted fetcher should do for one URL
#[derive(Clone)]
enum Outcome {
    Respond(Response),
    Fail,
}

/// Fetcher that answers from a script and records every call
#[derive(Default)]
struct ScriptedFetcher {
    outcomes: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn respond(&self, url: &str, response: Response) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), Outcome::Respond(response));
    }

    fn fail(&self, url: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), Outcome::Fail);
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> AppshellResult<Response> {
        self.calls.lock().unwrap().push(request.url.clone());
        let outcome = self.outcomes.lock().unwrap().get(&request.url).cloned();
        match outcome {
            Some(Outcome::Respond(response)) => Ok(response),
            Some(Outcome::Fail) => Err(appshell::AppshellError::fetch(
                &request.url,
                "connection refused",
            )),
            // Unscripted URLs resolve 200 with the URL as body
            None => Ok(Response::new(200).with_body(request.url.clone())),
        }
    }
}

fn config() -> Config {
    Config {
        cache: CacheConfig {
            generation: GENERATION.to_string(),
            precache: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
        },
        routes: RouteConfig {
            api_host: API_HOST.to_string(),
        },
    }
}

struct Harness {
    storage: Arc<MemoryStorage>,
    fetcher: Arc<ScriptedFetcher>,
    clients: Arc<ClientRegistry>,
    worker: AssetCacheWorker,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let storage = Arc::new(MemoryStorage::new());
    let fetcher = Arc::new(ScriptedFetcher::new());
    let clients = Arc::new(ClientRegistry::new());
    let worker = AssetCacheWorker::new(
        config(),
        Arc::clone(&storage) as Arc<dyn CacheStorage>,
        Arc::clone(&fetcher) as Arc<dyn Fetcher>,
        Arc::clone(&clients),
    );
    Harness {
        storage,
        fetcher,
        clients,
        worker,
    }
}

#[tokio::test]
async fn install_resolves_even_when_every_precache_fetch_fails() {
    let h = harness();
    h.fetcher.fail("/");
    h.fetcher.fail("/index.html");
    h.fetcher.fail("/manifest.json");

    h.worker.handle_install().await.unwrap();

    // All three were attempted, in manifest order
    assert_eq!(h.fetcher.call_count(), 3);
    // All-or-nothing: the store exists but holds nothing
    assert!(h.storage.contains(GENERATION).await);
    assert_eq!(h.storage.store_len(GENERATION).await, Some(0));
    assert!(h.worker.skip_waiting());
}

#[tokio::test]
async fn partial_precache_failure_writes_nothing() {
    let h = harness();
    h.fetcher.fail("/index.html");

    h.worker.handle_install().await.unwrap();

    // One failure poisons the whole batch
    assert_eq!(h.storage.store_len(GENERATION).await, Some(0));
}

#[tokio::test]
async fn precache_rejects_error_statuses() {
    let h = harness();
    h.fetcher.respond("/manifest.json", Response::new(404));

    h.worker.handle_install().await.unwrap();

    assert_eq!(h.storage.store_len(GENERATION).await, Some(0));
}

#[tokio::test]
async fn successful_install_caches_the_whole_manifest() {
    let h = harness();

    h.worker.handle_install().await.unwrap();

    assert_eq!(h.storage.store_len(GENERATION).await, Some(3));
    assert_eq!(h.worker.state().await, WorkerState::Installed);
}

#[tokio::test]
async fn activation_deletes_every_stale_store_and_keeps_current() {
    let h = harness();
    h.storage.open("appshell-cache-v1").await.unwrap();
    h.storage.open("legacy-cache").await.unwrap();
    h.worker.handle_install().await.unwrap();

    let deleted = h.worker.handle_activate().await.unwrap();

    assert_eq!(deleted, 2);
    let keys = h.storage.keys().await.unwrap();
    assert_eq!(keys, vec![GENERATION.to_string()]);
}

#[tokio::test]
async fn activation_claims_open_clients() {
    let h = harness();
    h.clients.connect("https://app.example/").await;
    h.clients.connect("https://app.example/help").await;
    h.worker.handle_install().await.unwrap();

    h.worker.handle_activate().await.unwrap();

    assert_eq!(h.clients.controlled_by(GENERATION).await, 2);
}

#[tokio::test]
async fn repeated_activation_is_idempotent() {
    let h = harness();
    h.storage.open("appshell-cache-v1").await.unwrap();
    h.clients.connect("https://app.example/").await;
    h.worker.handle_install().await.unwrap();

    let first = h.worker.handle_activate().await.unwrap();
    let second = h.worker.handle_activate().await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert!(h.storage.contains(GENERATION).await);
    assert_eq!(h.clients.controlled_by(GENERATION).await, 1);
}

#[tokio::test]
async fn api_transport_failure_returns_exact_503_substitute() {
    let h = harness();
    h.worker.handle_install().await.unwrap();
    h.worker.handle_activate().await.unwrap();

    let url = format!("https://{}/v1beta/models/analyze", API_HOST);
    h.fetcher.fail(&url);

    let resp = h.worker.handle_fetch(&Request::get(&url)).await.unwrap();

    assert_eq!(resp.status, 503);
    assert_eq!(resp.header("Content-Type"), Some("application/json"));
    assert_eq!(resp.body_string(), OFFLINE_BODY);
}

#[tokio::test]
async fn api_responses_pass_through_unmodified_even_on_http_errors() {
    let h = harness();
    h.worker.handle_install().await.unwrap();
    h.worker.handle_activate().await.unwrap();

    let url = format!("https://{}/v1beta/models/analyze", API_HOST);
    let upstream = Response::new(429)
        .with_header("Retry-After", "30")
        .with_body(r#"{"error":"rate limited"}"#);
    h.fetcher.respond(&url, upstream.clone());

    let resp = h.worker.handle_fetch(&Request::get(&url)).await.unwrap();

    assert_eq!(resp, upstream);
}

#[tokio::test]
async fn cached_static_asset_is_served_without_network() {
    let h = harness();
    h.worker.handle_install().await.unwrap();
    h.worker.handle_activate().await.unwrap();
    let installed_calls = h.fetcher.call_count();

    let resp = h
        .worker
        .handle_fetch(&Request::get("/index.html"))
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    // No network traffic beyond the install batch
    assert_eq!(h.fetcher.call_count(), installed_calls);
}

#[tokio::test]
async fn uncached_static_asset_goes_to_network_verbatim() {
    let h = harness();
    h.worker.handle_install().await.unwrap();
    h.worker.handle_activate().await.unwrap();

    let upstream = Response::new(200)
        .with_header("Content-Type", "image/png")
        .with_body(vec![0x89, 0x50, 0x4e, 0x47]);
    h.fetcher.respond("/logo.png", upstream.clone());

    let resp = h.worker.handle_fetch(&Request::get("/logo.png")).await.unwrap();

    assert_eq!(resp, upstream);
    assert_eq!(h.fetcher.calls_for("/logo.png"), 1);
    // The miss path does not backfill the store
    assert_eq!(h.storage.store_len(GENERATION).await, Some(3));
}

#[tokio::test]
async fn uncached_static_asset_transport_failure_propagates() {
    let h = harness();
    h.worker.handle_install().await.unwrap();
    h.worker.handle_activate().await.unwrap();

    h.fetcher.fail("/gone.css");

    let err = h
        .worker
        .handle_fetch(&Request::get("/gone.css"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn new_generation_takes_over_from_old() {
    let h = harness();

    // Simulate the previous generation's leftovers
    h.storage.open("appshell-cache-v1").await.unwrap();
    let client = h.clients.connect("https://app.example/").await;
    h.clients.claim("appshell-cache-v1").await;

    h.worker.handle_install().await.unwrap();
    h.worker.handle_activate().await.unwrap();

    // Old store swept, same client now governed by the new generation
    assert!(!h.storage.contains("appshell-cache-v1").await);
    let governed = h.clients.get(client).await.unwrap();
    assert_eq!(governed.controller.as_deref(), Some(GENERATION));
}
