//! Integration tests for the remote key/value service.
//!
//! These tests spin up a real server instance and talk to it both with raw
//! HTTP requests and through a persistent item on the remote scope.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tempfile::TempDir;
use tokio::net::TcpListener;

use persistent_item::api::{AppState, create_router};
use persistent_item::config::{
    AppConfig, RemoteStoreConfig, ServerConfig, StorageConfig, StrategyScope,
};
use persistent_item::item::{ItemOptions, PersistentItem};
use persistent_item::storage::RemoteStore;
use persistent_item::strategy::{AsyncStrategy, create_strategy};

// ============================================================================
// Test Harness
// ============================================================================

/// Test server instance.
struct TestServer {
    addr: SocketAddr,
    client: Client,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn new() -> Self {
        Self::with_backing(StrategyScope::Session).await
    }

    async fn with_backing(backing: StrategyScope) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".parse().unwrap(),
                port: 0,
                backing,
            },
            ..Default::default()
        };
        config.storage.file.data_dir = temp_dir.path().to_path_buf();

        let state = AppState::from_config(Arc::new(config), None).expect("Failed to create state");
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr,
            client: Client::new(),
            _temp_dir: temp_dir,
        }
    }

    fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            scope: StrategyScope::Remote,
            remote: RemoteStoreConfig {
                base_url: self.base_url(),
                timeout_secs: 2,
            },
            ..Default::default()
        }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("http://{}{}", self.addr, path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn post(&self, path: &str, body: &str) -> Response {
        self.client
            .post(format!("http://{}{}", self.addr, path))
            .header("Content-Type", "text/plain")
            .body(body.to_string())
            .send()
            .await
            .expect("Request failed")
    }

    async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(format!("http://{}{}", self.addr, path))
            .send()
            .await
            .expect("Request failed")
    }
}

/// API error/health envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i32,
    data: Option<serde_json::Value>,
}

async fn envelope(response: Response) -> ApiResponse {
    let text = response.text().await.unwrap();
    serde_json::from_str(&text).unwrap()
}

fn within_range(value: &u32) -> bool {
    *value < 1_000_000
}

// ============================================================================
// Protocol Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = envelope(response).await;
    assert_eq!(body.code, 0);
    assert_eq!(body.data.unwrap()["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let server = TestServer::new().await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_read_write_delete() {
    let server = TestServer::new().await;

    let response = server.get("/?key=clicks").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "");

    let response = server.post("/?key=clicks", "5").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.get("/?key=clicks").await;
    assert_eq!(response.text().await.unwrap(), "5");

    let response = server.post("/?key=clicks", "6").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.get("/?key=clicks").await.text().await.unwrap(), "6");

    assert_eq!(server.delete("/?key=clicks").await.status(), StatusCode::OK);
    assert_eq!(server.delete("/?key=clicks").await.status(), StatusCode::OK);
    assert_eq!(server.get("/?key=clicks").await.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_missing_key() {
    let server = TestServer::new().await;

    let response = server.get("/").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(envelope(response).await.code, 3002);

    let response = server.post("/?key=", "1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_backing_persists_values() {
    let server = TestServer::with_backing(StrategyScope::Local).await;

    server.post("/?key=theme", "\"dark\"").await;
    assert_eq!(
        server.get("/?key=theme").await.text().await.unwrap(),
        "\"dark\""
    );
}

// ============================================================================
// Remote Scope Tests
// ============================================================================

#[tokio::test]
async fn test_remote_item_round_trip() {
    let server = TestServer::new().await;
    let strategy = Arc::new(create_strategy(StrategyScope::Remote, &server.storage_config()).unwrap());
    let item: PersistentItem<u32> =
        PersistentItem::new(ItemOptions::new("clicks", strategy, within_range));

    item.clear().await;
    assert_eq!(item.get().await, None);

    assert_eq!(item.set(7).await, 7);
    assert_eq!(item.get().await, Some(7));
    assert_eq!(item.get_sync(), None);

    assert_eq!(item.update(|prev| prev.unwrap_or(0) + 1).await, 8);
    assert_eq!(server.get("/?key=clicks").await.text().await.unwrap(), "8");

    item.clear().await;
    item.clear().await;
    assert_eq!(item.get().await, None);
}

#[tokio::test]
async fn test_remote_item_keys_with_reserved_characters() {
    let server = TestServer::new().await;
    let store = RemoteStore::new(&server.storage_config().remote).unwrap();
    let item: PersistentItem<String, _> = PersistentItem::new(ItemOptions::new(
        "user settings&theme",
        Arc::new(AsyncStrategy::new(store)),
        |value: &String| !value.is_empty(),
    ));

    item.set("dark".to_string()).await;
    assert_eq!(item.get().await.as_deref(), Some("dark"));
    assert_eq!(
        server
            .get("/?key=user%20settings%26theme")
            .await
            .text()
            .await
            .unwrap(),
        "\"dark\""
    );
}

#[tokio::test]
async fn test_remote_invalid_value_is_absent() {
    let server = TestServer::new().await;
    let strategy = Arc::new(create_strategy(StrategyScope::Remote, &server.storage_config()).unwrap());
    let item: PersistentItem<u32> =
        PersistentItem::new(ItemOptions::new("clicks", strategy, within_range));

    server.post("/?key=clicks", "\"lots\"").await;
    assert_eq!(item.get().await, None);

    server.post("/?key=clicks", "{broken").await;
    assert_eq!(item.get().await, None);

    server.post("/?key=clicks", "2000000").await;
    assert_eq!(item.get().await, None);
}

#[tokio::test]
async fn test_remote_watch_is_seeded_from_service() {
    let server = TestServer::new().await;
    server.post("/?key=clicks", "4").await;

    let strategy = Arc::new(create_strategy(StrategyScope::Remote, &server.storage_config()).unwrap());
    let item: PersistentItem<u32> =
        PersistentItem::new(ItemOptions::new("clicks", strategy, within_range));

    let mut watch = item.watch().await;
    assert_eq!(watch.current(), Some(4));

    item.set(5).await;
    assert_eq!(watch.changed().await, Some(Some(5)));
}

#[tokio::test]
async fn test_unreachable_service_degrades_silently() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = StorageConfig {
        remote: RemoteStoreConfig {
            base_url: format!("http://{addr}/"),
            timeout_secs: 1,
        },
        ..Default::default()
    };
    let strategy = Arc::new(create_strategy(StrategyScope::Remote, &config).unwrap());
    let item: PersistentItem<u32> =
        PersistentItem::new(ItemOptions::new("clicks", strategy, within_range));

    let notified = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let n = Arc::clone(&notified);
    let _sub = item.subscribe(move |_| {
        n.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    assert_eq!(item.get().await, None);
    assert_eq!(item.set(3).await, 3);
    item.clear().await;
    assert_eq!(notified.load(std::sync::atomic::Ordering::SeqCst), 0);
}
