//! Remote key/value service client.
//!
//! Speaks the plain-text protocol served by [`crate::api`]:
//!
//! | Operation | Request                                   |
//! |-----------|-------------------------------------------|
//! | read      | `GET {base}?key=K` (empty body = absent)  |
//! | write     | `POST {base}?key=K` with a text body      |
//! | delete    | `DELETE {base}?key=K`                     |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::config::RemoteStoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::AsyncBackend;

/// HTTP client for the remote key/value service.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: Url,
}

impl RemoteStore {
    /// Create a remote store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &RemoteStoreConfig) -> StorageResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StorageError::Request(format!("Invalid base URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Service endpoint requests are sent to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL addressing `key`, with the key percent-encoded.
    fn key_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().clear().append_pair("key", key);
        url
    }

    fn request(&self, method: Method, key: &str) -> RequestBuilder {
        self.client.request(method, self.key_url(key))
    }
}

#[async_trait]
impl AsyncBackend for RemoteStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let body = self
            .request(Method::GET, key)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(if body.is_empty() { None } else { Some(body) })
    }

    async fn set(&self, key: &str, raw: &str) -> StorageResult<()> {
        self.request(Method::POST, key)
            .header(CONTENT_TYPE, "text/plain")
            .body(raw.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn clear(&self, key: &str) -> StorageResult<()> {
        self.request(Method::DELETE, key)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base_url: &str) -> RemoteStore {
        RemoteStore::new(&RemoteStoreConfig {
            base_url: base_url.to_string(),
            timeout_secs: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_key_url_encodes_key() {
        let store = store("http://localhost:4000/");
        assert_eq!(
            store.key_url("a b&c").as_str(),
            "http://localhost:4000/?key=a+b%26c"
        );
    }

    #[test]
    fn test_key_url_replaces_existing_query() {
        let store = store("http://localhost:4000/kv?key=stale");
        assert_eq!(
            store.key_url("clicks").as_str(),
            "http://localhost:4000/kv?key=clicks"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = RemoteStore::new(&RemoteStoreConfig {
            base_url: "::nope".to_string(),
            timeout_secs: 1,
        });
        assert!(matches!(result, Err(StorageError::Request(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) is almost never listening on loopback.
        let store = store("http://127.0.0.1:9/");
        assert!(store.get("clicks").await.is_err());
        assert!(store.set("clicks", "1").await.is_err());
    }
}
