//! HTTP client for the remote memory service

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::types::{BatchAddRequest, MemoryItem};

/// Default memory service base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Header carrying the optional API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Path of the batch ingestion endpoint
pub const BATCH_ADD_PATH: &str = "/memory/batch/add";

/// Destination for flushed batches
#[async_trait]
pub trait MemorySink: Send + Sync {
    /// Write `items` in one request. Returns the number of items accepted.
    async fn add_batch(&self, items: &[MemoryItem]) -> Result<usize>;
}

/// Response relayed from the memory service
#[derive(Debug, Clone, PartialEq)]
pub struct Upstream {
    pub status: StatusCode,
    pub body: Value,
}

/// Memory service client
#[derive(Debug, Clone)]
pub struct MemoryApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl MemoryApiClient {
    /// Create a client for `base_url` (trailing slashes are ignored)
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "Memory API URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("memory-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Send a request and relay status and body.
    ///
    /// Non-2xx responses are returned as-is; only transport failures error.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Upstream> {
        let path = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", path, q),
            _ => path.to_string(),
        };

        let mut builder = self.request(method, &path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(Upstream { status, body })
    }
}

#[async_trait]
impl MemorySink for MemoryApiClient {
    async fn add_batch(&self, items: &[MemoryItem]) -> Result<usize> {
        let response = self
            .request(Method::POST, BATCH_ADD_PATH)
            .json(&BatchAddRequest { items })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            MemoryApiClient::new("localhost:8080", None),
            Err(SyncError::Config(_))
        ));
        let client = MemoryApiClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_add_batch_posts_items() {
        let server = MockServer::start().await;
        let items = vec![MemoryItem::code("File: a.ts")];

        Mock::given(method("POST"))
            .and(path(BATCH_ADD_PATH))
            .and(header(API_KEY_HEADER, "secret"))
            .and(body_json(json!({ "items": [{ "text": "File: a.ts", "type": "code", "age": 0 }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "added": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MemoryApiClient::new(&server.uri(), Some("secret".to_string())).unwrap();
        assert_eq!(client.add_batch(&items).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_batch_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BATCH_ADD_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = MemoryApiClient::new(&server.uri(), None).unwrap();
        match client.add_batch(&[MemoryItem::code("x")]).await {
            Err(SyncError::Upstream { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forward_relays_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/memory/search"))
            .and(query_param("query", "price"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = MemoryApiClient::new(&server.uri(), None).unwrap();
        let upstream = client
            .forward(Method::GET, "/memory/search", Some("query=price"), None)
            .await
            .unwrap();

        assert_eq!(upstream.status, StatusCode::NOT_FOUND);
        assert_eq!(upstream.body, json!("not json"));
    }
}
