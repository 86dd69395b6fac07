use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{Fetch, Resource};
use crate::error::FetchError;

/// HTTP fetcher for remote media
///
/// One GET per resource, no retries: a failed fetch is final for that URL.
pub struct HttpFetcher {
    client: Client,
    transferred_bytes: AtomicU64,
}

impl HttpFetcher {
    /// Create a new fetcher whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Get total body bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = resp.bytes().await?;
        self.transferred_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        tracing::debug!(url, len = bytes.len(), content_type = ?content_type, "fetched resource");
        Ok(Resource {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn probe(&self, url: &str) -> Result<u64, FetchError> {
        let resp = self.client.head(url).send().await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        // Content-Length read from the header: HEAD responses have no body to size
        let size = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![1u8, 2, 3, 4]),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let resource = fetcher
            .fetch(&format!("{}/cat.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(resource.bytes, vec![1, 2, 3, 4]);
        assert_eq!(resource.content_type.as_deref(), Some("image/png"));
        assert_eq!(fetcher.transferred_bytes(), 4);
    }

    #[tokio::test]
    async fn fetch_rejects_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn fetch_rejects_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/empty", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::EmptyBody));
    }

    #[tokio::test]
    async fn fetch_reports_transport_errors() {
        let err = fetcher().fetch("http://").await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[tokio::test]
    async fn probe_uses_head() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1234]))
            .expect(1)
            .mount(&server)
            .await;

        let size = fetcher()
            .probe(&format!("{}/clip.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(size, 1234);
    }

    #[tokio::test]
    async fn probe_rejects_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetcher()
            .probe(&format!("{}/clip.mp4", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }
}
