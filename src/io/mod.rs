mod http;
mod local;

pub use http::HttpFetcher;
pub use local::LocalDelivery;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{DeliveryError, FetchError};

/// Body and declared type of a successfully fetched URL
#[derive(Debug, Clone)]
pub struct Resource {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Trait for retrieving remote resources
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieve the full body of `url`.
    ///
    /// A non-success status or an empty body is an error.
    async fn fetch(&self, url: &str) -> Result<Resource, FetchError>;

    /// Ask for the size of `url` without transferring the body.
    ///
    /// Returns 0 when the server does not report a length.
    async fn probe(&self, url: &str) -> Result<u64, FetchError>;
}

/// Identifier handed back by a delivery adapter for a persisted file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

impl std::fmt::Display for DownloadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished buffer and where it should end up
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub bytes: &'a [u8],
    pub mime_type: &'a str,
    /// Relative, `/`-separated path suggested for the file
    pub file_name: &'a str,
}

/// Trait for the host facility that persists finished files
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, delivery: Delivery<'_>) -> Result<DownloadId, DeliveryError>;
}
