//! Error types for mediazip.
//!
//! Failures are split by how far they are allowed to travel:
//! - [`FetchError`] and [`EntryError`] concern a single URL and never abort a batch
//! - [`DeliveryError`] is the terminal failure of an archive export
//! - [`Error`] is what the public operations return

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mediazip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediazip
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be loaded or are invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Fetching or probing a URL failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The delivery adapter rejected or failed to persist a buffer
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// The URL's extension is not enabled in the settings snapshot
    #[error("extension '{extension}' is not enabled")]
    ExtensionDisabled {
        /// Lowercased extension taken from the URL path
        extension: String,
    },

    /// The input is not an absolute URL
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected input
        url: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to retrieve a single resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("HTTP request failed with status: {0}")]
    Status(u16),

    /// Server answered successfully but sent no bytes
    #[error("empty response body")]
    EmptyBody,

    /// Transport-level failure (DNS, connect, timeout, malformed URL)
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Reasons a single archive entry is skipped
#[derive(Debug, Error)]
pub enum EntryError {
    /// The payload could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Payload does not fit the 32-bit size fields
    #[error("payload of {size} bytes exceeds the 4 GiB entry limit")]
    PayloadTooLarge {
        /// Payload length in bytes
        size: usize,
    },

    /// Encoded file name does not fit the 16-bit length field
    #[error("file name of {len} bytes exceeds the 65535 byte limit")]
    NameTooLong {
        /// Encoded name length in bytes
        len: usize,
    },

    /// Adding the entry would push an offset or the central directory past 4 GiB
    #[error("archive would exceed the 4 GiB offset limit")]
    ArchiveFull,

    /// The end record can only count 65535 entries
    #[error("archive already holds the maximum of 65535 entries")]
    TooManyEntries,
}

/// Failure reported by a delivery adapter
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The host download facility is not available
    #[error("delivery adapter unavailable: {0}")]
    Unavailable(String),

    /// The suggested file name cannot be placed safely under the output root
    #[error("refusing to write outside the output directory: {}", path.display())]
    InvalidPath {
        /// The offending relative path
        path: PathBuf,
    },

    /// Writing the buffer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
