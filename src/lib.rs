//! # mediazip
//!
//! Fetch media URLs and export them either as individual files or as a single
//! ZIP archive assembled in memory.
//!
//! The archive is written byte-for-byte by this crate (STORED method, CRC-32,
//! local and central directory records) without an archive library. URLs are
//! fetched one at a time, in order; a URL that fails is skipped and counted
//! instead of aborting the batch.
//!
//! ## Features
//!
//! - Build a ZIP archive from a list of HTTP/HTTPS URLs
//! - Collision-free, filesystem-safe names derived from URLs and content types
//! - Progress events per URL and a single terminal event per export
//! - Download-only batches and single-file downloads
//! - Eligibility probe via `HEAD` requests, gated by enabled extensions
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mediazip::{ArchiveRequest, Exporter, HttpFetcher, LocalDelivery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(30))?);
//!     let delivery = Arc::new(LocalDelivery::new("downloads"));
//!     let exporter = Exporter::new(fetcher, delivery, "mediazip");
//!
//!     let request = ArchiveRequest::new(
//!         vec!["https://example.com/cat.png".to_string()],
//!         Some("https://example.com/gallery".to_string()),
//!         "images",
//!     );
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!     let export = exporter.export_zip(&request, &tx).await?;
//!     drop(tx);
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?}", event);
//!     }
//!     println!("{} ({} skipped)", export.file_name, export.skipped);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod naming;
pub mod zip;

pub use cli::Cli;
pub use config::Settings;
pub use error::{Error, Result};
pub use export::{ArchiveExport, DownloadSummary, ExportEvent, Exporter};
pub use io::{Deliver, Delivery, DownloadId, Fetch, HttpFetcher, LocalDelivery, Resource};
pub use zip::{ArchiveBuilder, ArchiveRequest, ArchiveResult, Progress};
