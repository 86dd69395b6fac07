//! Export flows: building and delivering archives, individual downloads and
//! the eligibility probe.
//!
//! An archive export reports to its caller through an event channel: one
//! [`ExportEvent::Progress`] per URL followed by exactly one terminal
//! [`ExportEvent::Done`] or [`ExportEvent::Failed`].

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::io::{Deliver, Delivery, DownloadId, Fetch};
use crate::naming::{name_from_url, sanitize, unique_names};
use crate::zip::{ArchiveBuilder, ArchiveRequest, Progress};

pub const ZIP_MIME_TYPE: &str = "application/zip";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Name used by [`Exporter::download_one`] when the URL has no usable segment
pub const DEFAULT_SINGLE_NAME: &str = "video.mp4";

/// Event stream of an archive export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    Progress {
        processed: usize,
        total: usize,
        skipped: usize,
    },
    Done {
        download_id: DownloadId,
        skipped: usize,
    },
    Failed {
        error: String,
    },
}

impl From<Progress> for ExportEvent {
    fn from(p: Progress) -> Self {
        ExportEvent::Progress {
            processed: p.processed,
            total: p.total,
            skipped: p.skipped,
        }
    }
}

/// Outcome of a delivered archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveExport {
    pub download_id: DownloadId,
    pub file_name: String,
    pub entries: usize,
    pub skipped: usize,
}

/// Outcome of a download-only batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub failed: usize,
}

/// Ties a fetcher and a delivery adapter together
pub struct Exporter<F: Fetch, D: Deliver> {
    fetcher: Arc<F>,
    delivery: Arc<D>,
    app_root: String,
}

impl<F: Fetch, D: Deliver> Exporter<F, D> {
    pub fn new(fetcher: Arc<F>, delivery: Arc<D>, app_root: impl Into<String>) -> Self {
        Self {
            fetcher,
            delivery,
            app_root: app_root.into(),
        }
    }

    /// Build an archive for `request` and hand it to the delivery adapter.
    ///
    /// Progress and the terminal event are sent on `events`; a closed
    /// receiver does not stop the export. Only a delivery failure is returned
    /// as an error, after the matching [`ExportEvent::Failed`] was sent.
    pub async fn export_zip(
        &self,
        request: &ArchiveRequest,
        events: &UnboundedSender<ExportEvent>,
    ) -> Result<ArchiveExport> {
        let builder = ArchiveBuilder::new(self.fetcher.clone(), self.app_root.clone());
        let archive = builder
            .build(request, |p| {
                let _ = events.send(p.into());
            })
            .await;

        let delivered = self
            .delivery
            .deliver(Delivery {
                bytes: &archive.bytes,
                mime_type: ZIP_MIME_TYPE,
                file_name: &archive.file_name,
            })
            .await;

        match delivered {
            Ok(download_id) => {
                let _ = events.send(ExportEvent::Done {
                    download_id,
                    skipped: archive.skipped,
                });
                Ok(ArchiveExport {
                    download_id,
                    file_name: archive.file_name,
                    entries: archive.entries,
                    skipped: archive.skipped,
                })
            }
            Err(e) => {
                tracing::warn!(file_name = %archive.file_name, error = %e, "archive delivery failed");
                let _ = events.send(ExportEvent::Failed {
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Fetch and deliver every URL as its own file.
    ///
    /// Files land in `<root>/<host>/<kind>/` under names assigned before any
    /// fetch. A failed URL is counted and the batch continues.
    pub async fn download_many(&self, request: &ArchiveRequest) -> DownloadSummary {
        let folder = format!("{}/{}/{}", self.app_root, request.hostname(), request.kind());
        let names = unique_names(request.urls(), request.fallback_prefix());

        let mut summary = DownloadSummary::default();
        for (url, name) in request.urls().iter().zip(&names) {
            let file_name = format!("{folder}/{name}");
            match self.fetch_and_deliver(url, &file_name).await {
                Ok(id) => {
                    summary.downloaded += 1;
                    tracing::debug!(url = %url, id = %id, "downloaded");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(url = %url, error = %e, "download failed");
                }
            }
        }
        summary
    }

    /// Fetch and deliver a single URL.
    ///
    /// Without `file_name`, the URL's last path segment is used, or
    /// [`DEFAULT_SINGLE_NAME`] when it has none.
    pub async fn download_one(&self, url: &str, file_name: Option<&str>) -> Result<DownloadId> {
        let name = match file_name {
            Some(name) => sanitize(name),
            None => name_from_url(url, DEFAULT_SINGLE_NAME),
        };
        self.fetch_and_deliver(url, &name).await
    }

    async fn fetch_and_deliver(&self, url: &str, file_name: &str) -> Result<DownloadId> {
        let resource = self.fetcher.fetch(url).await?;
        let mime_type = resource
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_MIME_TYPE);
        let id = self
            .delivery
            .deliver(Delivery {
                bytes: &resource.bytes,
                mime_type,
                file_name,
            })
            .await?;
        Ok(id)
    }

    /// Size of `url` if its extension is enabled and a `HEAD` probe succeeds.
    pub async fn probe(&self, url: &str, settings: &Settings) -> Result<u64> {
        let extension = Settings::url_extension(url).ok_or_else(|| Error::InvalidUrl {
            url: url.to_string(),
        })?;
        if !settings.is_extension_enabled(&extension) {
            return Err(Error::ExtensionDisabled { extension });
        }
        Ok(self.fetcher.probe(url).await?)
    }

    /// Whether `url` should be offered for export: enabled extension and a
    /// positive reported size.
    pub async fn is_eligible(&self, url: &str, settings: &Settings) -> bool {
        match self.probe(url, settings).await {
            Ok(size) => size > 0,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "not eligible");
                false
            }
        }
    }
}
