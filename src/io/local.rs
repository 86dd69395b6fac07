use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{Deliver, Delivery, DownloadId};
use crate::error::DeliveryError;

/// Maximum number of " (n)" suffixes tried before giving up on a target
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Delivery adapter writing files below a local directory
///
/// Existing files are never overwritten: the new file gets a ` (n)` suffix,
/// the way browser download managers uniquify targets.
pub struct LocalDelivery {
    root: PathBuf,
    next_id: AtomicU64,
}

impl LocalDelivery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Resolve a `/`-separated relative name below the root.
    fn target_path(&self, file_name: &str) -> Result<PathBuf, DeliveryError> {
        let relative = Path::new(file_name);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if file_name.is_empty() || !is_plain {
            return Err(DeliveryError::InvalidPath {
                path: relative.to_path_buf(),
            });
        }
        Ok(self.root.join(relative))
    }
}

/// Create the first file derived from `path` that does not exist yet.
///
/// Files are opened with `create_new`, so a name taken between two attempts
/// moves on to the next ` (n)` suffix instead of truncating someone else's
/// file.
async fn create_unique(path: &Path) -> Result<(PathBuf, fs::File), DeliveryError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    for i in 0..=MAX_RENAME_ATTEMPTS {
        let candidate = match (i, &extension) {
            (0, _) => path.to_path_buf(),
            (_, Some(ext)) => path.with_file_name(format!("{} ({}).{}", stem, i, ext)),
            (_, None) => path.with_file_name(format!("{} ({})", stem, i)),
        };
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(DeliveryError::Unavailable(format!(
        "no free file name for {}",
        path.display()
    )))
}

#[async_trait]
impl Deliver for LocalDelivery {
    async fn deliver(&self, delivery: Delivery<'_>) -> Result<DownloadId, DeliveryError> {
        let target = self.target_path(delivery.file_name)?;

        // Create parent directories if needed
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let (target, mut file) = create_unique(&target).await?;
        file.write_all(delivery.bytes).await?;
        file.flush().await?;

        let id = DownloadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            id = %id,
            path = %target.display(),
            mime_type = delivery.mime_type,
            len = delivery.bytes.len(),
            "delivered file"
        );
        Ok(id)
    }
}
