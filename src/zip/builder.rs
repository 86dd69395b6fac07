//! Sequential fetch-and-pack pipeline producing a complete archive in memory.

use chrono::Local;
use serde::Serialize;
use std::sync::Arc;

use crate::error::EntryError;
use crate::io::Fetch;
use crate::naming::{
    archive_file_name, ensure_extension, extension_for_content_type, is_dot_segment,
    page_hostname, sanitize, unique_names, NameRegistry,
};

use super::writer::ArchiveWriter;

/// Kind used when a request does not name one
pub const DEFAULT_KIND: &str = "files";

/// What to pack: source URLs plus the context used to name the result
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    urls: Vec<String>,
    page_url: Option<String>,
    kind: String,
}

impl ArchiveRequest {
    /// Empty URLs are dropped; a blank kind, or one made only of dots,
    /// becomes [`DEFAULT_KIND`].
    pub fn new(urls: Vec<String>, page_url: Option<String>, kind: &str) -> Self {
        let urls = urls.into_iter().filter(|u| !u.is_empty()).collect();
        let kind = match sanitize(kind) {
            k if kind.trim().is_empty() || is_dot_segment(&k) => DEFAULT_KIND.to_string(),
            k => k,
        };
        Self {
            urls,
            page_url,
            kind,
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn page_url(&self) -> Option<&str> {
        self.page_url.as_deref()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Base for names of URLs without a usable path segment.
    pub fn fallback_prefix(&self) -> &'static str {
        if self.kind == "images" { "image" } else { "file" }
    }

    /// Host folder that groups everything delivered for this request.
    pub fn hostname(&self) -> String {
        page_hostname(self.page_url(), self.urls.first().map(String::as_str))
    }
}

/// Progress after one URL has been handled, successfully or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub skipped: usize,
}

/// A finished archive
#[derive(Debug)]
pub struct ArchiveResult {
    pub bytes: Vec<u8>,
    /// Suggested relative path, `<root>/<host>/<kind>-<timestamp>.zip`
    pub file_name: String,
    pub entries: usize,
    pub skipped: usize,
}

/// Builds ZIP archives from remote resources.
///
/// URLs are handled strictly one after another: every local header offset
/// depends on the length of all records before it, and progress must be
/// reported in input order.
pub struct ArchiveBuilder<F: Fetch> {
    fetcher: Arc<F>,
    app_root: String,
}

impl<F: Fetch> ArchiveBuilder<F> {
    pub fn new(fetcher: Arc<F>, app_root: impl Into<String>) -> Self {
        Self {
            fetcher,
            app_root: app_root.into(),
        }
    }

    /// Fetch every URL of `request` and pack the successful ones.
    ///
    /// `on_progress` is called exactly once per URL, in input order. Per-URL
    /// failures are counted in [`ArchiveResult::skipped`] and never abort the
    /// build, so an empty or fully failed request still yields a valid,
    /// zero-entry archive.
    pub async fn build<P>(&self, request: &ArchiveRequest, mut on_progress: P) -> ArchiveResult
    where
        P: FnMut(Progress) + Send,
    {
        let urls = request.urls();
        let total = urls.len();
        let names = unique_names(urls, request.fallback_prefix());

        let mut registry = NameRegistry::new();
        let mut writer = ArchiveWriter::new();
        let mut skipped = 0;

        for (index, (url, name)) in urls.iter().zip(&names).enumerate() {
            match self.add_entry(&mut writer, &mut registry, url, name).await {
                Ok(file_name) => {
                    tracing::debug!(url = %url, file_name = %file_name, "added archive entry");
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(url = %url, error = %e, "skipping archive entry");
                }
            }

            on_progress(Progress {
                processed: index + 1,
                total,
                skipped,
            });
        }

        let entries = writer.len();
        let bytes = writer.finish();
        let file_name = archive_file_name(
            &self.app_root,
            &request.hostname(),
            request.kind(),
            &Local::now().naive_local(),
        );

        tracing::info!(
            file_name = %file_name,
            entries,
            skipped,
            len = bytes.len(),
            "archive built"
        );

        ArchiveResult {
            bytes,
            file_name,
            entries,
            skipped,
        }
    }

    /// Fetch one URL, resolve its final name and append it to `writer`.
    async fn add_entry(
        &self,
        writer: &mut ArchiveWriter,
        registry: &mut NameRegistry,
        url: &str,
        name: &str,
    ) -> Result<String, EntryError> {
        let resource = self.fetcher.fetch(url).await?;

        let inferred = resource
            .content_type
            .as_deref()
            .and_then(extension_for_content_type)
            .unwrap_or("");
        let candidate = sanitize(&ensure_extension(name, inferred));
        append(writer, registry, &candidate, &resource.bytes)
    }
}

/// Add `data` under the unique name for `candidate`.
///
/// The name is only claimed once the writer accepted the entry, so a rejected
/// entry does not push later collisions to a suffix.
fn append(
    writer: &mut ArchiveWriter,
    registry: &mut NameRegistry,
    candidate: &str,
    data: &[u8],
) -> Result<String, EntryError> {
    let file_name = registry.peek(candidate);
    writer.add_entry(&file_name, data)?;
    registry.assign(candidate);
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::io::Resource;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};
    use std::sync::Mutex;

    enum Reply {
        Body(&'static [u8], Option<&'static str>),
        Status(u16),
        Empty,
    }

    #[derive(Default)]
    struct MockFetcher {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn with(mut self, url: &str, reply: Reply) -> Self {
            self.replies.insert(url.to_string(), reply);
            self
        }
    }

    #[async_trait]
    impl Fetch for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Resource, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.replies.get(url) {
                Some(Reply::Body(bytes, content_type)) => Ok(Resource {
                    bytes: bytes.to_vec(),
                    content_type: content_type.map(str::to_string),
                }),
                Some(Reply::Status(code)) => Err(FetchError::Status(*code)),
                Some(Reply::Empty) | None => Err(FetchError::EmptyBody),
            }
        }

        async fn probe(&self, _url: &str) -> Result<u64, FetchError> {
            Ok(0)
        }
    }

    fn request(urls: &[&str], kind: &str) -> ArchiveRequest {
        ArchiveRequest::new(
            urls.iter().map(|u| u.to_string()).collect(),
            Some("https://gallery.test/page".to_string()),
            kind,
        )
    }

    async fn build(fetcher: MockFetcher, req: &ArchiveRequest) -> (ArchiveResult, Vec<Progress>) {
        let builder = ArchiveBuilder::new(Arc::new(fetcher), "root");
        let mut events = Vec::new();
        let result = builder.build(req, |p| events.push(p)).await;
        (result, events)
    }

    fn le16(b: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([b[at], b[at + 1]])
    }

    fn le32(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    /// (entry count from both EOCD fields, local header offsets from the central directory)
    fn central_directory(bytes: &[u8]) -> ((u16, u16), Vec<u32>) {
        let eocd = bytes.len() - 22;
        assert_eq!(le32(bytes, eocd), 0x06054b50);
        let counts = (le16(bytes, eocd + 8), le16(bytes, eocd + 10));
        let mut pos = le32(bytes, eocd + 16) as usize;

        let mut offsets = Vec::new();
        for _ in 0..counts.1 {
            assert_eq!(le32(bytes, pos), 0x02014b50);
            offsets.push(le32(bytes, pos + 42));
            pos += 46 + le16(bytes, pos + 28) as usize;
        }
        assert_eq!(pos, eocd);
        (counts, offsets)
    }

    fn read_all(bytes: Vec<u8>) -> Vec<(String, Vec<u8>, u32)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content, file.crc32())
            })
            .collect()
    }

    #[tokio::test]
    async fn packs_every_successful_fetch() {
        let fetcher = MockFetcher::default()
            .with("https://a.test/one.png", Reply::Body(b"first", None))
            .with("https://a.test/two.gif", Reply::Body(b"second!", None))
            .with("https://a.test/three", Reply::Body(b"3", None));
        let req = request(
            &["https://a.test/one.png", "https://a.test/two.gif", "https://a.test/three"],
            "images",
        );

        let (result, events) = build(fetcher, &req).await;

        assert_eq!(result.entries, 3);
        assert_eq!(result.skipped, 0);
        let ((disk, total), offsets) = central_directory(&result.bytes);
        assert_eq!((disk, total), (3, 3));
        assert_eq!(
            offsets,
            vec![0, 30 + 7 + 5, (30 + 7 + 5) + (30 + 7 + 7)]
        );

        let files = read_all(result.bytes);
        assert_eq!(files[0].0, "one.png");
        assert_eq!(files[1].1, b"second!");
        assert_eq!(files[2].0, "three");
        for (_, content, crc) in &files {
            assert_eq!(*crc, crate::zip::crc32(content));
        }

        assert_eq!(
            events,
            (1..=3)
                .map(|processed| Progress { processed, total: 3, skipped: 0 })
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn failures_are_skipped_in_order() {
        let fetcher = MockFetcher::default()
            .with("https://a.test/ok1.png", Reply::Body(b"one", None))
            .with("https://a.test/404.png", Reply::Status(404))
            .with("https://a.test/empty.png", Reply::Empty)
            .with("https://a.test/ok2.png", Reply::Body(b"two", None));
        let req = request(
            &[
                "https://a.test/ok1.png",
                "https://a.test/404.png",
                "",
                "https://a.test/empty.png",
                "https://a.test/ok2.png",
            ],
            "files",
        );

        let (result, events) = build(fetcher, &req).await;

        assert_eq!(result.skipped, 2);
        assert_eq!(result.entries, 2);
        let skipped: Vec<_> = events.iter().map(|p| (p.processed, p.skipped)).collect();
        assert_eq!(skipped, vec![(1, 0), (2, 1), (3, 2), (4, 2)]);
        assert!(events.iter().all(|p| p.total == 4));

        let ((_, total), offsets) = central_directory(&result.bytes);
        assert_eq!(total, 2);
        assert_eq!(offsets, vec![0, 30 + 7 + 3]);

        let names: Vec<_> = read_all(result.bytes).into_iter().map(|f| f.0).collect();
        assert_eq!(names, vec!["ok1.png", "ok2.png"]);
    }

    #[tokio::test]
    async fn fetches_strictly_in_input_order() {
        let urls = ["https://a.test/3", "https://a.test/1", "https://a.test/2"];
        let mut fetcher = MockFetcher::default();
        for url in urls {
            fetcher = fetcher.with(url, Reply::Body(b"x", None));
        }
        let fetcher = Arc::new(fetcher);
        let builder = ArchiveBuilder::new(fetcher.clone(), "root");

        builder.build(&request(&urls, "files"), |_| {}).await;

        assert_eq!(*fetcher.calls.lock().unwrap(), urls.to_vec());
    }

    #[tokio::test]
    async fn colliding_names_get_numeric_suffixes() {
        let fetcher = MockFetcher::default()
            .with("https://a.test/x/cat.png", Reply::Body(b"1", None))
            .with("https://b.test/y/cat.png", Reply::Body(b"2", None))
            .with("https://c.test/z/Cat.png", Reply::Body(b"3", None));
        let req = request(
            &["https://a.test/x/cat.png", "https://b.test/y/cat.png", "https://c.test/z/Cat.png"],
            "images",
        );

        let (result, _) = build(fetcher, &req).await;

        let names: Vec<_> = read_all(result.bytes).into_iter().map(|f| f.0).collect();
        assert_eq!(names, vec!["cat.png", "cat-2.png", "Cat-3.png"]);
    }

    #[tokio::test]
    async fn content_type_fills_missing_extension() {
        let fetcher = MockFetcher::default()
            .with("https://a.test/photo.jpg", Reply::Body(b"1", Some("image/jpeg")))
            .with("https://a.test/photo", Reply::Body(b"2", Some("image/jpeg; q=1")))
            .with("https://a.test/clip.bin", Reply::Body(b"3", Some("image/png")))
            .with("https://a.test/", Reply::Body(b"4", Some("image/webp")))
            .with("https://a.test/raw", Reply::Body(b"5", Some("application/json")));
        let req = request(
            &[
                "https://a.test/photo.jpg",
                "https://a.test/photo",
                "https://a.test/clip.bin",
                "https://a.test/",
                "https://a.test/raw",
            ],
            "images",
        );

        let (result, _) = build(fetcher, &req).await;

        let names: Vec<_> = read_all(result.bytes).into_iter().map(|f| f.0).collect();
        assert_eq!(
            names,
            vec!["photo.jpg", "photo-2.jpg", "clip.bin", "image-4.webp", "raw"]
        );
    }

    #[tokio::test]
    async fn empty_request_yields_empty_archive() {
        let (result, events) = build(MockFetcher::default(), &request(&["", "  "], "")).await;

        assert_eq!(result.bytes.len(), 22);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.entries, 0);
        assert!(events.is_empty());
        assert_eq!(read_all(result.bytes).len(), 0);
        assert!(result.file_name.starts_with("root/gallery.test/files-"));
    }

    #[tokio::test]
    async fn suggested_name_layout() {
        let fetcher = MockFetcher::default();
        let req = ArchiveRequest::new(
            vec!["https://cdn.test/a.png".to_string()],
            None,
            "images",
        );

        let (result, _) = build(fetcher, &req).await;

        let name = result.file_name;
        let stamp = name
            .strip_prefix("root/cdn.test/images-")
            .and_then(|s| s.strip_suffix(".zip"))
            .unwrap();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'-');
        assert!(stamp.chars().enumerate().all(|(i, c)| i == 8 || c.is_ascii_digit()));
    }

    #[test]
    fn request_normalization() {
        let req = ArchiveRequest::new(
            vec![String::new(), "https://a.test/x.png".to_string()],
            None,
            "",
        );
        assert_eq!(req.urls(), ["https://a.test/x.png".to_string()]);
        assert_eq!(req.kind(), "files");
        assert_eq!(req.fallback_prefix(), "file");
        assert_eq!(req.hostname(), "a.test");

        let req = ArchiveRequest::new(vec![], None, "images");
        assert_eq!(req.fallback_prefix(), "image");
        assert_eq!(req.hostname(), "page");

        assert_eq!(ArchiveRequest::new(vec![], None, "a/b").kind(), "a_b");
        assert_eq!(ArchiveRequest::new(vec![], None, "..").kind(), "files");
        assert_eq!(ArchiveRequest::new(vec![], None, " . ").kind(), "files");
        assert_eq!(ArchiveRequest::new(vec![], None, ".videos").kind(), ".videos");
    }

    #[tokio::test]
    async fn whitespace_url_counts_and_is_skipped() {
        let fetcher =
            MockFetcher::default().with("https://a.test/x.png", Reply::Body(b"x", None));
        let req = request(&["https://a.test/x.png", "   "], "images");
        assert_eq!(req.urls().len(), 2);

        let (result, progress) = build(fetcher, &req).await;

        assert_eq!(result.entries, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(
            progress.last(),
            Some(&Progress {
                processed: 2,
                total: 2,
                skipped: 1
            })
        );
    }

    #[test]
    fn rejected_entry_does_not_claim_its_name() {
        let mut writer = ArchiveWriter::new();
        for _ in 0..u16::MAX {
            writer.add_entry("x", b"").unwrap();
        }
        let mut registry = NameRegistry::new();

        let err = append(&mut writer, &mut registry, "a.png", b"a").unwrap_err();
        assert!(matches!(err, EntryError::TooManyEntries));
        assert_eq!(registry.assign("a.png"), "a.png");
    }
}
