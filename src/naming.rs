//! File naming: sanitizing URL-derived names, resolving collisions and
//! composing the suggested archive path.

use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

/// Name used when sanitizing leaves nothing behind
pub const FALLBACK_NAME: &str = "file";

/// Host segment used when no URL yields a hostname
pub const FALLBACK_HOST: &str = "page";

/// Longest sanitized name, in characters
pub const MAX_NAME_CHARS: usize = 160;

static RESERVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]+"#).expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Make `name` safe to use as a single path component.
///
/// Percent-encoding is decoded when it forms valid UTF-8. Runs of reserved
/// characters (`\ / : * ? " < > |`) become one `_`, runs of whitespace one
/// space. The result is trimmed, never empty, and at most
/// [`MAX_NAME_CHARS`] characters long.
pub fn sanitize(name: &str) -> String {
    let decoded = urlencoding::decode(name).unwrap_or(std::borrow::Cow::Borrowed(name));
    let replaced = RESERVED.replace_all(&decoded, "_");
    let collapsed = WHITESPACE.replace_all(&replaced, " ");

    let mut s = collapsed.trim();
    if s.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if let Some((cut, _)) = s.char_indices().nth(MAX_NAME_CHARS) {
        s = s[..cut].trim_end();
    }
    s.to_string()
}

/// Split `name` at its last dot into `(base, ext)`, where `ext` keeps the dot.
///
/// A dot in the first or last position does not start an extension:
/// `.bashrc` and `archive.` have none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && i < name.len() - 1 => name.split_at(i),
        _ => (name, ""),
    }
}

/// Derive a file name from the last path segment of `url`.
///
/// Falls back to `fallback` when the URL does not parse or its last segment
/// is empty.
pub fn name_from_url(url: &str, fallback: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return fallback.to_string();
    };
    match parsed.path().rsplit('/').next() {
        Some(last) if !last.is_empty() => sanitize(last),
        _ => fallback.to_string(),
    }
}

/// Case-insensitive name allocator scoped to one batch.
///
/// The first claim of a name returns it unchanged; the n-th claim of the same
/// name returns `base-n.ext`. Every name handed out is reserved, so a suffixed
/// name can never collide with a later literal one.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claims: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name `candidate` would receive from [`assign`](Self::assign), without
    /// claiming it.
    pub fn peek(&self, candidate: &str) -> String {
        self.resolve(candidate).0
    }

    /// Claim `candidate`, returning the unique name to use for it.
    pub fn assign(&mut self, candidate: &str) -> String {
        let (name, n) = self.resolve(candidate);
        self.issued.insert(name.to_lowercase());
        self.claims.insert(candidate.to_lowercase(), n);
        name
    }

    fn resolve(&self, candidate: &str) -> (String, usize) {
        let (base, ext) = split_extension(candidate);
        let mut n = self
            .claims
            .get(&candidate.to_lowercase())
            .copied()
            .unwrap_or(0)
            + 1;
        loop {
            let name = if n > 1 {
                format!("{base}-{n}{ext}")
            } else {
                candidate.to_string()
            };
            if !self.issued.contains(&name.to_lowercase()) {
                return (name, n);
            }
            n += 1;
        }
    }
}

/// Assign a unique name to every URL, in input order.
///
/// URLs without a usable path segment are named `{prefix}-{index}` with a
/// 1-based index.
pub fn unique_names<S: AsRef<str>>(urls: &[S], prefix: &str) -> Vec<String> {
    let mut registry = NameRegistry::new();
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            let candidate = name_from_url(url.as_ref(), &format!("{prefix}-{}", i + 1));
            registry.assign(&candidate)
        })
        .collect()
}

/// Whether `segment` is made only of dots (`.`, `..`, ...), which a
/// filesystem treats as a relative reference rather than a folder name.
pub fn is_dot_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c == '.')
}

/// Map a `Content-Type` header value to a file extension (with the dot).
///
/// Parameters such as `; charset=...` are ignored. Unknown types yield `None`.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        "image/svg+xml" => Some(".svg"),
        "image/avif" => Some(".avif"),
        _ => None,
    }
}

/// Append `ext` unless `name` already has an extension.
pub fn ensure_extension(name: &str, ext: &str) -> String {
    let (_, current) = split_extension(name);
    if current.is_empty() {
        format!("{name}{ext}")
    } else {
        name.to_string()
    }
}

/// Hostname used to group deliveries from one page.
///
/// Tries `page_url`, then `fallback_url`, then [`FALLBACK_HOST`]. The result
/// is sanitized so it can be used as a path component; a host made only of
/// dots is ignored.
pub fn page_hostname(page_url: Option<&str>, fallback_url: Option<&str>) -> String {
    [page_url, fallback_url]
        .into_iter()
        .flatten()
        .filter_map(|u| Url::parse(u).ok())
        .find_map(|u| {
            u.host_str()
                .filter(|h| !h.is_empty())
                .map(sanitize)
                .filter(|h| !is_dot_segment(h))
        })
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}

/// Compact local timestamp: `YYYYMMDD-HHMMSS`.
pub fn compact_timestamp(at: &NaiveDateTime) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// Suggested archive path: `<root>/<host>/<kind>-<YYYYMMDD-HHMMSS>.zip`.
pub fn archive_file_name(root: &str, host: &str, kind: &str, at: &NaiveDateTime) -> String {
    format!("{root}/{host}/{kind}-{}.zip", compact_timestamp(at))
}
