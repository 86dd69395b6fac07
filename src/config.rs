//! Settings snapshot loaded once at startup.
//!
//! All fields are optional in the JSON file; missing ones take the defaults
//! below. The archive builder never reads settings directly: only the
//! eligibility probe consults `enabled_extensions`, and the app root and
//! timeout are handed to the components that need them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Default top-level folder for delivered files
pub const DEFAULT_APP_ROOT: &str = "mediazip";

/// Extensions enabled when no settings file overrides them
pub const DEFAULT_EXTENSIONS: &[&str] = &["html", "htm", "mp4", "pdf", "jpg", "png"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// First path component of every delivered file
    pub app_root: String,
    /// Directory the local delivery adapter writes into
    pub output_dir: PathBuf,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Extension (lowercase, no dot) to enabled flag
    pub enabled_extensions: BTreeMap<String, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_root: DEFAULT_APP_ROOT.to_string(),
            output_dir: PathBuf::from("."),
            timeout_secs: 30,
            enabled_extensions: DEFAULT_EXTENSIONS
                .iter()
                .map(|ext| (ext.to_string(), true))
                .collect(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }
        let root = Path::new(&self.app_root);
        if self.app_root.is_empty() || root.is_absolute() || self.app_root.contains("..") {
            return Err(Error::Config {
                message: format!("app_root must be a relative folder name, got '{}'", self.app_root),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Lowercased text after the last `.` of the URL path.
    ///
    /// A path without a dot yields the whole path, which never matches an
    /// enabled extension.
    pub fn url_extension(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        parsed
            .path()
            .rsplit('.')
            .next()
            .map(|ext| ext.to_lowercase())
    }

    /// Whether `extension` is explicitly enabled.
    pub fn is_extension_enabled(&self, extension: &str) -> bool {
        self.enabled_extensions
            .get(extension)
            .copied()
            .unwrap_or(false)
    }
}
