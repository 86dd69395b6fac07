use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediazip")]
#[command(version)]
#[command(about = "Fetch media URLs into a ZIP archive or individual files", long_about = None)]
#[command(after_help = "Examples:\n  \
  mediazip zip -k images -p https://example.com/gallery https://example.com/a.png https://example.com/b.jpg\n  \
  mediazip download -i urls.txt -d ~/Downloads\n  \
  mediazip probe https://example.com/clip.mp4")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory delivered files are written into
    #[arg(short = 'd', long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    /// More log output (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch URLs and deliver them as one ZIP archive
    Zip {
        #[command(flatten)]
        batch: BatchArgs,

        /// Print protocol events as JSON lines on stdout
        #[arg(long)]
        json: bool,
    },

    /// Fetch URLs and deliver each as its own file
    Download {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Fetch and deliver a single URL
    Get {
        /// Resource URL
        #[arg(value_name = "URL")]
        url: String,

        /// File name to save as (default: last path segment)
        #[arg(short = 'n', long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Check whether a URL is eligible for export and print its size
    Probe {
        /// Resource URL
        #[arg(value_name = "URL")]
        url: String,
    },
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Resource URLs
    #[arg(value_name = "URLS")]
    pub urls: Vec<String>,

    /// Read more URLs from a file, one per line
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Page the URLs were found on (used for naming)
    #[arg(short = 'p', long, value_name = "URL")]
    pub page_url: Option<String>,

    /// Kind of media, seeds the archive name and folder
    #[arg(short = 'k', long, default_value = "files")]
    pub kind: String,
}

impl BatchArgs {
    /// URLs from the command line followed by those from `--input`.
    pub fn collect_urls(&self) -> std::io::Result<Vec<String>> {
        let mut urls = self.urls.clone();
        if let Some(path) = &self.input {
            let content = std::fs::read_to_string(path)?;
            urls.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(urls)
    }
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => "error",
            (1, _) => "warn",
            (_, 0) => "info",
            (_, 1) => "debug",
            _ => "trace",
        }
    }
}
