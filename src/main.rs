//! Main entry point for the mediazip CLI application.
//!
//! This binary fetches media URLs and delivers them to a local directory,
//! either packed into one ZIP archive or as individual files.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mediazip::cli::{BatchArgs, Command};
use mediazip::{ArchiveRequest, Cli, ExportEvent, Exporter, HttpFetcher, LocalDelivery, Settings};

/// Application entry point.
///
/// Parses command-line arguments, loads settings and dispatches to the
/// handler of the selected subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.output_dir {
        settings.output_dir = dir.clone();
    }

    let fetcher = Arc::new(HttpFetcher::new(settings.timeout())?);
    let delivery = Arc::new(LocalDelivery::new(settings.output_dir.clone()));
    let exporter = Exporter::new(fetcher.clone(), delivery, settings.app_root.clone());

    match &cli.command {
        Command::Zip { batch, json } => export_zip(&exporter, batch, *json, &cli).await?,
        Command::Download { batch } => download_many(&exporter, batch, &cli).await?,
        Command::Get { url, name } => {
            let id = exporter.download_one(url, name.as_deref()).await?;
            if !cli.is_quiet() {
                println!("saved {} (download #{})", url, id);
            }
        }
        Command::Probe { url } => {
            let size = exporter.probe(url, &settings).await?;
            if size == 0 {
                bail!("{} reports no content length", url);
            }
            println!("{}", size);
        }
    }

    // Display network transfer statistics
    if !cli.is_quiet() {
        eprintln!(
            "Total bytes transferred: {}",
            format_size(fetcher.transferred_bytes())
        );
    }

    Ok(())
}

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the level derived from `-q`/`-v`.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mediazip={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build and deliver a ZIP archive.
///
/// Protocol events are consumed on a separate task while the archive is
/// built: as JSON lines on stdout with `--json`, as human-readable progress
/// on stderr otherwise.
///
/// # Returns
///
/// Returns `Ok(())` once the archive was delivered, or an error if the
/// delivery adapter rejected it.
async fn export_zip(
    exporter: &Exporter<HttpFetcher, LocalDelivery>,
    batch: &BatchArgs,
    json: bool,
    cli: &Cli,
) -> Result<()> {
    let request = ArchiveRequest::new(batch.collect_urls()?, batch.page_url.clone(), &batch.kind);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let show_progress = !cli.is_quiet();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!(error = %e, "failed to encode event"),
                }
            } else if show_progress {
                if let ExportEvent::Progress {
                    processed,
                    total,
                    skipped,
                } = event
                {
                    eprintln!("  fetched {}/{} ({} skipped)", processed, total, skipped);
                }
            }
        }
    });

    let result = exporter.export_zip(&request, &tx).await;
    drop(tx);
    printer.await?;

    let export = result?;
    if !cli.is_very_quiet() && !json {
        println!(
            "{}: {} files, {} skipped (download #{})",
            export.file_name, export.entries, export.skipped, export.download_id
        );
    }
    Ok(())
}

/// Fetch and deliver every URL as an individual file.
///
/// # Returns
///
/// Returns `Ok(())` even if some URLs failed; the failures are counted in
/// the printed summary.
async fn download_many(
    exporter: &Exporter<HttpFetcher, LocalDelivery>,
    batch: &BatchArgs,
    cli: &Cli,
) -> Result<()> {
    let request = ArchiveRequest::new(batch.collect_urls()?, batch.page_url.clone(), &batch.kind);
    let summary = exporter.download_many(&request).await;

    if !cli.is_very_quiet() {
        println!(
            "downloaded {} files, {} failed",
            summary.downloaded, summary.failed
        );
    }
    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
