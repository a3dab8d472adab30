//! Photo ingest tool
//!
//! Walks a photo directory, derives quiz metadata from the file layout and
//! names, and loads the rows into `ClickHouse`. A photo directly inside a
//! first-level subdirectory is tagged with that directory name as its city;
//! a standalone `YYYYMMDD` run in the file name yields its year.

use std::path::Path;

use clap::Parser;
use clickhouse_lib::{ClickhouseWriter, PhotoRow};
use config::IngestOpts;
use dotenvy::dotenv;
use regex::Regex;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Extract a year from the first standalone 8-digit date in a file name.
/// Runs shorter or longer than 8 digits are ignored, as are dates before
/// 1970.
fn extract_year(digit_runs: &Regex, file_name: &str) -> Option<u16> {
    digit_runs
        .find_iter(file_name)
        .filter(|run| run.as_str().len() == 8)
        .filter_map(|run| run.as_str()[..4].parse::<u16>().ok())
        .find(|year| *year >= 1970)
}

/// City for a photo: the name of its first-level subdirectory, if the photo
/// sits directly inside one.
fn city_for(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel.components().collect();
    if parts.len() == 2 {
        parts[0].as_os_str().to_str().map(ToOwned::to_owned)
    } else {
        None
    }
}

fn collect_photos(dir: &Path) -> eyre::Result<(Vec<PhotoRow>, usize)> {
    let digit_runs = Regex::new(r"\d+")?;
    let mut photos = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_image_file(path) {
            warn!(file = %path.display(), "skipping non-image file");
            skipped += 1;
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let year = extract_year(&digit_runs, &name);
        let city = city_for(dir, path);
        photos.push(PhotoRow {
            name,
            year,
            city,
            year_options: Vec::new(),
            city_options: Vec::new(),
        });
    }

    Ok((photos, skipped))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opts = IngestOpts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (photos, skipped) = collect_photos(&opts.photos_dir)?;
    if photos.is_empty() {
        info!(dir = %opts.photos_dir.display(), "no image files found; nothing to ingest");
        return Ok(());
    }

    let writer = ClickhouseWriter::new(
        opts.clickhouse.url.clone(),
        opts.clickhouse.db.clone(),
        opts.clickhouse.username.clone(),
        opts.clickhouse.password.clone(),
    )?;
    writer.init_db(opts.drop).await?;
    let inserted = writer.insert_photos(&photos).await?;

    info!(inserted, skipped, "photo ingest complete");
    Ok(())
}
