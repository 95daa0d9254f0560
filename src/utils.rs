//! Utility functions for string manipulation, progress display, and file system checks.
//!
//! - Column name building for flattened OMDB records
//! - String truncation and API key redaction for logging
//! - A terminal progress bar for long batches
//! - File system validation for output paths

use itertools::Itertools;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Join the whitespace-separated words of `s` with underscores.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(underscore_join("Sam Raimi"), "Sam_Raimi");
/// assert_eq!(underscore_join("  Science  Fiction "), "Science_Fiction");
/// ```
pub fn underscore_join(s: &str) -> String {
    s.split_whitespace().join("_")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Render `url` with the value of query parameter `key` masked.
pub fn redact_query_param(url: &Url, key: &str) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == key { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    if pairs.is_empty() {
        return redacted.to_string();
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Render a one-line progress bar.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(render_progress(1, 4, 8), "|==------| 25.0%");
/// ```
pub fn render_progress(iteration: usize, total: usize, bar_length: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        (iteration.min(total) as f64) / (total as f64)
    };
    let filled = (bar_length as f64 * ratio).round() as usize;
    format!(
        "|{}{}| {:.1}%",
        "=".repeat(filled),
        "-".repeat(bar_length - filled),
        ratio * 100.0
    )
}

/// Ensure the directory that will hold `path` exists and is writable.
///
/// Creates the parent directory if needed, then performs a write test by
/// creating and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).await?;

    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
