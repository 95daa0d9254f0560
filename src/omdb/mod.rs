//! OMDB collector: look up every title of a movie list and flatten the answers.
//!
//! - [`client`]: HTTP client for the OMDB API
//! - [`flatten`]: turns a JSON response into a [`FlatRecord`](crate::models::FlatRecord)
//!
//! Titles are looked up one after another. A failed lookup never aborts the
//! batch; the title is recorded in [`CollectReport::failed`] and its row is
//! written with only the `query` column filled.

pub mod client;
pub mod flatten;

use crate::http::Fetch;
use crate::models::{CollectReport, MovieRow};
use crate::utils::render_progress;
use client::OmdbClient;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, error, info, instrument, warn};

const PROGRESS_BAR_LENGTH: usize = 50;

/// Query OMDB for each title in order.
///
/// Titles present in `overrides` are looked up by IMDb id instead of by title.
#[instrument(level = "info", skip_all, fields(total = titles.len()))]
pub async fn collect<F: Fetch>(
    client: &OmdbClient<F>,
    titles: &[String],
    overrides: &BTreeMap<String, String>,
    progress: bool,
) -> CollectReport {
    let total = titles.len();

    let rows: Vec<MovieRow> = stream::iter(titles.iter().enumerate())
        .then(|(i, title)| async move {
            if progress {
                let mut stderr = std::io::stderr().lock();
                let _ = write!(
                    stderr,
                    "\r{} {}\x1b[K",
                    render_progress(i + 1, total, PROGRESS_BAR_LENGTH),
                    title
                );
                if i + 1 == total {
                    let _ = writeln!(stderr);
                }
            }

            let lookup = match overrides.get(title) {
                Some(id) => {
                    debug!(index = i, %title, %id, "Looking up by IMDb id");
                    client.search_imdb_id(id).await
                }
                None => {
                    debug!(index = i, %title, "Looking up by title");
                    client.search(title, None).await
                }
            };

            let record = match lookup {
                Ok(Some(record)) => {
                    debug!(index = i, %title, columns = record.len(), "Flattened OMDB response");
                    Some(record)
                }
                Ok(None) => {
                    warn!(index = i, %title, "OMDB produced no record");
                    None
                }
                Err(e) => {
                    error!(index = i, %title, error = %e, "OMDB lookup failed; skipping");
                    None
                }
            };

            MovieRow {
                query: title.clone(),
                record,
            }
        })
        .collect()
        .await;

    let failed: Vec<String> = rows
        .iter()
        .filter(|row| row.record.is_none())
        .map(|row| row.query.clone())
        .collect();

    info!(
        total,
        successful = total - failed.len(),
        failed = failed.len(),
        "Completed OMDB lookups"
    );
    if !failed.is_empty() {
        warn!(titles = ?failed, "Titles without OMDB data");
    }

    CollectReport { rows, failed }
}
