//! # movie_wager_data
//!
//! Two batch collectors for box-office research, exposed as subcommands:
//!
//! - **`smw`** scrapes the yearly Summer Movie Wager leaderboards and writes
//!   one CSV row per film and year.
//! - **`omdb`** looks every title of a movie list up on the OMDB API and
//!   flattens each JSON answer into a CSV row (genres, writers and actors
//!   become one-hot columns, box office is reported in millions).
//!
//! ## Usage
//!
//! ```sh
//! movie_wager_data smw -o ./data/smw.csv
//! movie_wager_data omdb -a YOUR_KEY -m ./data/smw.csv -o ./data/omdb.csv
//! ```
//!
//! ## Pipeline
//!
//! 1. **Input**: a year range or a movie list
//! 2. **Fetching**: sequential HTTP requests with retry and backoff
//! 3. **Flattening**: each page or response becomes one or more flat records
//! 4. **Output**: a delimited CSV file

use chrono::{Datelike, Local};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod cli;
mod config;
mod http;
mod inputs;
mod models;
mod omdb;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command, OmdbArgs, SmwArgs};
use config::{Settings, load_settings};
use http::HttpFetcher;
use omdb::client::OmdbClient;
use outputs::tables;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("movie_wager_data starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.command, "Parsed CLI arguments");

    let settings = load_settings(args.config.as_deref()).await?;

    let result = match &args.command {
        Command::Omdb(omdb_args) => run_omdb(omdb_args, &settings).await,
        Command::Smw(smw_args) => run_smw(smw_args, &settings).await,
    };
    if let Err(e) = &result {
        error!(error = %e, "Run failed");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    result
}

#[instrument(level = "info", skip_all, fields(movies = %args.movies.display(), output = %args.output.display()))]
async fn run_omdb(args: &OmdbArgs, settings: &Settings) -> Result<(), Box<dyn Error>> {
    // Early check: fail before spending API quota
    ensure_writable_parent(&args.output).await?;

    let titles = inputs::read_movie_titles(&args.movies, args.delimiter)?;
    let fetcher = HttpFetcher::new(settings.request_timeout(), false)?;
    let client = OmdbClient::new(&fetcher, args.apikey.as_str(), &settings.omdb_url, settings.retry)?;

    let report = omdb::collect(&client, &titles, &settings.imdb_overrides, !args.no_progress).await;

    tables::write_movie_rows(&args.output, args.delimiter, &report.rows)?;
    info!(
        rows = report.rows.len(),
        failed = report.failed.len(),
        path = %args.output.display(),
        "OMDB table written"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(output = %args.output.display()))]
async fn run_smw(args: &SmwArgs, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let years = args.years()?;
    let current_year = Local::now().year();
    if i32::from(*years.end()) > current_year {
        warn!(end_year = *years.end(), current_year, "End year lies in the future; those pages will be empty");
    }

    ensure_writable_parent(&args.output).await?;

    let base_url = Url::parse(&settings.smw_url)?;
    let fetcher = HttpFetcher::new(settings.request_timeout(), args.insecure)?;
    let entries = scrapers::smw::scrape_years(&fetcher, &base_url, years, &settings.retry).await;

    tables::write_box_office(&args.output, args.delimiter, &entries)?;
    info!(rows = entries.len(), path = %args.output.display(), "Box office table written");
    Ok(())
}
