//! Summer Movie Wager leaderboard scraper.
//!
//! Each year has its own leaderboard page at `{base}?year=YYYY`. Every
//! `table.scoreboardpanel` on the page lists films as `tr.mw` rows with
//! `td.pos`, `td.name` and `td.result` cells.

use crate::config::RetrySettings;
use crate::http::{Fetch, get_with_backoff};
use crate::models::BoxOfficeEntry;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::ops::RangeInclusive;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static PANEL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.scoreboardpanel").unwrap());
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.mw").unwrap());
static NAME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td.name").unwrap());
static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td.result").unwrap());
static POS_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td.pos").unwrap());

static REVENUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());
static POSITION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{1,2}").unwrap());

/// The leaderboard page for one year.
#[derive(Debug, Clone)]
pub struct SmwPage {
    base_url: Url,
    year: u16,
}

impl SmwPage {
    pub fn new(base_url: &Url, year: u16) -> Self {
        Self {
            base_url: base_url.clone(),
            year,
        }
    }

    pub fn url(&self) -> Url {
        let kept: Vec<(String, String)> = self
            .base_url
            .query_pairs()
            .filter(|(k, _)| k != "year")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("year", &self.year.to_string());
        url
    }

    /// Download and parse the page.
    ///
    /// Transport failures and non-success statuses are logged and yield no
    /// entries.
    #[instrument(level = "info", skip_all, fields(year = self.year))]
    pub async fn fetch<F: Fetch>(&self, fetcher: &F, retry: &RetrySettings) -> Vec<BoxOfficeEntry> {
        let url = self.url();
        match get_with_backoff(fetcher, &url, retry).await {
            Ok(page) if page.is_success() => {
                let entries = parse_leaderboard(&page.body, self.year);
                info!(count = entries.len(), "Parsed SMW leaderboard");
                entries
            }
            Ok(page) => {
                error!(%url, status = %page.status, "SMW page request failed");
                Vec::new()
            }
            Err(e) => {
                error!(%url, error = %e, "Exception when retrieving the SMW page");
                Vec::new()
            }
        }
    }
}

/// Extract every leaderboard row of a page.
///
/// Rows with a missing cell or number are logged and skipped.
pub fn parse_leaderboard(html: &str, year: u16) -> Vec<BoxOfficeEntry> {
    let document = Html::parse_document(html);
    let mut result = Vec::new();

    for panel in document.select(&PANEL_SELECTOR) {
        for row in panel.select(&ROW_SELECTOR) {
            match parse_row(row, year) {
                Ok(entry) => result.push(entry),
                Err(reason) => {
                    let text = row.text().collect::<Vec<_>>().join(" ");
                    warn!(year, %reason, row = %text.trim(), "Skipping leaderboard row");
                }
            }
        }
    }

    debug!(year, count = result.len(), "Leaderboard rows");
    result
}

fn parse_row(row: ElementRef<'_>, year: u16) -> Result<BoxOfficeEntry, &'static str> {
    let name = first_text(row, &NAME_SELECTOR).ok_or("missing name")?;

    let revenue_text = first_text(row, &RESULT_SELECTOR).ok_or("missing result")?;
    let revenue_text = revenue_text.replace(',', "");
    let revenue = REVENUE_RE
        .find(&revenue_text)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or("no revenue figure")?;

    let pos_text = first_text(row, &POS_SELECTOR).ok_or("missing position")?;
    let position_in_year = POSITION_RE
        .find(&pos_text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or("no position figure")?;

    Ok(BoxOfficeEntry {
        name,
        revenue,
        position_in_year,
        year,
    })
}

/// First non-blank text node inside the first cell matching `selector`.
fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()?
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Scrape every year in `years`, one page after another.
#[instrument(level = "info", skip(fetcher, base_url, retry))]
pub async fn scrape_years<F: Fetch>(
    fetcher: &F,
    base_url: &Url,
    years: RangeInclusive<u16>,
    retry: &RetrySettings,
) -> Vec<BoxOfficeEntry> {
    let pages: Vec<Vec<BoxOfficeEntry>> = stream::iter(years)
        .then(|year| async move { SmwPage::new(base_url, year).fetch(fetcher, retry).await })
        .collect()
        .await;

    let entries: Vec<BoxOfficeEntry> = pages.into_iter().flatten().collect();
    info!(count = entries.len(), "Scraped SMW leaderboards");
    entries
}
