//! Minimal OMDB API client.
//!
//! Lookups are either by title (`t`, optionally narrowed with `y`) or by IMDb
//! id (`i`). Each successful response is passed through
//! [`process_response`](super::flatten::process_response).

use super::flatten::process_response;
use crate::config::RetrySettings;
use crate::http::{Fetch, get_with_backoff};
use crate::models::FlatRecord;
use crate::utils::{redact_query_param, truncate_for_log};
use serde_json::Value;
use std::error::Error;
use std::fmt;
use tracing::{error, instrument, warn};
use url::Url;

pub struct OmdbClient<F> {
    fetcher: F,
    apikey: String,
    base_url: Url,
    retry: RetrySettings,
}

impl<F> fmt::Debug for OmdbClient<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbClient")
            .field("base_url", &self.base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<F: Fetch> OmdbClient<F> {
    pub fn new(
        fetcher: F,
        apikey: impl Into<String>,
        base_url: &str,
        retry: RetrySettings,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            fetcher,
            apikey: apikey.into(),
            base_url: Url::parse(base_url)?,
            retry,
        })
    }

    fn init_params(&self) -> Vec<(&'static str, String)> {
        vec![("apikey", self.apikey.clone())]
    }

    /// Look a movie up by title, optionally restricted to a release year.
    #[instrument(level = "debug", skip(self))]
    pub async fn search(
        &self,
        title: &str,
        year: Option<u16>,
    ) -> Result<Option<FlatRecord>, Box<dyn Error>> {
        let mut params = self.init_params();
        params.push(("t", title.to_string()));
        if let Some(year) = year {
            params.push(("y", year.to_string()));
        }

        self.send_search(params).await
    }

    /// Look a movie up by IMDb id (e.g. `tt1155076`).
    #[instrument(level = "debug", skip(self))]
    pub async fn search_imdb_id(&self, id: &str) -> Result<Option<FlatRecord>, Box<dyn Error>> {
        let mut params = self.init_params();
        params.push(("i", id.to_string()));

        self.send_search(params).await
    }

    fn request_url(&self, params: &[(&'static str, String)]) -> Result<Url, Box<dyn Error>> {
        Ok(Url::parse_with_params(self.base_url.as_str(), params)?)
    }

    async fn send_search(
        &self,
        params: Vec<(&'static str, String)>,
    ) -> Result<Option<FlatRecord>, Box<dyn Error>> {
        let url = self.request_url(&params)?;
        let page = get_with_backoff(&self.fetcher, &url, &self.retry).await?;

        if page.status.as_u16() > 299 {
            error!(
                url = %redact_query_param(&url, "apikey"),
                status = %page.status,
                "Request to OMDB failed"
            );
            return Ok(None);
        }

        let json: Value = serde_json::from_str(&page.body).map_err(|e| {
            warn!(
                error = %e,
                body_preview = %truncate_for_log(&page.body, 300),
                "OMDB returned invalid JSON"
            );
            e
        })?;
        Ok(process_response(&json))
    }
}
