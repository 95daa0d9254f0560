//! HTTP fetching with exponential backoff retry logic.
//!
//! - [`Fetch`]: core trait for a single GET request
//! - [`HttpFetcher`]: `reqwest`-backed implementation
//! - [`RetryFetch`]: decorator that adds retry logic to any `Fetch` implementation
//!
//! # Retry Strategy
//!
//! Transport errors and `5xx`/`429` responses are retried. Every other status
//! is handed back to the caller untouched. The delay between attempts is
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::config::RetrySettings;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// A fetched response: status code plus the decoded body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    fn is_retryable(&self) -> bool {
        self.status.is_server_error() || self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// Trait for a single async HTTP GET.
pub trait Fetch {
    async fn fetch(&self, url: &Url) -> Result<Page, Box<dyn Error>>;
}

impl<T: Fetch> Fetch for &T {
    async fn fetch(&self, url: &Url) -> Result<Page, Box<dyn Error>> {
        (**self).fetch(url).await
    }
}

/// [`Fetch`] implementation over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with a request timeout.
    ///
    /// `accept_invalid_certs` disables TLS certificate verification; only the
    /// SMW scraper exposes it.
    pub fn new(timeout: StdDuration, accept_invalid_certs: bool) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(host = url.host_str().unwrap_or_default()))]
    async fn fetch(&self, url: &Url) -> Result<Page, Box<dyn Error>> {
        let t0 = Instant::now();
        // reqwest errors embed the full URL, query string and API key included
        let rsp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.without_url())?;
        let status = rsp.status();
        let body = rsp.text().await.map_err(|e| e.without_url())?;
        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(Page { status, body })
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    pub fn new(inner: T, settings: &RetrySettings) -> Self {
        Self {
            inner,
            max_retries: settings.max_retries,
            base_delay: settings.base_delay(),
            max_delay: settings.max_delay(),
        }
    }

    /// Delay before retry number `attempt` (1-based), jitter included.
    fn backoff_delay(&self, attempt: usize) -> StdDuration {
        let factor = u32::try_from(attempt.saturating_sub(1))
            .ok()
            .and_then(|shift| 1u32.checked_shl(shift))
            .unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    #[instrument(level = "debug", skip_all)]
    async fn fetch(&self, url: &Url) -> Result<Page, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            let failure = match self.inner.fetch(url).await {
                Ok(page) if !page.is_retryable() => return Ok(page),
                Ok(page) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            attempt,
                            max = self.max_retries,
                            status = %page.status,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            "fetch() exhausted retries; returning last response"
                        );
                        return Ok(page);
                    }
                    format!("HTTP {}", page.status)
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }
                    e.to_string()
                }
            };

            let delay = self.backoff_delay(attempt);
            warn!(
                attempt,
                max = self.max_retries,
                elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                ?delay,
                error = %failure,
                "fetch() attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}

/// GET `url` through `fetcher`, retrying transient failures per `settings`.
#[instrument(level = "debug", skip_all, fields(path = url.path()))]
pub async fn get_with_backoff<F: Fetch>(
    fetcher: &F,
    url: &Url,
    settings: &RetrySettings,
) -> Result<Page, Box<dyn Error>> {
    let t0 = Instant::now();
    let res = RetryFetch::new(fetcher, settings).fetch(url).await;
    let dt = t0.elapsed();

    match &res {
        Ok(page) => info!(
            status = %page.status,
            elapsed_ms_total = dt.as_millis() as u64,
            "get_with_backoff finished"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u64, error = %e, "get_with_backoff failed")
        }
    }
    res
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted [`Fetch`] implementation for tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every requested URL.
    #[derive(Debug, Default)]
    pub struct ScriptedFetcher {
        responses: Mutex<VecDeque<Result<Page, String>>>,
        pub requests: Mutex<Vec<Url>>,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            self.responses.lock().unwrap().push_back(Ok(Page {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_string(),
            }));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
            self
        }

        pub fn requested(&self) -> Vec<Url> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, url: &Url) -> Result<Page, Box<dyn Error>> {
            self.requests.lock().unwrap().push(url.clone());
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(page)) => Ok(page),
                Some(Err(message)) => Err(message.into()),
                None => Err("no scripted response left".into()),
            }
        }
    }

    pub fn no_delay(max_retries: usize) -> RetrySettings {
        RetrySettings {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }
}
