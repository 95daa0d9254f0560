//! Optional YAML settings layered under the command-line arguments.
//!
//! Every key is optional. A missing file argument, an empty file, or a missing
//! key all fall back to the built-in defaults.
//!
//! ```yaml
//! omdb_url: "http://www.omdbapi.com/"
//! smw_url: "http://smoview.a2hosted.com/index.php"
//! imdb_overrides:
//!   "The Karate Kid": tt1155076
//! retry:
//!   max_retries: 3
//!   base_delay_ms: 500
//!   max_delay_ms: 10000
//! request_timeout_secs: 30
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument};

pub const DEFAULT_OMDB_URL: &str = "http://www.omdbapi.com/";
pub const DEFAULT_SMW_URL: &str = "http://smoview.a2hosted.com/index.php";

/// Titles that OMDB resolves to the wrong film when searched by name.
const BUILTIN_IMDB_OVERRIDES: [(&str, &str); 2] = [
    ("The Karate Kid", "tt1155076"),
    ("Ghostbusters (2016)", "tt1289401"),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base URL of the OMDB API.
    pub omdb_url: String,
    /// Leaderboard page of Summer Movie Wager; the year is passed as a query parameter.
    pub smw_url: String,
    /// Title to IMDb id mapping. Listed titles are looked up by id instead of by title.
    pub imdb_overrides: BTreeMap<String, String>,
    pub retry: RetrySettings,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            omdb_url: DEFAULT_OMDB_URL.to_string(),
            smw_url: DEFAULT_SMW_URL.to_string(),
            imdb_overrides: builtin_overrides(),
            retry: RetrySettings::default(),
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Backoff parameters for HTTP requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

fn builtin_overrides() -> BTreeMap<String, String> {
    BUILTIN_IMDB_OVERRIDES
        .iter()
        .map(|(title, id)| (title.to_string(), id.to_string()))
        .collect()
}

/// Parse settings from YAML text.
///
/// Overrides from the file are merged over the built-in ones rather than
/// replacing them.
pub fn parse_settings(yaml: &str) -> Result<Settings, Box<dyn Error>> {
    if yaml.trim().is_empty() {
        return Ok(Settings::default());
    }

    let mut settings: Settings = serde_yaml::from_str(yaml)?;
    for (title, id) in builtin_overrides() {
        settings.imdb_overrides.entry(title).or_insert(id);
    }
    Ok(settings)
}

/// Load settings from `path`, or return the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn Error>> {
    let Some(path) = path else {
        debug!("No settings file given; using defaults");
        return Ok(Settings::default());
    };

    let yaml = fs::read_to_string(path).await?;
    let settings = parse_settings(&yaml)?;
    info!(
        path = %path.display(),
        overrides = settings.imdb_overrides.len(),
        "Loaded settings"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.omdb_url, DEFAULT_OMDB_URL);
        assert_eq!(settings.smw_url, DEFAULT_SMW_URL);
        assert_eq!(
            settings.imdb_overrides.get("The Karate Kid").map(String::as_str),
            Some("tt1155076")
        );
        assert_eq!(settings.retry, RetrySettings::default());
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let settings = parse_settings("  \n").unwrap();
        assert_eq!(settings.imdb_overrides.len(), 2);
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn test_partial_yaml_merges_overrides() {
        let yaml = r#"
omdb_url: "http://localhost:8080/"
imdb_overrides:
  "Alice in Wonderland": tt1014759
retry:
  max_retries: 0
"#;
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(settings.omdb_url, "http://localhost:8080/");
        assert_eq!(settings.smw_url, DEFAULT_SMW_URL);
        assert_eq!(settings.imdb_overrides.len(), 3);
        assert_eq!(
            settings.imdb_overrides.get("Ghostbusters (2016)").map(String::as_str),
            Some("tt1289401")
        );
        assert_eq!(settings.retry.max_retries, 0);
        assert_eq!(settings.retry.base_delay_ms, 500);
    }

    #[test]
    fn test_file_override_wins_over_builtin() {
        let yaml = "imdb_overrides:\n  \"The Karate Kid\": tt0087538\n";
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(
            settings.imdb_overrides.get("The Karate Kid").map(String::as_str),
            Some("tt0087538")
        );
    }

    #[test]
    fn test_misspelled_key_is_an_error() {
        assert!(parse_settings("imdb_overides:\n  \"Up\": tt1049413\n").is_err());
        assert!(parse_settings("retry:\n  max_retry: 1\n").is_err());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(parse_settings("retry: [1, 2").is_err());
    }

    #[tokio::test]
    async fn test_load_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs: 5").unwrap();

        let settings = load_settings(Some(file.path())).await.unwrap();
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_load_settings_without_path() {
        let settings = load_settings(None).await.unwrap();
        assert_eq!(settings.omdb_url, DEFAULT_OMDB_URL);
    }
}
