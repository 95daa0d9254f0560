//! Flattening of OMDB JSON responses into one table row per movie.
//!
//! The top-level object is walked in document order:
//!
//! | Key | Output columns |
//! |-----|----------------|
//! | `Error` | whole response is rejected |
//! | `Poster`, `Awards`, `Response`, `DVD`, `Released`, `imdbVotes`, `Website`, `Language` | none |
//! | `Ratings` | `IMD_score`, `RT_score`, `MC_score` |
//! | `Writer` | `<Name>[_<Profession>]` = `1` per writer |
//! | `Actors` | `<Name>_actor` = `1` per actor |
//! | `Genre` | `<Genre>_genre` = `1` per genre |
//! | `BoxOffice` | `BoxOffice` in whole millions of dollars |
//! | `Runtime` | `Runtime` in minutes |
//! | anything else | copied verbatim |
//!
//! Spaces inside generated column names are replaced with underscores.

use crate::models::FlatRecord;
use crate::utils::underscore_join;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

pub const NOT_AVAILABLE: &str = "N/A";

const SKIPPED_KEYS: [&str; 8] = [
    "Poster",
    "Awards",
    "Response",
    "DVD",
    "Released",
    "imdbVotes",
    "Website",
    "Language",
];

/// Rating source name and the column it is written to.
const RATING_COLUMNS: [(&str, &str); 3] = [
    ("Internet Movie Database", "IMD_score"),
    ("Rotten Tomatoes", "RT_score"),
    ("Metacritic", "MC_score"),
];

/// `Name (profession)`; anything after the optional parenthesis is ignored.
static WRITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\p{L}\-. ']+)(?:\(([\p{L} ]+)\))?").unwrap());

/// A single writer credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterCredit {
    pub name: String,
    pub profession: Option<String>,
}

impl WriterCredit {
    pub fn column(&self) -> String {
        match &self.profession {
            Some(profession) => format!(
                "{}_{}",
                underscore_join(&self.name),
                underscore_join(profession)
            ),
            None => underscore_join(&self.name),
        }
    }
}

/// Flatten one OMDB response.
///
/// Returns `None` when OMDB answered with an `Error` key or the payload is not
/// a JSON object.
pub fn process_response(json: &Value) -> Option<FlatRecord> {
    let Some(object) = json.as_object() else {
        warn!(kind = json_kind(json), "OMDB response is not a JSON object");
        return None;
    };

    if let Some(error) = object.get("Error") {
        debug!(error = %cell_text(error), "OMDB returned an error");
        return None;
    }

    let mut result = FlatRecord::new();

    for (key, value) in object {
        match key.as_str() {
            "Ratings" => {
                for (source, column) in RATING_COLUMNS {
                    result.insert(column, rating_for(value, source));
                }
            }
            k if SKIPPED_KEYS.contains(&k) => continue,
            "Writer" => {
                for writer in process_writers(&cell_text(value)) {
                    result.insert(writer.column(), "1");
                }
            }
            "Actors" => {
                for actor in process_list_comma_separated(&cell_text(value)) {
                    result.insert(format!("{}_actor", underscore_join(&actor)), "1");
                }
            }
            "Genre" => {
                for genre in process_list_comma_separated(&cell_text(value)) {
                    result.insert(format!("{}_genre", underscore_join(&genre)), "1");
                }
            }
            "BoxOffice" => {
                result.insert("BoxOffice", process_box_office(&cell_text(value)));
            }
            "Runtime" => {
                result.insert("Runtime", process_runtime(&cell_text(value)));
            }
            _ => {
                result.insert(key.as_str(), cell_text(value));
            }
        }
    }

    Some(result)
}

/// Pick the rating reported by `source`.
///
/// OMDB sends `[{"Source": .., "Value": ..}]`; a plain `{source: value}`
/// object is accepted too.
pub fn rating_for(ratings: &Value, source: &str) -> String {
    let found = match ratings {
        Value::Array(items) => items
            .iter()
            .find(|r| r.get("Source").and_then(Value::as_str) == Some(source))
            .and_then(|r| r.get("Value")),
        Value::Object(map) => map.get(source),
        _ => None,
    };
    found
        .map(cell_text)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Split a `Writer` field into credits.
///
/// Items that do not start with a name are logged and dropped.
pub fn process_writers(s: &str) -> Vec<WriterCredit> {
    let mut result = Vec::new();

    for w in process_list_comma_separated(s) {
        let Some(caps) = WRITER_RE.captures(&w) else {
            warn!(writer = %w, "No match for writer credit");
            continue;
        };
        let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if name.is_empty() {
            warn!(writer = %w, "Writer credit without a name");
            continue;
        }
        let profession = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        result.push(WriterCredit {
            name: name.to_string(),
            profession,
        });
    }

    result
}

/// Split on `", "`, dropping blanks and `N/A`.
pub fn process_list_comma_separated(s: &str) -> Vec<String> {
    s.split(", ")
        .map(str::trim)
        .filter(|item| !item.is_empty() && *item != NOT_AVAILABLE)
        .map(str::to_string)
        .collect()
}

/// `"$1,234,567,890"` becomes `"1234"` (whole millions, rounded down).
pub fn process_box_office(s: &str) -> String {
    if s == NOT_AVAILABLE {
        return s.to_string();
    }
    let digits = s.replace([',', '$'], "");
    match digits.trim().parse::<u64>() {
        Ok(dollars) => (dollars / 1_000_000).to_string(),
        Err(e) => {
            warn!(box_office = %s, error = %e, "Unparseable BoxOffice value");
            NOT_AVAILABLE.to_string()
        }
    }
}

/// `"139 min"` becomes `"139"`; anything else is `N/A`.
pub fn process_runtime(s: &str) -> String {
    s.strip_suffix(" min")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Text of a JSON value as it should appear in a CSV cell.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
