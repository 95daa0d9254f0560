//! Data models shared by the OMDB collector and the SMW scraper.
//!
//! - [`FlatRecord`]: one OMDB response flattened into ordered `column -> cell` pairs
//! - [`MovieRow`]: a queried title together with its record (if the lookup succeeded)
//! - [`CollectReport`]: the outcome of a whole OMDB batch
//! - [`BoxOfficeEntry`]: one leaderboard row scraped from Summer Movie Wager

use serde::{Deserialize, Serialize};

/// An OMDB response flattened into a single table row.
///
/// Columns keep the order in which they were first inserted, which is the
/// document order of the JSON response. Inserting an existing column
/// overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    fields: Vec<(String, String)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, keeping the column position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Column names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// A single title from the movie list and what OMDB returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRow {
    /// The title exactly as it appeared in the input list.
    pub query: String,
    /// `None` when the lookup failed or OMDB answered with an error.
    pub record: Option<FlatRecord>,
}

/// Result of running the OMDB collector over a movie list.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// One row per input title, in input order.
    pub rows: Vec<MovieRow>,
    /// Titles that produced no record.
    pub failed: Vec<String>,
}

/// One film's standing on a yearly Summer Movie Wager leaderboard.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxOfficeEntry {
    pub name: String,
    /// Revenue as displayed on the leaderboard.
    pub revenue: u64,
    pub position_in_year: u32,
    pub year: u16,
}

impl BoxOfficeEntry {
    pub const HEADERS: [&'static str; 4] = ["name", "revenue", "position_in_year", "year"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_record_keeps_insertion_order() {
        let mut record = FlatRecord::new();
        record.insert("Title", "Spider-Man 3");
        record.insert("Year", "2007");
        record.insert("Rated", "PG-13");

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["Title", "Year", "Rated"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_flat_record_overwrite_keeps_position() {
        let mut record = FlatRecord::new();
        record.insert("Title", "Old");
        record.insert("Year", "2007");
        record.insert("Title", "New");

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["Title", "Year"]);
        assert_eq!(record.get("Title"), Some("New"));
    }

    #[test]
    fn test_flat_record_missing_key() {
        let record = FlatRecord::new();
        assert_eq!(record.len(), 0);
        assert_eq!(record.get("Title"), None);
    }

    #[test]
    fn test_box_office_entry_serialization() {
        let entry = BoxOfficeEntry {
            name: "Transformers".to_string(),
            revenue: 319,
            position_in_year: 3,
            year: 2007,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Transformers","revenue":319,"position_in_year":3,"year":2007}"#
        );
    }
}
