//! Delimited table output for both collectors.

use crate::models::{BoxOfficeEntry, MovieRow};
use csv::WriterBuilder;
use itertools::Itertools;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

/// First column of the OMDB table: the title as it was queried.
pub const QUERY_COLUMN: &str = "query";

/// Write leaderboard entries with a `name, revenue, position_in_year, year` header.
pub fn write_box_office_to<W: Write>(
    writer: W,
    delimiter: u8,
    entries: &[BoxOfficeEntry],
) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(BoxOfficeEntry::HEADERS)?;
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), count = entries.len()))]
pub fn write_box_office(
    path: &Path,
    delimiter: u8,
    entries: &[BoxOfficeEntry],
) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::create(path)?;
    write_box_office_to(file, delimiter, entries)?;
    info!("Wrote box office CSV");
    Ok(())
}

/// The union of all record columns, in order of first appearance.
pub fn movie_columns(rows: &[MovieRow]) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| row.record.as_ref())
        .flat_map(|record| record.keys())
        .filter(|key| *key != QUERY_COLUMN)
        .unique()
        .collect()
}

/// Write one line per movie. Columns a record does not have are left empty.
pub fn write_movie_rows_to<W: Write>(
    writer: W,
    delimiter: u8,
    rows: &[MovieRow],
) -> Result<(), Box<dyn Error>> {
    let columns = movie_columns(rows);
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    wtr.write_record(std::iter::once(QUERY_COLUMN).chain(columns.iter().copied()))?;
    for row in rows {
        let cells = columns
            .iter()
            .map(|column| row.record.as_ref().and_then(|r| r.get(column)).unwrap_or(""));
        wtr.write_record(std::iter::once(row.query.as_str()).chain(cells))?;
    }
    wtr.flush()?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), count = rows.len()))]
pub fn write_movie_rows(path: &Path, delimiter: u8, rows: &[MovieRow]) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::create(path)?;
    write_movie_rows_to(file, delimiter, rows)?;
    info!("Wrote OMDB CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlatRecord;

    fn record(pairs: &[(&str, &str)]) -> FlatRecord {
        let mut record = FlatRecord::new();
        for (k, v) in pairs {
            record.insert(*k, *v);
        }
        record
    }

    #[test]
    fn test_write_box_office() {
        let entries = vec![
            BoxOfficeEntry {
                name: "Spider-Man 3".to_string(),
                revenue: 336,
                position_in_year: 1,
                year: 2007,
            },
            BoxOfficeEntry {
                name: "Shrek; the Third".to_string(),
                revenue: 322,
                position_in_year: 2,
                year: 2007,
            },
        ];
        let mut out = Vec::new();
        write_box_office_to(&mut out, b';', &entries).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name;revenue;position_in_year;year\nSpider-Man 3;336;1;2007\n\"Shrek; the Third\";322;2;2007\n"
        );
    }

    #[test]
    fn test_write_box_office_empty_still_has_header() {
        let mut out = Vec::new();
        write_box_office_to(&mut out, b',', &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "name,revenue,position_in_year,year\n");
    }

    #[test]
    fn test_write_movie_rows_unions_columns() {
        let rows = vec![
            MovieRow {
                query: "Up".to_string(),
                record: Some(record(&[("Title", "Up"), ("Animation_genre", "1")])),
            },
            MovieRow {
                query: "Missing".to_string(),
                record: None,
            },
            MovieRow {
                query: "Cars".to_string(),
                record: Some(record(&[("Title", "Cars"), ("Comedy_genre", "1")])),
            },
        ];

        assert_eq!(movie_columns(&rows), vec!["Title", "Animation_genre", "Comedy_genre"]);

        let mut out = Vec::new();
        write_movie_rows_to(&mut out, b';', &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "query;Title;Animation_genre;Comedy_genre\nUp;Up;1;\nMissing;;;\nCars;Cars;;1\n"
        );
    }

    #[test]
    fn test_write_movie_rows_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("omdb.csv");
        let rows = vec![MovieRow {
            query: "Up".to_string(),
            record: Some(record(&[("Title", "Up")])),
        }];

        write_movie_rows(&path, b',', &rows).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "query,Title\nUp,Up\n");
    }
}
