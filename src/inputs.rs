//! Reading the movie list that drives the OMDB collector.
//!
//! The list is a delimited file with a header row containing a `name` column.
//! The CSV written by the `smw` subcommand has that shape already.

use std::error::Error;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

const NAME_COLUMN: &str = "name";

/// Read movie titles from any reader.
pub fn read_movie_titles_from<R: Read>(reader: R, delimiter: u8) -> Result<Vec<String>, Box<dyn Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let name_idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == NAME_COLUMN)
        .ok_or_else(|| format!("movie list has no `{NAME_COLUMN}` column"))?;

    let mut titles = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(name) = record.get(name_idx).map(str::trim) {
            if !name.is_empty() {
                titles.push(name.to_string());
            }
        }
    }
    Ok(titles)
}

/// Read movie titles from the file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_movie_titles(path: &Path, delimiter: u8) -> Result<Vec<String>, Box<dyn Error>> {
    let file = std::fs::File::open(path)?;
    let titles = read_movie_titles_from(file, delimiter)?;
    info!(count = titles.len(), "Loaded movie list");
    Ok(titles)
}
