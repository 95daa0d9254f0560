//! Command-line interface definitions for movie_wager_data.
//!
//! Two subcommands share one binary: `omdb` enriches a movie list with OMDB
//! metadata and `smw` scrapes yearly box-office leaderboards.

use clap::{Args, Parser, Subcommand};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Command-line arguments for movie_wager_data.
///
/// # Examples
///
/// ```sh
/// # Scrape the 2007-2017 leaderboards
/// movie_wager_data smw -o ./data/smw.csv
///
/// # Look every scraped title up on OMDB
/// movie_wager_data omdb -a YOUR_KEY -m ./data/smw.csv -o ./data/omdb.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query OMDB for every title of a movie list and flatten the answers into CSV
    Omdb(OmdbArgs),
    /// Scrape Summer Movie Wager box-office leaderboards for a range of years into CSV
    Smw(SmwArgs),
}

#[derive(Args, Debug)]
pub struct OmdbArgs {
    /// OMDB API key
    #[arg(short, long, env = "OMDB_API_KEY", hide_env_values = true)]
    pub apikey: String,

    /// Movie list with a `name` column
    #[arg(short, long)]
    pub movies: PathBuf,

    /// Output CSV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Field delimiter for the movie list and the output
    #[arg(short, long, default_value = ";", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Do not draw a progress bar on stderr
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct SmwArgs {
    /// First year to scrape
    #[arg(long, default_value_t = 2007)]
    pub start_year: u16,

    /// Last year to scrape (inclusive)
    #[arg(long, default_value_t = 2017)]
    pub end_year: u16,

    /// Output CSV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Field delimiter for the output
    #[arg(short, long, default_value = ";", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Accept invalid TLS certificates from the leaderboard site
    #[arg(long)]
    pub insecure: bool,
}

impl SmwArgs {
    pub fn years(&self) -> Result<RangeInclusive<u16>, String> {
        if self.start_year > self.end_year {
            return Err(format!(
                "start year {} is after end year {}",
                self.start_year, self.end_year
            ));
        }
        Ok(self.start_year..=self.end_year)
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        (Some('\\'), Some('t')) if s.len() == 2 => Ok(b'\t'),
        _ => Err(format!("delimiter must be a single ASCII character, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omdb_parsing() {
        let cli = Cli::parse_from([
            "movie_wager_data",
            "omdb",
            "--apikey",
            "abc123",
            "--movies",
            "./smw.csv",
            "--output",
            "./omdb.csv",
        ]);

        let Command::Omdb(args) = cli.command else {
            panic!("expected omdb subcommand");
        };
        assert_eq!(args.apikey, "abc123");
        assert_eq!(args.movies, PathBuf::from("./smw.csv"));
        assert_eq!(args.output, PathBuf::from("./omdb.csv"));
        assert_eq!(args.delimiter, b';');
        assert!(!args.no_progress);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_omdb_apikey_from_env() {
        // SAFETY: every other test passes the key explicitly, so none reads this variable.
        unsafe { std::env::set_var("OMDB_API_KEY", "from-env-key") };
        let cli = Cli::parse_from(["movie_wager_data", "omdb", "-m", "in.csv", "-o", "out.csv"]);

        let Command::Omdb(args) = cli.command else {
            panic!("expected omdb subcommand");
        };
        assert_eq!(args.apikey, "from-env-key");
    }

    #[test]
    fn test_omdb_short_flags() {
        let cli = Cli::parse_from([
            "movie_wager_data",
            "omdb",
            "-a",
            "abc123",
            "-m",
            "/tmp/in.csv",
            "-o",
            "/tmp/out.csv",
            "-d",
            ",",
            "-c",
            "/tmp/settings.yaml",
        ]);

        let Command::Omdb(args) = cli.command else {
            panic!("expected omdb subcommand");
        };
        assert_eq!(args.delimiter, b',');
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/settings.yaml")));
    }

    #[test]
    fn test_smw_defaults() {
        let cli = Cli::parse_from(["movie_wager_data", "smw", "-o", "smw.csv"]);

        let Command::Smw(args) = cli.command else {
            panic!("expected smw subcommand");
        };
        assert_eq!(args.years().unwrap(), 2007..=2017);
        assert!(!args.insecure);
    }

    #[test]
    fn test_smw_rejects_reversed_years() {
        let cli = Cli::parse_from([
            "movie_wager_data",
            "smw",
            "--start-year",
            "2015",
            "--end-year",
            "2010",
            "-o",
            "smw.csv",
        ]);

        let Command::Smw(args) = cli.command else {
            panic!("expected smw subcommand");
        };
        assert!(args.years().is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
        assert!(parse_delimiter("").is_err());
    }
}
