//! Output generation for the collected tables.
//!
//! # Submodules
//!
//! - [`tables`]: writes leaderboard entries and flattened OMDB rows as delimited text
//!
//! # Output Structure
//!
//! ```text
//! smw.csv    name;revenue;position_in_year;year
//! omdb.csv   query;Title;Year;...;Action_genre;Sam_Raimi_screenplay;...
//! ```
//!
//! `smw.csv` can be fed straight back in as the movie list of the `omdb` subcommand.

pub mod tables;
