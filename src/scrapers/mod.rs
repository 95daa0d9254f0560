//! HTML scrapers.
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | Summer Movie Wager | [`smw`] | One leaderboard page per year |
//!
//! Pages are fetched sequentially through [`crate::http`]; a page that cannot
//! be fetched or parsed is logged and contributes no rows.

pub mod smw;
