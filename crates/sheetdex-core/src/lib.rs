//! Core library for sheetdex.
//!
//! Turns a shared, hand-edited spreadsheet of mons into typed [`Mon`] values
//! and per-mon move listings, without refetching or reparsing more than
//! needed:
//!
//! - [`link`]: canonical CSV export URLs from whatever link was pasted
//! - [`parse`]: delimited-text rows and header-grouped listings
//! - [`normalize`]: sheet rows to [`Mon`]s
//! - [`cache`]: refresh-gated, fingerprinted snapshot caches
//! - [`secondary`]: one cache per move sheet
//! - [`dex`]: the query surface tying it together

pub mod cache;
pub mod config;
pub mod dex;
pub mod error;
pub mod fetch;
pub mod link;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod secondary;

pub use config::Config;
pub use dex::Dex;
pub use error::DexError;
pub use fetch::{HttpFetcher, SheetFetcher};
pub use models::{GroupedListing, Mon, Roster, StatValue, Stats};
