//! Data models for dex entities.
//!
//! - `Mon`: one row of the mon sheet, normalized
//! - `Stats`, `StatValue`: the parsed stat block of a mon
//! - `Roster`: the ordered mon collection with an id index
//! - `GroupedListing`: a header-keyed secondary sheet (a mon's move list)

pub mod listing;
pub mod mon;
pub mod roster;
pub mod stats;

pub use listing::{Group, GroupedListing};
pub use mon::Mon;
pub use roster::Roster;
pub use stats::{Stat, StatValue, Stats};
