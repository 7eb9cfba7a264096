//! Refresh-gated caching of sheet exports.
//!
//! A [`RefreshGatedCache`] owns one source URL and the latest [`Snapshot`]
//! parsed from it. Reads inside the freshness window never touch the network.
//! Outside it, one caller at a time fetches, fingerprints the text and only
//! reparses when the fingerprint changed. Failed fetches serve the last good
//! snapshot.
//!
//! Snapshots can optionally be persisted with a [`SnapshotStore`] so a restart
//! (or an offline start) begins from the last good data.

pub mod clock;
pub mod gated;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gated::{CacheSettings, CacheValue, ParseFn, RefreshGatedCache};
pub use snapshot::{fingerprint, keyed_fingerprint, Snapshot};
pub use store::{SnapshotStore, StoredSnapshot};
