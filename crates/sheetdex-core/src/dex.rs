//! The dex service: the query surface presentation layers consume.
//!
//! A `Dex` is built once at startup and shared by reference (or `Arc`) with
//! every request handler. It owns the mon sheet cache and the move sheet
//! resolver; nothing here is global.

use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::cache::{CacheSettings, Clock, RefreshGatedCache, SnapshotStore, SystemClock};
use crate::config::Config;
use crate::error::DexError;
use crate::fetch::{HttpFetcher, SheetFetcher};
use crate::models::{GroupedListing, Mon, Roster};
use crate::normalize::parse_roster;
use crate::parse::parser_id;
use crate::secondary::SecondaryResolver;

/// Cache name of the mon sheet snapshot.
const ROSTER_CACHE_NAME: &str = "roster";

/// Maximum concurrent move sheet fetches when warming.
const MAX_CONCURRENT_REQUESTS: usize = 8;

pub struct Dex {
    roster: RefreshGatedCache<Roster>,
    moves: SecondaryResolver,
    clock: Arc<dyn Clock>,
}

impl Dex {
    pub fn new(config: &Config, fetcher: Arc<dyn SheetFetcher>, clock: Arc<dyn Clock>) -> Self {
        let delimiter = config.delimiter_byte();
        let settings = CacheSettings {
            name: ROSTER_CACHE_NAME.to_string(),
            url: config.sheet_url.clone(),
            parser: parser_id(ROSTER_CACHE_NAME, delimiter),
            freshness: config.primary_freshness(),
        };
        let roster = RefreshGatedCache::new(
            settings,
            Arc::clone(&fetcher),
            Arc::clone(&clock),
            Arc::new(move |text: &str| parse_roster(text, delimiter)),
        );
        let moves = SecondaryResolver::new(
            fetcher,
            Arc::clone(&clock),
            config.secondary_freshness(),
            delimiter,
        );

        Self {
            roster,
            moves,
            clock,
        }
    }

    /// Persist every snapshot to `store`.
    pub fn with_store(self, store: SnapshotStore) -> Self {
        Self {
            roster: self.roster.with_store(store.clone()),
            moves: self.moves.with_store(store),
            clock: self.clock,
        }
    }

    /// Production wiring: HTTP fetcher, wall clock, and an on-disk store when
    /// `config.persist` is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout(), config.redirect_timeout())?;
        let dex = Self::new(config, Arc::new(fetcher), Arc::new(SystemClock));
        if config.persist {
            let store = SnapshotStore::new(config.cache_dir()?)?;
            Ok(dex.with_store(store))
        } else {
            Ok(dex)
        }
    }

    /// Every mon in the current snapshot.
    pub async fn mons(&self) -> Arc<Roster> {
        self.roster.get().await
    }

    pub async fn mon(&self, id: &str) -> Option<Mon> {
        self.roster.get().await.get(id).cloned()
    }

    /// The move listing for mon `id`.
    ///
    /// Only an unknown id is an error; link and fetch failures give an empty listing.
    pub async fn moves_for(&self, id: &str) -> Result<Arc<GroupedListing>, DexError> {
        let roster = self.roster.get().await;
        let mon = roster
            .get(id)
            .ok_or_else(|| DexError::MonNotFound(id.to_string()))?;
        Ok(self.moves.moves_for(mon).await)
    }

    /// Fetch every mon's move sheet ahead of time. Returns how many mons have
    /// a non-empty listing.
    ///
    /// Move sheets no longer linked from the roster are dropped first.
    pub async fn warm_moves(&self) -> usize {
        let roster = self.roster.get().await;
        let pruned = self
            .moves
            .retain_links(roster.iter().map(|mon| mon.moves_link.trim()));
        if pruned > 0 {
            debug!(pruned = pruned, "Dropped unlinked move sheet caches");
        }
        let loaded = stream::iter(roster.iter().filter(|mon| mon.has_moves_link()))
            .map(|mon| self.moves.moves_for(mon))
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .filter(|listing| futures::future::ready(!listing.is_empty()))
            .count()
            .await;
        info!(
            mons = roster.len(),
            loaded = loaded,
            sheets = self.moves.cache_count(),
            "Warmed move sheets"
        );
        loaded
    }

    /// How long ago the mon sheet was last confirmed, e.g. "5m ago".
    pub async fn last_updated(&self) -> Option<String> {
        let snapshot = self.roster.snapshot().await?;
        Some(snapshot.age_display(self.clock.now()))
    }
}
