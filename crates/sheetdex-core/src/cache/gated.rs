use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{keyed_fingerprint, Clock, Snapshot, SnapshotStore};
use crate::fetch::SheetFetcher;

/// Anything a cache can hold: parseable into, persistable, and with an empty value.
pub trait CacheValue: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// Converts fetched text into the cached value.
pub type ParseFn<T> = Arc<dyn Fn(&str) -> T + Send + Sync>;

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Used in logs and as the persisted file name.
    pub name: String,
    pub url: String,
    /// Identifies the parse function. A snapshot produced under another
    /// parser never matches a fetch, so it is reparsed.
    pub parser: String,
    /// Minimum interval between fetches of `url`.
    pub freshness: Duration,
}

/// Cache for one source URL.
///
/// Readers always get a complete parsed value: the snapshot is swapped as a
/// whole under the write lock. The fetch-and-parse step is serialized by
/// `refresh`, so concurrent misses produce one fetch and at most one parse.
pub struct RefreshGatedCache<T> {
    settings: CacheSettings,
    fetcher: Arc<dyn SheetFetcher>,
    clock: Arc<dyn Clock>,
    parse: ParseFn<T>,
    store: Option<SnapshotStore>,
    snapshot: RwLock<Option<Arc<Snapshot<T>>>>,
    /// Held across fetch and parse; remembers when the last fetch failed.
    refresh: Mutex<Option<DateTime<Utc>>>,
}

impl<T: CacheValue> RefreshGatedCache<T> {
    pub fn new(
        settings: CacheSettings,
        fetcher: Arc<dyn SheetFetcher>,
        clock: Arc<dyn Clock>,
        parse: ParseFn<T>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            clock,
            parse,
            store: None,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(None),
        }
    }

    /// Persist snapshots to `store`, starting from whatever it already holds.
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        match store.load::<T>(&self.settings.name) {
            Ok(Some(stored)) => {
                debug!(
                    cache = %self.settings.name,
                    validated_at = %stored.validated_at,
                    "Loaded persisted snapshot"
                );
                *self.snapshot.get_mut() = Some(Arc::new(stored.into_snapshot()));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    cache = %self.settings.name,
                    error = %e,
                    "Ignoring unreadable persisted snapshot"
                );
            }
        }
        self.store = Some(store);
        self
    }

    /// The current snapshot, without touching the network.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot<T>>> {
        self.snapshot.read().await.clone()
    }

    /// The latest parsed value.
    ///
    /// Inside the freshness window this is a pure read. Otherwise the source
    /// is fetched once; unchanged text only revalidates the snapshot, changed
    /// text is parsed and replaces it. On fetch failure the previous value (or
    /// an empty one) is returned and the next attempt waits a full window.
    pub async fn get(&self) -> Arc<T> {
        if let Some(data) = self.fresh_data().await {
            debug!(cache = %self.settings.name, "Cache hit");
            return data;
        }

        let mut last_failure = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(data) = self.fresh_data().await {
            return data;
        }

        let now = self.clock.now();
        if let Some(failed_at) = *last_failure {
            if now - failed_at < self.settings.freshness {
                debug!(cache = %self.settings.name, "Last fetch failed recently, not retrying yet");
                return self.current_or_empty().await;
            }
        }

        match self.fetcher.fetch_text(&self.settings.url).await {
            Ok(text) => {
                *last_failure = None;
                self.accept(&text).await
            }
            Err(e) => {
                *last_failure = Some(now);
                match self.snapshot().await {
                    Some(current) => {
                        warn!(
                            cache = %self.settings.name,
                            url = %self.settings.url,
                            error = %e,
                            age = %current.age_display(now),
                            "Fetch failed, serving stale snapshot"
                        );
                        Arc::clone(current.data())
                    }
                    None => {
                        warn!(
                            cache = %self.settings.name,
                            url = %self.settings.url,
                            error = %e,
                            "Fetch failed and nothing is cached"
                        );
                        Arc::new(T::default())
                    }
                }
            }
        }
    }

    async fn fresh_data(&self) -> Option<Arc<T>> {
        let guard = self.snapshot.read().await;
        let snapshot = guard.as_ref()?;
        snapshot
            .is_fresh(self.clock.now(), self.settings.freshness)
            .then(|| Arc::clone(snapshot.data()))
    }

    async fn current_or_empty(&self) -> Arc<T> {
        match self.snapshot().await {
            Some(current) => Arc::clone(current.data()),
            None => Arc::new(T::default()),
        }
    }

    /// Install the snapshot for freshly fetched `text`. Caller holds `refresh`.
    async fn accept(&self, text: &str) -> Arc<T> {
        let fingerprint = keyed_fingerprint(&self.settings.parser, text);
        let now = self.clock.now();
        let current = self.snapshot().await;

        let next = match current {
            Some(current) if current.fingerprint() == fingerprint => {
                debug!(cache = %self.settings.name, "Source unchanged, revalidated snapshot");
                current.revalidated(now)
            }
            _ => {
                let data = (self.parse)(text);
                info!(
                    cache = %self.settings.name,
                    fingerprint = &fingerprint[..12],
                    bytes = text.len(),
                    "Source changed, replaced snapshot"
                );
                Snapshot::new(fingerprint, Arc::new(data), now)
            }
        };

        let next = Arc::new(next);
        *self.snapshot.write().await = Some(Arc::clone(&next));
        let data = Arc::clone(next.data());
        self.persist(next).await;
        data
    }

    /// Write `snapshot` to the store on the blocking pool.
    async fn persist(&self, snapshot: Arc<Snapshot<T>>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let name = self.settings.name.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&name, &snapshot)).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(cache = %self.settings.name, error = %e, "Failed to persist snapshot");
            }
            Err(e) => {
                warn!(cache = %self.settings.name, error = %e, "Snapshot write task failed");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
