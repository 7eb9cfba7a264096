//! Per-mon move sheets.
//!
//! Every mon row may link to its own move sheet. Links are resolved to export
//! URLs and each URL gets an independent [`RefreshGatedCache`], so refreshing
//! one mon's moves never invalidates another's.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Duration;
use tracing::debug;

use crate::cache::{
    fingerprint, CacheSettings, Clock, ParseFn, RefreshGatedCache, SnapshotStore,
};
use crate::error::DexError;
use crate::fetch::SheetFetcher;
use crate::link::resolve_link;
use crate::models::{GroupedListing, Mon};
use crate::parse::{parse_grouped, parser_id};

type MovesCache = RefreshGatedCache<GroupedListing>;

/// Resolves and caches grouped move listings, one cache per export URL.
pub struct SecondaryResolver {
    fetcher: Arc<dyn SheetFetcher>,
    clock: Arc<dyn Clock>,
    freshness: Duration,
    parse: ParseFn<GroupedListing>,
    parser: String,
    store: Option<SnapshotStore>,
    caches: RwLock<HashMap<String, Arc<MovesCache>>>,
    /// Pasted link -> export URL, for links that resolved.
    links: RwLock<HashMap<String, String>>,
}

impl SecondaryResolver {
    pub fn new(
        fetcher: Arc<dyn SheetFetcher>,
        clock: Arc<dyn Clock>,
        freshness: Duration,
        delimiter: u8,
    ) -> Self {
        Self {
            fetcher,
            clock,
            freshness,
            parse: Arc::new(move |text: &str| parse_grouped(text, delimiter)),
            parser: parser_id("moves", delimiter),
            store: None,
            caches: RwLock::new(HashMap::new()),
            links: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    /// The mon's grouped move listing; empty when the mon has no usable link
    /// or nothing could be fetched.
    pub async fn moves_for(&self, mon: &Mon) -> Arc<GroupedListing> {
        let raw = mon.moves_link.trim();
        if raw.is_empty() {
            return Arc::new(GroupedListing::default());
        }

        match self.resolve(raw).await {
            Ok(url) => self.cache_for(&url).get().await,
            Err(e) => {
                debug!(mon = %mon.id, error = %e, "No move sheet");
                Arc::new(GroupedListing::default())
            }
        }
    }

    /// Number of distinct move sheets with a cache.
    pub fn cache_count(&self) -> usize {
        self.caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop memoized links not in `links`, then every cache whose URL no
    /// remaining link resolves to. Returns how many caches were dropped.
    pub fn retain_links<'a>(&self, links: impl IntoIterator<Item = &'a str>) -> usize {
        let wanted: HashSet<&str> = links.into_iter().collect();
        let mut memo = self.links.write().unwrap_or_else(PoisonError::into_inner);
        memo.retain(|raw, _| wanted.contains(raw.as_str()));
        let live: HashSet<&str> = memo.values().map(String::as_str).collect();

        let mut caches = self.caches.write().unwrap_or_else(PoisonError::into_inner);
        let before = caches.len();
        caches.retain(|url, _| live.contains(url.as_str()));
        before - caches.len()
    }

    async fn resolve(&self, raw: &str) -> Result<String, DexError> {
        let known = self
            .links
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(raw)
            .cloned();
        if let Some(url) = known {
            return Ok(url);
        }

        let url = resolve_link(raw, self.fetcher.as_ref())
            .await
            .ok_or_else(|| DexError::UnresolvedLink(raw.to_string()))?;
        self.links
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(raw.to_string(), url.clone());
        Ok(url)
    }

    /// The cache for `url`, created on first use. Concurrent first uses agree
    /// on a single instance.
    fn cache_for(&self, url: &str) -> Arc<MovesCache> {
        if let Some(cache) = self
            .caches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
        {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write().unwrap_or_else(PoisonError::into_inner);
        let cache = caches.entry(url.to_string()).or_insert_with(|| {
            debug!(url = url, "Creating move sheet cache");
            Arc::new(self.build_cache(url))
        });
        Arc::clone(cache)
    }

    fn build_cache(&self, url: &str) -> MovesCache {
        let settings = CacheSettings {
            name: format!("moves_{}", &fingerprint(url)[..16]),
            url: url.to_string(),
            parser: self.parser.clone(),
            freshness: self.freshness,
        };
        let cache = RefreshGatedCache::new(
            settings,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.clock),
            Arc::clone(&self.parse),
        );
        match self.store {
            Some(ref store) => cache.with_store(store.clone()),
            None => cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::DexError;
    use crate::models::Stats;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOC_A: &str = "https://docs.google.com/spreadsheets/d/AAAA/edit";
    const DOC_B: &str = "https://docs.google.com/spreadsheets/d/BBBB/edit";

    /// Serves a fixed sheet for every URL and counts requests per kind.
    #[derive(Default)]
    struct CountingFetcher {
        fetches: AtomicUsize,
        redirects: AtomicUsize,
    }

    #[async_trait]
    impl SheetFetcher for CountingFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, DexError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if url.contains("AAAA") {
                Ok("Level Up,TMs\nTackle,Surf\n".to_string())
            } else {
                Ok("Egg\nEmber\n".to_string())
            }
        }

        async fn follow_redirects(&self, _url: &str) -> Result<String, DexError> {
            self.redirects.fetch_add(1, Ordering::SeqCst);
            Ok(DOC_A.to_string())
        }
    }

    fn mon_with_link(id: &str, link: &str) -> Mon {
        Mon {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            tags: Vec::new(),
            stats: Stats::default(),
            image_url: String::new(),
            credits: String::new(),
            moves_link: link.to_string(),
            raw_moves: String::new(),
            raw_abilities: String::new(),
            raw_stats: String::new(),
        }
    }

    fn resolver(fetcher: Arc<CountingFetcher>) -> SecondaryResolver {
        SecondaryResolver::new(
            fetcher,
            Arc::new(ManualClock::default()),
            Duration::minutes(15),
            b',',
        )
    }

    #[tokio::test]
    async fn test_blank_link_is_empty_without_io() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = resolver(fetcher.clone());
        assert!(resolver.moves_for(&mon_with_link("a", "  ")).await.is_empty());
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.cache_count(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_link_is_empty() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = resolver(fetcher.clone());
        assert!(resolver.moves_for(&mon_with_link("a", "ask Sam")).await.is_empty());
        assert_eq!(resolver.cache_count(), 0);
        assert!(matches!(
            resolver.resolve("ask Sam").await,
            Err(DexError::UnresolvedLink(link)) if link == "ask Sam"
        ));
    }

    #[tokio::test]
    async fn test_same_url_shares_one_cache() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = resolver(fetcher.clone());

        let a = resolver.moves_for(&mon_with_link("a", DOC_A)).await;
        let b = resolver
            .moves_for(&mon_with_link("b", &format!("{}#gid=0", DOC_A)))
            .await;

        assert_eq!(a.get("TMs"), Some(&["Surf".to_string()][..]));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(resolver.cache_count(), 1);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_urls_have_independent_caches() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = resolver(fetcher.clone());

        let a = resolver.moves_for(&mon_with_link("a", DOC_A)).await;
        let b = resolver.moves_for(&mon_with_link("b", DOC_B)).await;

        assert_eq!(a.labels().collect::<Vec<_>>(), vec!["Level Up", "TMs"]);
        assert_eq!(b.labels().collect::<Vec<_>>(), vec!["Egg"]);
        assert_eq!(resolver.cache_count(), 2);
    }

    #[tokio::test]
    async fn test_redirect_resolution_is_memoized() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = resolver(fetcher.clone());
        let mon = mon_with_link("a", "https://bit.ly/moves");

        resolver.moves_for(&mon).await;
        resolver.moves_for(&mon).await;

        assert_eq!(fetcher.redirects.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_creates_one_cache() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = Arc::new(resolver(fetcher.clone()));
        let calls = (0..8).map(|i| {
            let resolver = Arc::clone(&resolver);
            async move {
                resolver
                    .moves_for(&mon_with_link(&format!("m{}", i), DOC_A))
                    .await
            }
        });
        futures::future::join_all(calls).await;

        assert_eq!(resolver.cache_count(), 1);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retain_links_drops_unlinked_caches() {
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = resolver(fetcher.clone());
        let shared = format!("{}#gid=0", DOC_A);

        resolver.moves_for(&mon_with_link("a", DOC_A)).await;
        resolver.moves_for(&mon_with_link("b", &shared)).await;
        resolver.moves_for(&mon_with_link("c", DOC_B)).await;
        assert_eq!(resolver.cache_count(), 2);

        // DOC_B was edited out of the sheet; DOC_A is still linked by one alias
        assert_eq!(resolver.retain_links([shared.as_str()]), 1);
        assert_eq!(resolver.cache_count(), 1);

        // the kept cache still serves without refetching
        resolver.moves_for(&mon_with_link("b", &shared)).await;
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);

        assert_eq!(resolver.retain_links(std::iter::empty()), 1);
        assert_eq!(resolver.cache_count(), 0);
    }
}
