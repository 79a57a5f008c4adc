//! A cache system that uses local in-memory storage to hold upstream responses.

use async_trait::async_trait;
use cadence::{CountedExt, StatsdClient};
use dashmap::{mapref::entry::Entry, DashMap};
use postagg_posts::{CacheStatus, Post, PostSource, SourceError, SourceResponse};
use postagg_settings::MemoryCacheSettings;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// An entry in the in-memory store, that includes an optional expiration time.
#[derive(Debug)]
struct CacheEntry {
    /// The posts the upstream answered with.
    posts: Vec<Post>,

    /// After this time, the cache entry should no longer be considered valid,
    /// and should be removed. `None` means the entry never expires.
    expiration: Option<Instant>,
}

impl CacheEntry {
    /// Whether the entry is no longer valid at `now`.
    fn is_expired(&self, now: Instant) -> bool {
        self.expiration.map_or(false, |expiration| now >= expiration)
    }
}

/// An in-memory cache of upstream responses, keyed by the wrapped source's
/// cache key (the upstream URL).
///
/// Failed fetches are never cached.
pub struct Source {
    /// The source to query on cache-miss.
    inner: Box<dyn PostSource>,

    /// The items stored in the cache.
    items: DashMap<String, CacheEntry>,

    /// How long entries stay valid. `None` means forever.
    default_ttl: Option<Duration>,

    /// The maximum number of entries to hold, if bounded.
    max_entries: Option<usize>,

    /// The client to report cache hits and misses to.
    metrics_client: StatsdClient,
}

impl Source {
    /// Create an in-memory cache from settings that wraps `inner`.
    pub fn new_boxed(
        settings: &MemoryCacheSettings,
        inner: Box<dyn PostSource>,
        metrics_client: StatsdClient,
    ) -> Box<Self> {
        Box::new(Self {
            inner,
            items: DashMap::new(),
            default_ttl: settings.default_ttl,
            max_entries: settings.max_entries,
            metrics_client,
        })
    }

    /// Store `posts` under `key`, making room by dropping expired entries if
    /// the cache is full. If there is still no room, nothing is stored.
    fn store(&self, key: String, posts: Vec<Post>, now: Instant) {
        if let Some(max_entries) = self.max_entries {
            if self.items.len() >= max_entries {
                self.items.retain(|_, entry| !entry.is_expired(now));
                if self.items.len() >= max_entries {
                    tracing::debug!(max_entries, "cache full, not storing");
                    return;
                }
            }
        }

        let expiration = self.default_ttl.map(|ttl| now + ttl);
        tracing::debug!(?now, ?expiration, "inserting into cache");
        self.items.insert(key, CacheEntry { posts, expiration });
    }
}

#[async_trait]
impl PostSource for Source {
    fn name(&self) -> String {
        format!("memory-cache({})", self.inner.name())
    }

    fn cache_key(&self, tag: &str) -> String {
        self.inner.cache_key(tag)
    }

    async fn posts_for_tag(&self, tag: &str) -> Result<SourceResponse, SourceError> {
        let now = Instant::now();
        let key = self.inner.cache_key(tag);
        let span = tracing::debug_span!("memory-cache", %key);
        async move {
            // Put the cache-check in a block so that `entry` drops before we
            // try and write back to the cache. If `entry` is not dropped by the
            // time we write cache misses into `self.items`, we may deadlock!
            {
                let entry = self.items.entry(key.clone());

                if let Entry::Occupied(occupied_entry) = entry {
                    if occupied_entry.get().is_expired(now) {
                        tracing::debug!("cache expired");
                        occupied_entry.remove();
                    } else {
                        tracing::debug!(r#type = "cache.hit", "cache hit");
                        self.metrics_client.incr("cache.hit").ok();
                        return Ok(SourceResponse::new(occupied_entry.get().posts.clone())
                            .with_cache_status(CacheStatus::Hit));
                    }
                } else {
                    tracing::debug!("cache miss");
                }
            }

            self.metrics_client.incr("cache.miss").ok();
            let response = self
                .inner
                .posts_for_tag(tag)
                .await?
                .with_cache_status(CacheStatus::Miss);

            self.store(key, response.posts.clone(), now);
            Ok(response)
        }
        .instrument(span)
        .await
    }
}
