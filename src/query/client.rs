use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::BoxFuture;
use tokio::sync::broadcast;

use crate::command::Command;

use super::cache::CacheEntry;
use super::config::QueryConfig;
use super::key::QueryKey;
use super::query::QueryError;

type AnyData = Arc<dyn Any + Send + Sync>;

/// Notification sent to running queries when the cache changes under them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// The entry was marked stale; watchers should refetch.
    Invalidated(QueryKey),
    /// The entry was written outside the watcher's own fetch.
    Updated(QueryKey),
}

impl CacheEvent {
    pub const fn key(&self) -> QueryKey {
        match self {
            Self::Invalidated(key) | Self::Updated(key) => *key,
        }
    }
}

/// The query cache.
///
/// One client is created per application and shared as `Arc<QueryClient>`
/// between views, queries and commands. It handles:
/// - storing the last value per [`QueryKey`]
/// - ordering writes so a slow, older response never replaces a newer one
/// - broadcasting invalidations and direct writes to running queries
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use roster::query::{QueryClient, QueryConfig, QueryKey};
///
/// let client = QueryClient::with_config(QueryConfig::new(
///     Duration::from_secs(0),   // stale_time
///     Duration::from_secs(300), // cache_time
/// ));
///
/// client.set_query_data(QueryKey::Student { id: 5 }, "Nguyen".to_string());
/// let entry = client.get::<String>(&QueryKey::Student { id: 5 }).unwrap();
/// assert_eq!(entry.data, "Nguyen");
/// ```
#[derive(Debug)]
pub struct QueryClient {
    cache: DashMap<QueryKey, CacheEntry<AnyData>>,
    seq: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
    config: QueryConfig,
}

impl QueryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            cache: DashMap::new(),
            seq: AtomicU64::new(0),
            events,
            config,
        }
    }

    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Returns a copy of the entry for `key` if it holds a `T`.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        let entry = self.cache.get(key)?;
        let data = entry.data.downcast_ref::<T>()?.clone();
        Some(entry.value().clone().map(|_| data))
    }

    /// Returns `true` if `key` holds a value that is neither invalidated nor
    /// older than `stale_time`.
    pub fn is_fresh(&self, key: &QueryKey, stale_time: Duration) -> bool {
        self.cache
            .get(key)
            .is_some_and(|entry| !entry.is_stale(stale_time))
    }

    /// Hands out the sequence number for a fetch that is about to be issued.
    pub(crate) fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Stores the outcome of fetch `seq` unless a later fetch or write already
    /// landed. Returns whether the value was stored.
    pub(crate) fn resolve<T: Send + Sync + 'static>(&self, key: QueryKey, seq: u64, data: T) -> bool {
        match self.cache.entry(key) {
            Entry::Occupied(occupied) if occupied.get().seq > seq => {
                tracing::debug!(
                    %key,
                    seq,
                    current = occupied.get().seq,
                    "dropping out-of-order response"
                );
                false
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(CacheEntry::new(Arc::new(data), seq));
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(Arc::new(data), seq));
                true
            }
        }
    }

    /// Writes `data` for `key` directly, without a request, and pushes it to
    /// running queries for that key.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, data: T) {
        let seq = self.next_seq();
        self.resolve(key, seq, data);
        tracing::debug!(%key, seq, "cache entry written");
        self.notify(CacheEvent::Updated(key));
    }

    /// Marks `key` stale and tells running queries to refetch it.
    ///
    /// Returned as a command so `update` stays free of side effects; the
    /// command produces no message.
    pub fn invalidate<Msg: Send + 'static>(self: &Arc<Self>, key: QueryKey) -> Command<Msg> {
        let client = Arc::clone(self);
        Command::silent(async move {
            if let Some(mut entry) = client.cache.get_mut(&key) {
                entry.invalidate();
            }
            tracing::debug!(%key, "cache entry invalidated");
            client.notify(CacheEvent::Invalidated(key));
        })
    }

    /// Fills `key` ahead of time unless it is already fresh for `stale_time`.
    ///
    /// Failures are logged and otherwise ignored. The command produces no
    /// message.
    pub fn prefetch<T, F, Msg>(self: &Arc<Self>, key: QueryKey, stale_time: Duration, fetcher: F) -> Command<Msg>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> BoxFuture<'static, Result<T, QueryError>> + Send + 'static,
        Msg: Send + 'static,
    {
        let client = Arc::clone(self);
        Command::silent(async move {
            if client.is_fresh(&key, stale_time) {
                tracing::trace!(%key, "prefetch skipped, entry is fresh");
                return;
            }
            let seq = client.next_seq();
            match fetcher().await {
                Ok(data) => {
                    if client.resolve(key, seq, data) {
                        tracing::debug!(%key, seq, "prefetched");
                        client.notify(CacheEvent::Updated(key));
                    }
                }
                Err(e) => tracing::debug!(%key, error = %e, "prefetch failed"),
            }
        })
    }

    /// Drops entries written longer ago than the configured cache time.
    /// Returns how many were removed.
    pub fn collect_garbage(&self) -> usize {
        let before = self.cache.len();
        let cache_time = self.config.cache_time;
        self.cache.retain(|_, entry| !entry.should_gc(cache_time));
        let removed = before - self.cache.len();
        if removed > 0 {
            tracing::debug!(removed, "collected cache entries");
        }
        removed
    }

    /// Removes everything. Used on shutdown.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: CacheEvent) {
        // No receivers just means no query is running.
        let _ = self.events.send(event);
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}
