use std::time::Duration;

/// Cache timing defaults shared by every query of a [`QueryClient`](super::QueryClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long data is considered fresh.
    ///
    /// Fresh data is served from the cache without a request. Stale data is
    /// still served, but a refetch starts right away. Individual queries may
    /// override this with [`Query::stale_time`](super::Query::stale_time).
    pub stale_time: Duration,

    /// How long an entry is kept after it was last written before
    /// [`QueryClient::collect_garbage`](super::QueryClient::collect_garbage) drops it.
    pub cache_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            cache_time: Duration::from_secs(5 * 60),
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub const fn new(stale_time: Duration, cache_time: Duration) -> Self {
        Self {
            stale_time,
            cache_time,
        }
    }
}
