use std::time::{Duration, Instant};

/// A cached value with the bookkeeping needed to decide freshness and ordering.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    /// When the value was written.
    pub updated_at: Instant,
    /// Set by invalidation; cleared by the next write.
    pub is_invalidated: bool,
    /// Sequence number of the fetch or write that produced the value.
    pub seq: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, seq: u64) -> Self {
        Self {
            data,
            updated_at: Instant::now(),
            is_invalidated: false,
            seq,
        }
    }

    /// Invalidated entries are always stale; others once `stale_time` has passed.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        self.is_invalidated || self.updated_at.elapsed() >= stale_time
    }

    pub const fn invalidate(&mut self) {
        self.is_invalidated = true;
    }

    pub fn should_gc(&self, cache_time: Duration) -> bool {
        self.updated_at.elapsed() > cache_time
    }

    /// Replaces the payload, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            data: f(self.data),
            updated_at: self.updated_at,
            is_invalidated: self.is_invalidated,
            seq: self.seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_new_entry_is_fresh() {
        let entry = CacheEntry::new(42, 1);
        assert!(!entry.is_stale(Duration::from_secs(10)));
        assert!(!entry.is_invalidated);
    }

    #[test]
    fn test_zero_stale_time_is_immediately_stale() {
        let entry = CacheEntry::new(42, 1);
        assert!(entry.is_stale(Duration::ZERO));
    }

    #[test]
    fn test_stale_after_stale_time() {
        let entry = CacheEntry::new(42, 1);
        sleep(Duration::from_millis(10));
        assert!(entry.is_stale(Duration::from_millis(5)));
    }

    #[test]
    fn test_invalidated_entry_is_stale() {
        let mut entry = CacheEntry::new(42, 1);
        entry.invalidate();
        assert!(entry.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_should_gc() {
        let entry = CacheEntry::new(42, 1);
        assert!(!entry.should_gc(Duration::from_secs(60)));
        sleep(Duration::from_millis(10));
        assert!(entry.should_gc(Duration::from_millis(5)));
    }
}
