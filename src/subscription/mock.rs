//! Controllable subscription source for tests.
//!
//! [`MockSource`] emits values on demand, so an application's reaction to
//! input can be exercised without a terminal, timers or a server.
//!
//! ```
//! use roster::subscription::{Subscription, mock::MockSource};
//!
//! let keys = MockSource::<char>::new();
//! let subscription = Subscription::new(keys.clone());
//!
//! // Nothing is listening yet, so emitting reports an error.
//! assert!(keys.emit('j').is_err());
//! # drop(subscription);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::{SubscriptionId, SubscriptionSource};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A subscription source that emits values when told to.
///
/// Clones share the same channel and the same id, so a clone kept by the test
/// drives the subscription returned from `subscriptions()`.
#[derive(Debug, Clone)]
pub struct MockSource<T: Clone> {
    sender: broadcast::Sender<T>,
    id: SubscriptionId,
}

impl<T: Clone + 'static> MockSource<T> {
    /// Creates a mock buffering at most `capacity` undelivered values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            id: SubscriptionId::of::<Self>(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// Creates a mock with a buffer of 100 values.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Emits a value to every running stream.
    ///
    /// # Errors
    ///
    /// Returns an error if no stream is listening.
    pub fn emit(&self, value: T) -> Result<usize, broadcast::error::SendError<T>> {
        self.sender.send(value)
    }

    /// Returns the number of running streams.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + 'static> Default for MockSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> SubscriptionSource for MockSource<T> {
    type Output = T;

    fn stream(&self) -> BoxStream<'static, T> {
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(|result| async move { result.ok() })
            .boxed()
    }

    fn id(&self) -> SubscriptionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::Subscription;

    #[test]
    fn test_distinct_mocks_have_distinct_ids() {
        let a = MockSource::<u8>::new();
        let b = MockSource::<u8>::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[tokio::test]
    async fn test_stream_receives_values() {
        let mock = MockSource::<u32>::new();
        let sub = Subscription::new(mock.clone());
        let mut stream = (sub.spawn)();

        mock.emit(1).expect("should emit to stream");
        mock.emit(2).expect("should emit to stream");

        assert_eq!(stream.next().await, Some(1));
        assert_eq!(stream.next().await, Some(2));
    }
}
