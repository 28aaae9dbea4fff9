//! Periodic ticks.
//!
//! The application uses [`Every`] to expire notifications and to sweep old
//! query cache entries. A timer only runs while it is part of the
//! subscription list, so an app without visible notifications does not wake up
//! for them.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::wrappers::IntervalStream;

use super::{SubscriptionId, SubscriptionSource};

/// Emits the current [`Instant`] once per period.
///
/// Missed ticks are skipped rather than replayed. The first tick arrives one
/// full period after the subscription starts.
///
/// ```rust
/// use std::time::Duration;
/// use roster::subscription::{Subscription, time::Every};
///
/// enum Message {
///     Tick,
/// }
///
/// let sub = Subscription::new(Every::new(Duration::from_millis(250))).map(|_| Message::Tick);
/// # drop(sub);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Every {
    period: Duration,
}

impl Every {
    /// Creates a timer with the given period. Zero periods are clamped to one millisecond.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Returns the tick period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl SubscriptionSource for Every {
    type Output = Instant;

    fn stream(&self) -> BoxStream<'static, Instant> {
        let mut ticks = interval(self.period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        IntervalStream::new(ticks)
            .skip(1)
            .map(tokio::time::Instant::into_std)
            .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_id_follows_period() {
        let a = Every::new(Duration::from_secs(1));
        let b = Every::new(Duration::from_secs(1));
        let c = Every::new(Duration::from_secs(2));
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_zero_period_is_clamped() {
        assert_eq!(Every::new(Duration::ZERO).period(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_produces_ticks() {
        let mut stream = Every::new(Duration::from_millis(10)).stream();
        for _ in 0..3 {
            let tick = timeout(Duration::from_millis(200), stream.next()).await;
            assert!(matches!(tick, Ok(Some(_))));
        }
    }

    #[tokio::test]
    async fn test_no_immediate_tick() {
        let mut stream = Every::new(Duration::from_millis(100)).stream();
        let early = timeout(Duration::from_millis(50), stream.next()).await;
        assert!(early.is_err(), "timer should wait a full period first");
    }
}
