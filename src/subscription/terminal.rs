//! Keyboard and mouse input.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;

use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use futures::stream::BoxStream;

use super::{SubscriptionId, SubscriptionSource};

/// Terminal events read through crossterm's [`EventStream`].
///
/// Read errors are forwarded as `Err` items so the application can decide
/// whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalEvents;

impl TerminalEvents {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SubscriptionSource for TerminalEvents {
    type Output = io::Result<Event>;

    fn stream(&self) -> BoxStream<'static, io::Result<Event>> {
        EventStream::new().boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

impl Hash for TerminalEvents {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "terminal".hash(state);
    }
}
