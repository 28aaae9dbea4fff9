//! Long-running message sources.
//!
//! A [`Subscription`] wraps a [`SubscriptionSource`] (terminal input, a timer, a
//! cached query) and turns its output into application messages. Applications
//! return the subscriptions they currently want from
//! [`Application::subscriptions`](crate::application::Application::subscriptions);
//! the runtime diffs that list by [`SubscriptionId`] after every update, starting
//! new sources and cancelling the ones that disappeared.

pub mod mock;
pub mod terminal;
pub mod time;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command::Action;

/// Identity of a subscription, used to decide whether a running source can be kept.
///
/// Two sources with the same concrete type and the same hash are considered the
/// same subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    type_id: TypeId,
    hash: u64,
}

impl SubscriptionId {
    /// Builds an id for a source of type `T` with the given hash.
    #[must_use]
    pub fn of<T: 'static>(hash: u64) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            hash,
        }
    }
}

/// A source of values that can be turned into a [`Subscription`].
pub trait SubscriptionSource: Send {
    /// The type of values produced by the source.
    type Output;

    /// Creates a fresh stream of values. Called each time the subscription starts.
    fn stream(&self) -> BoxStream<'static, Self::Output>;

    /// Returns the identity of this source.
    fn id(&self) -> SubscriptionId;
}

type Spawn<Msg> = Box<dyn Fn() -> BoxStream<'static, Msg> + Send>;

/// A subscription producing messages of type `Msg`.
pub struct Subscription<Msg> {
    pub(crate) id: SubscriptionId,
    pub(crate) spawn: Spawn<Msg>,
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// Wraps a source into a subscription.
    pub fn new<S>(source: S) -> Self
    where
        S: SubscriptionSource<Output = Msg> + 'static,
    {
        let id = source.id();
        Self {
            id,
            spawn: Box::new(move || source.stream()),
        }
    }

    /// Converts every produced value with `f`.
    ///
    /// The id is preserved, so mapping does not restart a running subscription.
    pub fn map<F, N>(self, f: F) -> Subscription<N>
    where
        F: Fn(Msg) -> N + Send + Sync + 'static,
        N: Send + 'static,
    {
        let spawn = self.spawn;
        let f = Arc::new(f);
        Subscription {
            id: self.id,
            spawn: Box::new(move || {
                let f = Arc::clone(&f);
                spawn().map(move |msg| f(msg)).boxed()
            }),
        }
    }

    /// Returns the id of this subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Handle for a running subscription task
struct Handle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

/// Keeps the set of running subscriptions in sync with what the application asks for.
pub(crate) struct SubscriptionManager<Msg> {
    running: HashMap<SubscriptionId, Handle>,
    tx: mpsc::UnboundedSender<Action<Msg>>,
}

impl<Msg: Send + 'static> SubscriptionManager<Msg> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Action<Msg>>) -> Self {
        Self {
            running: HashMap::new(),
            tx,
        }
    }

    /// Starts subscriptions that are new and cancels those no longer requested.
    pub(crate) fn update(&mut self, subscriptions: Vec<Subscription<Msg>>) {
        let wanted: HashSet<SubscriptionId> = subscriptions.iter().map(|sub| sub.id).collect();

        self.running.retain(|id, handle| {
            let keep = wanted.contains(id) && !handle.join.is_finished();
            if !keep {
                handle.token.cancel();
            }
            keep
        });

        for sub in subscriptions {
            if self.running.contains_key(&sub.id) {
                continue;
            }
            let handle = self.spawn(&sub);
            self.running.insert(sub.id, handle);
        }
    }

    fn spawn(&self, sub: &Subscription<Msg>) -> Handle {
        let token = CancellationToken::new();
        let mut stream = (sub.spawn)();
        let tx = self.tx.clone();
        let child = token.clone();

        let join = tokio::spawn(async move {
            tokio::select! {
                () = child.cancelled() => {}
                () = async {
                    while let Some(msg) = stream.next().await {
                        if tx.send(Action::Message(msg)).is_err() {
                            break;
                        }
                    }
                } => {}
            }
        });

        Handle { token, join }
    }

    /// Number of subscriptions currently running.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }

    /// Cancels every running subscription and waits for the tasks to finish.
    pub(crate) async fn shutdown(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.token.cancel();
            let _ = handle.join.await;
        }
    }
}
