//! Cached queries as subscriptions.
//!
//! A [`Query`] is a subscription bound to one [`QueryKey`]. While it runs:
//!
//! 1. a cached value is emitted right away; a missing one emits `Loading`
//! 2. missing or stale values are fetched and the result is emitted
//! 3. invalidation of the key triggers a refetch, and direct writes to the key
//!    are re-emitted without a request
//!
//! Switching a view to another key means returning a different `Query` from
//! `subscriptions()`; the runtime stops the old one. Results carry their key so
//! a late result from the old key can be told apart.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::api::ApiError;
use crate::subscription::{SubscriptionId, SubscriptionSource};

use super::client::{CacheEvent, QueryClient};
use super::key::QueryKey;

/// Why a fetch failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Cancelled => Self::Cancelled,
            ApiError::Network(msg) => Self::Network(msg),
            other => Self::Fetch(other.to_string()),
        }
    }
}

/// What a view currently knows about a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState<T> {
    /// Nothing to show yet; a fetch is running.
    Loading,
    /// Data for the current key.
    Success {
        data: T,
        /// A refetch is running or about to run.
        is_stale: bool,
    },
    /// Data from the previous key, shown while the current key loads.
    Placeholder { data: T },
    /// The last fetch failed.
    Error(String),
}

impl<T: Clone> QueryState<T> {
    /// Keeps showing the previous data while this state is still loading.
    ///
    /// ```
    /// use roster::query::QueryState;
    ///
    /// let page_one = QueryState::Success { data: vec![1, 2], is_stale: false };
    /// let page_two = QueryState::Loading.keep_previous(&page_one);
    /// assert_eq!(page_two, QueryState::Placeholder { data: vec![1, 2] });
    /// ```
    #[must_use]
    pub fn keep_previous(self, previous: &Self) -> Self {
        match (self, previous) {
            (Self::Loading, Self::Success { data, .. } | Self::Placeholder { data }) => {
                Self::Placeholder { data: data.clone() }
            }
            (state, _) => state,
        }
    }
}

impl<T> QueryState<T> {
    /// Data to display, whether current or placeholder.
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } | Self::Placeholder { data } => Some(data),
            Self::Loading | Self::Error(_) => None,
        }
    }

    /// `true` only when there is nothing at all to show.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// One emission of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<T> {
    pub key: QueryKey,
    pub state: QueryState<T>,
}

impl<T> QueryResult<T> {
    pub const fn data(&self) -> Option<&T> {
        self.state.data()
    }

    pub const fn is_loading(&self) -> bool {
        self.state.is_pending()
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.state, QueryState::Success { .. })
    }

    pub const fn is_error(&self) -> bool {
        self.state.is_error()
    }

    pub const fn is_stale(&self) -> bool {
        matches!(self.state, QueryState::Success { is_stale: true, .. })
    }
}

type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync>;

/// A subscription that keeps one cache key loaded.
///
/// ```rust,ignore
/// let detail = Subscription::new(
///     Query::new(
///         QueryKey::Student { id },
///         move || service.get(id).map_err(QueryError::from).boxed(),
///         client.clone(),
///     )
///     .stale_time(Duration::from_secs(10)),
/// )
/// .map(FormMessage::Detail);
/// ```
pub struct Query<V> {
    key: QueryKey,
    fetcher: Fetcher<V>,
    client: Arc<QueryClient>,
    stale_time: Option<Duration>,
}

impl<V> Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new<F>(key: QueryKey, fetcher: F, client: Arc<QueryClient>) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync + 'static,
    {
        Self {
            key,
            fetcher: Arc::new(fetcher),
            client,
            stale_time: None,
        }
    }

    /// Overrides the client's default stale time for this query.
    #[must_use]
    pub const fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub const fn key(&self) -> QueryKey {
        self.key
    }
}

/// Internal state machine for the query stream.
enum State {
    Initial,
    Fetching { rx: broadcast::Receiver<CacheEvent> },
    Watching { rx: broadcast::Receiver<CacheEvent> },
}

struct Context<V> {
    key: QueryKey,
    fetcher: Fetcher<V>,
    client: Arc<QueryClient>,
    stale_time: Duration,
}

impl<V: Clone + Send + Sync + 'static> Context<V> {
    fn emit(&self, state: QueryState<V>) -> QueryResult<V> {
        QueryResult {
            key: self.key,
            state,
        }
    }

    /// The cached value, flagged stale, or `Loading` if there is none.
    fn cached_or_loading(&self) -> QueryState<V> {
        match self.client.get::<V>(&self.key) {
            Some(entry) => QueryState::Success {
                data: entry.data,
                is_stale: true,
            },
            None => QueryState::Loading,
        }
    }

    async fn fetch(&self) -> QueryState<V> {
        let seq = self.client.next_seq();
        tracing::debug!(key = %self.key, seq, "fetching");

        match (self.fetcher)().await {
            Ok(data) => {
                if self.client.resolve(self.key, seq, data.clone()) {
                    QueryState::Success {
                        data,
                        is_stale: false,
                    }
                } else {
                    // A newer write landed while this fetch was in flight.
                    self.client
                        .get::<V>(&self.key)
                        .map_or(QueryState::Success { data, is_stale: false }, |entry| {
                            QueryState::Success {
                                data: entry.data,
                                is_stale: false,
                            }
                        })
                }
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "query failed");
                QueryState::Error(e.to_string())
            }
        }
    }

    async fn step(&self, state: State) -> Option<(QueryResult<V>, State)> {
        match state {
            State::Initial => {
                // Subscribe before reading the cache so no event is missed.
                let rx = self.client.subscribe();
                match self.client.get::<V>(&self.key) {
                    Some(entry) if !entry.is_stale(self.stale_time) => {
                        let state = QueryState::Success {
                            data: entry.data,
                            is_stale: false,
                        };
                        Some((self.emit(state), State::Watching { rx }))
                    }
                    Some(entry) => {
                        let state = QueryState::Success {
                            data: entry.data,
                            is_stale: true,
                        };
                        Some((self.emit(state), State::Fetching { rx }))
                    }
                    None => Some((self.emit(QueryState::Loading), State::Fetching { rx })),
                }
            }

            State::Fetching { rx } => {
                let state = self.fetch().await;
                Some((self.emit(state), State::Watching { rx }))
            }

            State::Watching { mut rx } => loop {
                match rx.recv().await {
                    Ok(CacheEvent::Invalidated(key)) if key == self.key => {
                        let state = self.cached_or_loading();
                        return Some((self.emit(state), State::Fetching { rx }));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed events may include this key's invalidation.
                        tracing::debug!(key = %self.key, skipped, "cache events lagged, refetching");
                        let state = self.cached_or_loading();
                        return Some((self.emit(state), State::Fetching { rx }));
                    }
                    Ok(CacheEvent::Updated(key)) if key == self.key => {
                        if let Some(entry) = self.client.get::<V>(&self.key) {
                            let state = QueryState::Success {
                                data: entry.data,
                                is_stale: false,
                            };
                            return Some((self.emit(state), State::Watching { rx }));
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Closed) => return None,
                }
            },
        }
    }
}

impl<V> SubscriptionSource for Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = QueryResult<V>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        let context = Arc::new(Context {
            key: self.key,
            fetcher: Arc::clone(&self.fetcher),
            client: Arc::clone(&self.client),
            stale_time: self
                .stale_time
                .unwrap_or(self.client.config().stale_time),
        });

        stream::unfold(State::Initial, move |state| {
            let context = Arc::clone(&context);
            async move { context.step(state).await }
        })
        .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

impl<V> Hash for Query<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
