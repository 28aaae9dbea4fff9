//! Server-state caching in the style of SWR or TanStack Query.
//!
//! - [`QueryClient`]: the shared cache, passed around as `Arc<QueryClient>`
//! - [`Query`]: a subscription that keeps one [`QueryKey`] loaded
//! - [`Mutation`]: a command that writes to the server
//!
//! Every fetch draws a sequence number from the client before it is issued.
//! When it completes, its result is stored only if no later fetch or direct
//! write for the same key has landed, so responses that arrive out of order
//! never overwrite newer data.
//!
//! ```rust,ignore
//! fn subscriptions(&self) -> Vec<Subscription<ListMessage>> {
//!     vec![
//!         Subscription::new(Query::new(
//!             QueryKey::Students { page: self.page },
//!             move || fetch_page(page),
//!             Arc::clone(&self.client),
//!         ))
//!         .map(ListMessage::Page),
//!     ]
//! }
//! ```

mod cache;
mod client;
mod config;
mod key;
pub mod mutation;
#[allow(clippy::module_inception)]
pub mod query;

pub use cache::CacheEntry;
pub use client::{CacheEvent, QueryClient};
pub use config::QueryConfig;
pub use key::QueryKey;
pub use mutation::{Mutation, MutationState};
pub use query::{Query, QueryError, QueryResult, QueryState};
