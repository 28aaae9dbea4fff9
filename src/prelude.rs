//! Common imports for writing screens.
//!
//! ```
//! use roster::prelude::*;
//! ```

pub use crate::application::Application;
pub use crate::command::{Action, Command};
pub use crate::query::{Mutation, MutationState, Query, QueryClient, QueryKey, QueryResult, QueryState};
pub use crate::runtime::Runtime;
pub use crate::subscription::{Subscription, SubscriptionSource};
