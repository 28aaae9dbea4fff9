//! Writes against the server.
//!
//! A mutation is a one-off command rather than a subscription: it starts when
//! the user submits and ends with a single result message. Views keep a
//! [`MutationState`] next to their form to know what to render, and follow a
//! successful write with [`QueryClient::invalidate`](super::QueryClient::invalidate)
//! or [`QueryClient::set_query_data`](super::QueryClient::set_query_data).
//!
//! ```rust,ignore
//! FormMessage::Submit => {
//!     self.create = MutationState::Pending;
//!     let service = Arc::clone(&self.service);
//!     Mutation::mutate(self.draft.clone(), move |draft| service.create(draft))
//!         .map(FormMessage::Created)
//! }
//! ```

use std::marker::PhantomData;

use futures::future::BoxFuture;

use crate::command::Command;

/// Lifecycle of one mutation as seen by a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutationState<T, E = String> {
    #[default]
    Idle,
    Pending,
    Success(T),
    Error(E),
}

impl<T, E> MutationState<T, E> {
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Back to `Idle`, forgetting any result.
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    /// Records the outcome of a finished mutation.
    pub fn settle(&mut self, result: Result<T, E>) {
        *self = match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::Error(e),
        };
    }
}

/// Runs writes as commands.
pub struct Mutation<I, O, E> {
    _phantom: PhantomData<(I, O, E)>,
}

impl<I, O, E> Mutation<I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    /// Runs `mutator` with `input` and yields its result as the command's only
    /// message. Map it into the caller's message type with [`Command::map`].
    pub fn mutate<F>(input: I, mutator: F) -> Command<Result<O, E>>
    where
        F: FnOnce(I) -> BoxFuture<'static, Result<O, E>> + Send + 'static,
    {
        Command::future(async move { mutator(input).await })
    }
}
