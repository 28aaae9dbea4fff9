use futures::{
    FutureExt, Stream, StreamExt,
    stream::{self, BoxStream, select_all},
};

/// An action emitted by a running command.
pub enum Action<Msg> {
    /// Deliver a message to `Application::update`.
    Message(Msg),

    /// Stop the runtime after the current message.
    Quit,
}

impl<Msg> Action<Msg> {
    fn map<N>(self, f: impl FnOnce(Msg) -> N) -> Action<N> {
        match self {
            Self::Message(msg) => Action::Message(f(msg)),
            Self::Quit => Action::Quit,
        }
    }
}

/// An asynchronous side effect that feeds messages back into the application.
///
/// Commands are returned from `Application::new` and `Application::update`.
/// Every HTTP request the client makes is wrapped in one, so `update` itself
/// never blocks.
///
/// # Examples
///
/// ```
/// use roster::command::Command;
///
/// enum Message {
///     Deleted(u64),
/// }
///
/// let cmd = Command::perform(async { 5 }, Message::Deleted);
/// # drop(cmd);
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) stream: Option<BoxStream<'static, Action<Msg>>>,
}

impl<Msg: Send + 'static> Command<Msg> {
    /// A command that does nothing.
    #[must_use]
    pub fn none() -> Self {
        Self { stream: None }
    }

    /// Runs `future` and converts its output into a message with `f`.
    pub fn perform<A>(
        future: impl Future<Output = A> + Send + 'static,
        f: impl FnOnce(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::future(future.map(f))
    }

    /// Runs a future that already produces a message.
    pub fn future(future: impl Future<Output = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(future.into_stream().map(Action::Message).boxed()),
        }
    }

    /// Delivers `msg` on the next turn of the event loop.
    pub fn message(msg: Msg) -> Self {
        Self::effect(Action::Message(msg))
    }

    /// Performs a single action.
    ///
    /// ```
    /// use roster::command::{Action, Command};
    ///
    /// let quit: Command<()> = Command::effect(Action::Quit);
    /// # drop(quit);
    /// ```
    pub fn effect(action: Action<Msg>) -> Self {
        Self {
            stream: Some(stream::once(async move { action }).boxed()),
        }
    }

    /// Runs a future for its side effect only; no message is produced.
    pub fn silent(future: impl Future<Output = ()> + Send + 'static) -> Self {
        Self {
            stream: Some(
                future
                    .into_stream()
                    .filter_map(|()| async { None::<Action<Msg>> })
                    .boxed(),
            ),
        }
    }

    /// Runs several commands concurrently. Message order is not guaranteed and
    /// `Command::none()` entries are dropped.
    pub fn batch(commands: impl IntoIterator<Item = Self>) -> Self {
        let streams: Vec<_> = commands.into_iter().filter_map(|cmd| cmd.stream).collect();

        if streams.is_empty() {
            Self::none()
        } else {
            Self {
                stream: Some(select_all(streams).boxed()),
            }
        }
    }

    /// Forwards every item of `stream` as a message.
    pub fn stream(stream: impl Stream<Item = Msg> + Send + 'static) -> Self {
        Self {
            stream: Some(stream.map(Action::Message).boxed()),
        }
    }

    /// Converts the messages of this command, typically to lift a view's
    /// messages into the application's message type.
    #[must_use]
    pub fn map<N, F>(self, f: F) -> Command<N>
    where
        N: Send + 'static,
        F: Fn(Msg) -> N + Send + 'static,
    {
        Command {
            stream: self
                .stream
                .map(|stream| stream.map(move |action| action.map(&f)).boxed()),
        }
    }

    /// Returns `true` if this command performs nothing.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.stream.is_none()
    }
}

#[cfg(test)]
impl<Msg: Send + 'static> Command<Msg> {
    /// Drives the command to completion and returns the messages it produced.
    pub(crate) async fn collect_messages(self) -> Vec<Msg> {
        match self.stream {
            Some(stream) => {
                stream
                    .filter_map(|action| async move {
                        match action {
                            Action::Message(msg) => Some(msg),
                            Action::Quit => None,
                        }
                    })
                    .collect()
                    .await
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_has_no_stream() {
        let cmd: Command<i32> = Command::none();
        assert!(cmd.is_none());
        assert!(cmd.collect_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_collects_all_messages() {
        let cmd = Command::batch(vec![
            Command::future(async { 1 }),
            Command::none(),
            Command::future(async { 3 }),
        ]);

        let mut messages = cmd.collect_messages().await;
        messages.sort_unstable();
        assert_eq!(messages, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_batch_of_nothing_is_none() {
        let cmd: Command<i32> = Command::batch(vec![Command::none(), Command::none()]);
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn test_map_converts_messages() {
        #[derive(Debug, PartialEq)]
        enum Outer {
            Child(u64),
        }

        let cmd = Command::perform(async { 5_u64 }, |id| id * 2).map(Outer::Child);
        assert_eq!(cmd.collect_messages().await, vec![Outer::Child(10)]);
    }

    #[tokio::test]
    async fn test_map_keeps_quit() {
        let cmd: Command<u8> = Command::effect(Action::Quit);
        let mapped: Command<String> = cmd.map(|n| n.to_string());

        let mut stream = mapped.stream.expect("stream should exist");
        assert!(matches!(stream.next().await, Some(Action::Quit)));
    }

    #[tokio::test]
    async fn test_silent_runs_without_messages() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let cmd: Command<()> = Command::silent(async move {
            let _ = tx.send(42);
        });

        assert!(cmd.collect_messages().await.is_empty());
        assert_eq!(rx.await.expect("side effect should run"), 42);
    }

    #[tokio::test]
    async fn test_message_is_delivered() {
        let cmd = Command::message("hello");
        assert_eq!(cmd.collect_messages().await, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_stream_forwards_items() {
        let cmd = Command::stream(stream::iter(vec![1, 2, 3]));
        assert_eq!(cmd.collect_messages().await, vec![1, 2, 3]);
    }
}
