use ratatui::Frame;

use crate::{command::Command, subscription::Subscription};

/// A terminal application written in the Elm style.
///
/// State lives in `Self`, changes only in [`update`](Application::update), and is
/// drawn by [`view`](Application::view). Side effects go through [`Command`]s and
/// external inputs through [`Subscription`]s.
///
/// # Example
///
/// ```
/// use ratatui::{Frame, widgets::Paragraph};
/// use roster::{application::Application, command::Command, subscription::Subscription};
///
/// enum Message {
///     NextPage,
/// }
///
/// struct Pager {
///     page: u32,
/// }
///
/// impl Application for Pager {
///     type Message = Message;
///     type Flags = u32;
///
///     fn new(page: u32) -> (Self, Command<Message>) {
///         (Pager { page }, Command::none())
///     }
///
///     fn update(&mut self, msg: Message) -> Command<Message> {
///         match msg {
///             Message::NextPage => self.page += 1,
///         }
///         Command::none()
///     }
///
///     fn view(&self, frame: &mut Frame<'_>) {
///         frame.render_widget(Paragraph::new(format!("page {}", self.page)), frame.area());
///     }
///
///     fn subscriptions(&self) -> Vec<Subscription<Message>> {
///         vec![]
///     }
/// }
/// ```
pub trait Application: Sized {
    /// Everything that can happen to the application.
    type Message: Send + 'static;

    /// Start-up configuration, e.g. shared services and settings.
    type Flags: Clone + Send;

    /// Builds the initial state and a command to run at start-up.
    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>);

    /// Applies a message to the state.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Draws the current state. Must not change it.
    fn view(&self, frame: &mut Frame<'_>);

    /// The sources the application wants to listen to right now.
    ///
    /// Called after every update; sources are started and stopped by id.
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>>;
}
