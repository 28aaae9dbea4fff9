//! The application shell: routing, notifications and global keys.

use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::application::Application;
use crate::command::{Action, Command};
use crate::notify::Toasts;
use crate::route::Route;
use crate::subscription::terminal::TerminalEvents;
use crate::subscription::time::Every;
use crate::subscription::Subscription;
use crate::views::{Context, FormMessage, FormMode, ListMessage, StudentForm, StudentList};

const TOAST_TICK: Duration = Duration::from_millis(250);
const GC_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct AppFlags {
    pub context: Context,
    pub toast_ttl: Duration,
    pub route: Route,
}

#[derive(Debug)]
pub enum Message {
    Terminal(Event),
    TerminalError(std::io::Error),
    List(ListMessage),
    Form(FormMessage),
    Navigate(Route),
    PruneToasts(Instant),
    CollectGarbage,
}

enum Screen {
    List,
    Form(Box<StudentForm>),
    NotFound(String),
}

pub struct StudentsApp {
    context: Context,
    list: StudentList,
    screen: Screen,
    toasts: Toasts,
}

impl StudentsApp {
    /// The path of the screen currently shown.
    pub fn route(&self) -> Route {
        match &self.screen {
            Screen::List => Route::Students {
                page: self.list.page(),
            },
            Screen::Form(form) => match form.mode() {
                FormMode::Create => Route::AddStudent,
                FormMode::Edit(id) => Route::EditStudent { id },
            },
            Screen::NotFound(path) => Route::NotFound(path.clone()),
        }
    }

    pub const fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    fn navigate(&mut self, route: Route) {
        tracing::info!(%route, "navigate");
        self.screen = match route {
            Route::Students { page } => {
                self.list.go_to(page);
                Screen::List
            }
            Route::AddStudent => Screen::Form(Box::new(StudentForm::new(self.context.clone(), FormMode::Create))),
            Route::EditStudent { id } => {
                Screen::Form(Box::new(StudentForm::new(self.context.clone(), FormMode::Edit(id))))
            }
            Route::NotFound(path) => Screen::NotFound(path),
        };
    }

    fn back_to_list(&mut self) {
        self.navigate(Route::Students {
            page: self.list.page(),
        });
    }

    fn on_key(&mut self, key: KeyEvent) -> Command<Message> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Command::effect(Action::Quit);
        }

        match &self.screen {
            Screen::List if key.code == KeyCode::Char('q') => Command::effect(Action::Quit),
            Screen::List => match self.list.on_key(key) {
                Some(msg) => self.update_list(msg),
                None => Command::none(),
            },
            Screen::Form(form) => match form.on_key(key) {
                Some(msg) => self.update_form(msg),
                None => Command::none(),
            },
            Screen::NotFound(_) if key.code == KeyCode::Char('q') => Command::effect(Action::Quit),
            Screen::NotFound(_) => {
                self.back_to_list();
                Command::none()
            }
        }
    }

    fn update_list(&mut self, msg: ListMessage) -> Command<Message> {
        match msg {
            ListMessage::Open(route) => {
                self.navigate(route);
                Command::none()
            }
            ListMessage::Notify(notice) => {
                self.toasts.push(notice);
                Command::none()
            }
            msg => self.list.update(msg).map(Message::List),
        }
    }

    fn update_form(&mut self, msg: FormMessage) -> Command<Message> {
        match msg {
            FormMessage::Back => {
                self.back_to_list();
                Command::none()
            }
            FormMessage::Notify(notice) => {
                self.toasts.push(notice);
                Command::none()
            }
            msg => match &mut self.screen {
                Screen::Form(form) => form.update(msg).map(Message::Form),
                _ => Command::none(),
            },
        }
    }
}

impl Application for StudentsApp {
    type Message = Message;
    type Flags = AppFlags;

    fn new(flags: AppFlags) -> (Self, Command<Message>) {
        let mut app = Self {
            list: StudentList::new(flags.context.clone(), 1),
            context: flags.context,
            screen: Screen::List,
            toasts: Toasts::new(flags.toast_ttl),
        };
        app.navigate(flags.route);
        (app, Command::none())
    }

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => self.on_key(key),
            Message::Terminal(Event::Mouse(mouse)) if matches!(self.screen, Screen::List) => {
                match self.list.on_mouse(mouse) {
                    Some(msg) => self.update_list(msg),
                    None => Command::none(),
                }
            }
            Message::Terminal(_) => Command::none(),
            Message::TerminalError(e) => {
                tracing::warn!(error = %e, "terminal input failed");
                Command::none()
            }
            Message::List(msg) => self.update_list(msg),
            Message::Form(msg) => self.update_form(msg),
            Message::Navigate(route) => {
                self.navigate(route);
                Command::none()
            }
            Message::PruneToasts(now) => {
                self.toasts.prune(now);
                Command::none()
            }
            Message::CollectGarbage => {
                self.context.client.collect_garbage();
                Command::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame<'_>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(format!(" roster {} ", self.route())).bold());
        let area = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        match &self.screen {
            Screen::List => self.list.view(frame, area),
            Screen::Form(form) => form.view(frame, area),
            Screen::NotFound(path) => {
                let [message] = Layout::vertical([Constraint::Length(2)]).areas(area);
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::from(format!("Not found: {path}")),
                        Line::from("Press any key to return to the list").dim(),
                    ]),
                    message,
                );
            }
        }

        self.toasts.render(frame, area);
    }

    fn subscriptions(&self) -> Vec<Subscription<Message>> {
        let mut subs = vec![
            Subscription::new(TerminalEvents::new()).map(|result| match result {
                Ok(event) => Message::Terminal(event),
                Err(e) => Message::TerminalError(e),
            }),
            Subscription::new(Every::new(GC_INTERVAL)).map(|_| Message::CollectGarbage),
        ];

        match &self.screen {
            Screen::List => subs.extend(self.list.subscriptions().into_iter().map(|s| s.map(Message::List))),
            Screen::Form(form) => subs.extend(form.subscriptions().into_iter().map(|s| s.map(Message::Form))),
            Screen::NotFound(_) => {}
        }

        if !self.toasts.is_empty() {
            subs.push(Subscription::new(Every::new(TOAST_TICK)).map(Message::PruneToasts));
        }
        subs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::fixtures;
    use crate::model::{Page, Student};
    use crate::notify::Notice;
    use crate::query::{QueryKey, QueryResult, QueryState};
    use crate::views::testing::{context, render};
    use std::sync::Arc;

    fn app(route: Route) -> StudentsApp {
        let (context, _) = context(25);
        StudentsApp::new(AppFlags {
            context,
            toast_ttl: Duration::from_secs(3),
            route,
        })
        .0
    }

    fn press(code: KeyCode) -> Message {
        Message::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn test_initial_route() {
        assert_eq!(app(Route::Students { page: 3 }).route(), Route::Students { page: 3 });
        assert_eq!(app(Route::EditStudent { id: 5 }).route(), Route::EditStudent { id: 5 });
    }

    #[test]
    fn test_escape_returns_to_last_list_page() {
        let mut app = app(Route::Students { page: 2 });
        let _ = app.update(press(KeyCode::Char('a')));
        assert_eq!(app.route(), Route::AddStudent);

        let _ = app.update(press(KeyCode::Esc));
        assert_eq!(app.route(), Route::Students { page: 2 });
    }

    #[test]
    fn test_list_edit_opens_form_for_selected() {
        let mut app = app(Route::default());
        let _ = app.update(Message::List(ListMessage::Page(QueryResult {
            key: QueryKey::Students { page: 1 },
            state: QueryState::Success {
                data: Page::new(fixtures::students(10), Some(25)),
                is_stale: false,
            },
        })));
        let _ = app.update(press(KeyCode::Down));
        let _ = app.update(press(KeyCode::Down));
        let _ = app.update(press(KeyCode::Char('e')));

        assert_eq!(app.route(), Route::EditStudent { id: 2 });
    }

    #[test]
    fn test_notifications_show_and_expire() {
        let mut app = app(Route::default());
        let base = app.subscriptions().len();

        let _ = app.update(Message::List(ListMessage::Notify(Notice::Deleted(5))));
        assert!(!app.toasts().is_empty());
        assert_eq!(app.subscriptions().len(), base + 1);

        let screen = render(100, 30, |frame| app.view(frame));
        assert!(screen.contains("Deleted student id: 5"));

        let _ = app.update(Message::PruneToasts(Instant::now() + Duration::from_secs(5)));
        assert!(app.toasts().is_empty());
        assert_eq!(app.subscriptions().len(), base);
    }

    #[test]
    fn test_unknown_route_then_any_key() {
        let mut app = app(Route::parse("/courses"));
        let screen = render(60, 10, |frame| app.view(frame));
        assert!(screen.contains("Not found: /courses"));

        let _ = app.update(press(KeyCode::Char('x')));
        assert_eq!(app.route(), Route::Students { page: 1 });
    }

    #[test]
    fn test_garbage_collection_message() {
        let (context, _) = context(0);
        let client = Arc::clone(&context.client);
        let mut app = StudentsApp::new(AppFlags {
            context,
            toast_ttl: Duration::from_secs(3),
            route: Route::default(),
        })
        .0;
        client.set_query_data(QueryKey::Student { id: 1 }, fixtures::student(1));

        // Default cache time is five minutes, so nothing is old enough yet.
        let _ = app.update(Message::CollectGarbage);
        assert!(client.get::<Student>(&QueryKey::Student { id: 1 }).is_some());
    }
}
