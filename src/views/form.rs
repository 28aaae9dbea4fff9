//! Create and edit form for a single student.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::Context;
use super::skeleton::LoadingBadge;
use crate::api::ApiError;
use crate::command::Command;
use crate::model::{Gender, Student, StudentDraft, StudentId};
use crate::notify::Notice;
use crate::query::{Mutation, MutationState, Query, QueryKey, QueryResult, QueryState};
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(StudentId),
}

/// Focusable parts of the form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Gender,
    Country,
    FirstName,
    LastName,
    Avatar,
    BtcAddress,
    Submit,
}

impl Field {
    pub const ALL: [Self; 8] = [
        Self::Email,
        Self::Gender,
        Self::Country,
        Self::FirstName,
        Self::LastName,
        Self::Avatar,
        Self::BtcAddress,
        Self::Submit,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email address",
            Self::Gender => "Gender",
            Self::Country => "Country",
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Avatar => "Avatar (base64)",
            Self::BtcAddress => "BTC address",
            Self::Submit => "Submit",
        }
    }
}

#[derive(Debug, Clone)]
pub enum FormMessage {
    Detail(QueryResult<Student>),
    FocusNext,
    FocusPrevious,
    Input(char),
    Backspace,
    GenderNext,
    GenderPrevious,
    Submit,
    Created(Result<Student, ApiError>),
    Updated(Result<Student, ApiError>),
    /// Handled by the shell.
    Back,
    /// Handled by the shell.
    Notify(Notice),
}

pub struct StudentForm {
    context: Context,
    mode: FormMode,
    draft: StudentDraft,
    focus: Field,
    detail: QueryState<Student>,
    create: MutationState<Student, ApiError>,
    update: MutationState<Student, ApiError>,
}

impl StudentForm {
    pub fn new(context: Context, mode: FormMode) -> Self {
        Self {
            context,
            mode,
            draft: StudentDraft::default(),
            focus: Field::Email,
            detail: QueryState::Loading,
            create: MutationState::Idle,
            update: MutationState::Idle,
        }
    }

    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    pub const fn draft(&self) -> &StudentDraft {
        &self.draft
    }

    pub const fn focus(&self) -> Field {
        self.focus
    }

    /// The mutation behind the submit button in the current mode.
    pub const fn submission(&self) -> &MutationState<Student, ApiError> {
        match self.mode {
            FormMode::Create => &self.create,
            FormMode::Edit(_) => &self.update,
        }
    }

    /// Message shown beside the email field after a 422 response.
    pub fn email_error(&self) -> Option<&str> {
        let errors = self.submission().error()?.field_errors()?;
        Some(errors.email.as_deref().unwrap_or_default())
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        let draft = &mut self.draft;
        match self.focus {
            Field::Email => Some(&mut draft.email),
            Field::Country => Some(&mut draft.country),
            Field::FirstName => Some(&mut draft.first_name),
            Field::LastName => Some(&mut draft.last_name),
            Field::Avatar => Some(&mut draft.avatar),
            Field::BtcAddress => Some(&mut draft.btc_address),
            Field::Gender | Field::Submit => None,
        }
    }

    /// A settled create result is cleared as soon as the draft changes.
    fn edited(&mut self) {
        if self.create.is_error() || self.create.is_success() {
            self.create.reset();
        }
    }

    pub fn update(&mut self, msg: FormMessage) -> Command<FormMessage> {
        match msg {
            FormMessage::Detail(result) => {
                let FormMode::Edit(id) = self.mode else {
                    return Command::none();
                };
                if result.key != (QueryKey::Student { id }) {
                    return Command::none();
                }
                if let Some(student) = result.data() {
                    self.draft = StudentDraft::from(student);
                }
                self.detail = result.state;
                Command::none()
            }
            FormMessage::FocusNext => {
                self.focus = self.focus.next();
                Command::none()
            }
            FormMessage::FocusPrevious => {
                self.focus = self.focus.previous();
                Command::none()
            }
            FormMessage::Input(c) => {
                if let Some(text) = self.text_mut() {
                    text.push(c);
                    self.edited();
                }
                Command::none()
            }
            FormMessage::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                    self.edited();
                }
                Command::none()
            }
            FormMessage::GenderNext | FormMessage::GenderPrevious if self.focus == Field::Gender => {
                self.draft.gender = if matches!(msg, FormMessage::GenderNext) {
                    self.draft.gender.next()
                } else {
                    self.draft.gender.previous()
                };
                self.edited();
                Command::none()
            }
            FormMessage::GenderNext | FormMessage::GenderPrevious => Command::none(),
            FormMessage::Submit => self.submit(),
            FormMessage::Created(result) => {
                let command = match &result {
                    Ok(student) => {
                        tracing::info!(id = student.id, "student created");
                        self.draft = StudentDraft::default();
                        Command::message(FormMessage::Notify(Notice::Added))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "create failed");
                        Command::none()
                    }
                };
                self.create.settle(result);
                command
            }
            FormMessage::Updated(result) => {
                let FormMode::Edit(id) = self.mode else {
                    return Command::none();
                };
                let command = match &result {
                    Ok(student) => {
                        tracing::info!(id, "student updated");
                        self.draft = StudentDraft::default();
                        self.context
                            .client
                            .set_query_data(QueryKey::Student { id }, student.clone());
                        Command::message(FormMessage::Notify(Notice::Updated(id)))
                    }
                    Err(e) => {
                        tracing::warn!(id, error = %e, "update failed");
                        Command::none()
                    }
                };
                self.update.settle(result);
                command
            }
            FormMessage::Back | FormMessage::Notify(_) => Command::none(),
        }
    }

    /// Sends the whole draft. Repeated submits each send a request.
    fn submit(&mut self) -> Command<FormMessage> {
        let service = Arc::clone(&self.context.service);
        match self.mode {
            FormMode::Create => {
                self.create = MutationState::Pending;
                Mutation::mutate(self.draft.clone(), move |draft| service.create(draft))
                    .map(FormMessage::Created)
            }
            FormMode::Edit(id) => {
                self.update = MutationState::Pending;
                Mutation::mutate(self.draft.clone().with_id(id), move |student| {
                    service.update(id, student)
                })
                .map(FormMessage::Updated)
            }
        }
    }

    pub fn on_key(&self, key: KeyEvent) -> Option<FormMessage> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => Some(FormMessage::Submit),
            KeyCode::Esc => Some(FormMessage::Back),
            KeyCode::Tab | KeyCode::Down => Some(FormMessage::FocusNext),
            KeyCode::BackTab | KeyCode::Up => Some(FormMessage::FocusPrevious),
            KeyCode::Enter if self.focus == Field::Submit => Some(FormMessage::Submit),
            KeyCode::Enter => Some(FormMessage::FocusNext),
            KeyCode::Left if self.focus == Field::Gender => Some(FormMessage::GenderPrevious),
            KeyCode::Right if self.focus == Field::Gender => Some(FormMessage::GenderNext),
            KeyCode::Backspace => Some(FormMessage::Backspace),
            KeyCode::Char(c) if !ctrl => Some(FormMessage::Input(c)),
            _ => None,
        }
    }

    pub fn subscriptions(&self) -> Vec<Subscription<FormMessage>> {
        match self.mode {
            FormMode::Create => vec![],
            FormMode::Edit(id) => vec![
                Subscription::new(
                    Query::new(
                        QueryKey::Student { id },
                        self.context.student_fetcher(id),
                        Arc::clone(&self.context.client),
                    )
                    .stale_time(self.context.detail_stale_time),
                )
                .map(FormMessage::Detail),
            ],
        }
    }

    pub fn view(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut constraints = vec![Constraint::Length(2)];
        constraints.extend(Field::ALL.iter().map(|field| match field {
            Field::Email => Constraint::Length(3),
            Field::Submit => Constraint::Length(1),
            _ => Constraint::Length(2),
        }));
        constraints.push(Constraint::Min(0));
        let areas = Layout::vertical(constraints).split(area);

        let title = match self.mode {
            FormMode::Create => "Add Student".to_string(),
            FormMode::Edit(id) => format!("Edit Student #{id}"),
        };
        frame.render_widget(Line::from(title).bold(), areas[0]);

        for (field, slot) in Field::ALL.iter().zip(areas.iter().skip(1)) {
            frame.render_widget(self.field_widget(*field), *slot);
        }

        if matches!(self.mode, FormMode::Edit(_)) && self.detail.is_pending() {
            frame.render_widget(LoadingBadge, area);
        }
    }

    fn field_widget(&self, field: Field) -> Paragraph<'_> {
        let focused = self.focus == field;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        };

        if field == Field::Submit {
            let text = if self.submission().is_pending() { "[ Submitting... ]" } else { "[ Submit ]" };
            return Paragraph::new(Span::styled(text, label_style.reversed()));
        }

        let mut lines = vec![Line::from(Span::styled(field.label(), label_style))];
        let value = match field {
            Field::Email => Some(&self.draft.email),
            Field::Country => Some(&self.draft.country),
            Field::FirstName => Some(&self.draft.first_name),
            Field::LastName => Some(&self.draft.last_name),
            Field::Avatar => Some(&self.draft.avatar),
            Field::BtcAddress => Some(&self.draft.btc_address),
            Field::Gender | Field::Submit => None,
        };

        match value {
            Some(text) => {
                let cursor = if focused { "▏" } else { "" };
                lines.push(Line::from(format!("  {text}{cursor}")));
            }
            None => {
                let options = Gender::ALL.iter().map(|gender| {
                    let mark = if *gender == self.draft.gender { "(•)" } else { "( )" };
                    Span::from(format!("  {mark} {gender}"))
                });
                lines.push(Line::from(options.collect::<Vec<_>>()));
            }
        }

        if field == Field::Email {
            if let Some(message) = self.email_error() {
                lines.push(Line::from(vec![
                    Span::from("  Error! ").fg(Color::Red),
                    Span::from(message).fg(Color::Red).bold(),
                ]));
            }
        }

        Paragraph::new(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FieldErrors;
    use crate::api::memory::{Request, fixtures};
    use crate::views::testing::{context, render};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;

    fn type_into(form: &mut StudentForm, field: Field, text: &str) {
        while form.focus() != field {
            let _ = form.update(FormMessage::FocusNext);
        }
        for c in text.chars() {
            let _ = form.update(FormMessage::Input(c));
        }
    }

    async fn submit(form: &mut StudentForm) -> Vec<FormMessage> {
        let mut messages = form.update(FormMessage::Submit).collect_messages().await;
        let result = messages.remove(0);
        form.update(result).collect_messages().await
    }

    #[test]
    fn test_focus_wraps() {
        assert_eq!(Field::Submit.next(), Field::Email);
        assert_eq!(Field::Email.previous(), Field::Submit);
        assert_eq!(Field::Email.next(), Field::Gender);
    }

    #[tokio::test]
    async fn test_create_sends_draft_then_resets() {
        let (ctx, service) = context(0);
        let mut form = StudentForm::new(ctx, FormMode::Create);
        type_into(&mut form, Field::FirstName, "A");
        type_into(&mut form, Field::LastName, "B");
        type_into(&mut form, Field::Country, "C");
        type_into(&mut form, Field::Avatar, "base64");
        type_into(&mut form, Field::BtcAddress, "addr");

        let messages = submit(&mut form).await;

        let expected = StudentDraft {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            country: "C".to_string(),
            avatar: "base64".to_string(),
            btc_address: "addr".to_string(),
            ..StudentDraft::default()
        };
        assert_eq!(service.requests(), vec![Request::Create(expected)]);
        assert_eq!(*form.draft(), StudentDraft::default());
        assert_eq!(form.draft().gender, Gender::Other);
        assert!(matches!(messages.as_slice(), [FormMessage::Notify(Notice::Added)]));
    }

    #[tokio::test]
    async fn test_validation_error_shows_email_until_edited() {
        let (ctx, service) = context(0);
        let mut form = StudentForm::new(ctx, FormMode::Create);
        type_into(&mut form, Field::Email, "x@");
        service.fail_next(ApiError::Validation(FieldErrors {
            email: Some("invalid".to_string()),
            ..FieldErrors::default()
        }));

        let messages = submit(&mut form).await;
        assert!(messages.is_empty(), "no toast on failure");
        assert_eq!(form.email_error(), Some("invalid"));
        assert_eq!(form.draft().email, "x@", "draft kept after failure");

        let screen = render(60, 24, |frame| form.view(frame, frame.area()));
        assert!(screen.contains("Error! invalid"));

        let _ = form.update(FormMessage::Input('y'));
        assert_eq!(form.email_error(), None);
        assert!(form.submission().is_idle());
    }

    #[tokio::test]
    async fn test_other_failures_are_not_shown() {
        let (ctx, service) = context(0);
        let mut form = StudentForm::new(ctx, FormMode::Create);
        service.fail_next(ApiError::Network("connection refused".to_string()));

        let messages = submit(&mut form).await;
        assert!(messages.is_empty());
        assert!(form.submission().is_error());
        assert_eq!(form.email_error(), None);
    }

    #[tokio::test]
    async fn test_edit_loads_record_into_draft() {
        let (ctx, service) = context(5);
        let mut form = StudentForm::new(ctx, FormMode::Edit(5));
        let mut stream = (form.subscriptions().remove(0).spawn)();

        let loading = timeout(Duration::from_secs(1), stream.next()).await.unwrap().unwrap();
        let _ = form.update(loading);
        let screen = render(60, 24, |frame| form.view(frame, frame.area()));
        assert!(screen.contains("loading..."));

        let loaded = timeout(Duration::from_secs(1), stream.next()).await.unwrap().unwrap();
        let _ = form.update(loaded);

        assert_eq!(*form.draft(), StudentDraft::from(&fixtures::student(5)));
        assert_eq!(service.requests(), vec![Request::Get(5)]);
    }

    #[tokio::test]
    async fn test_edit_submit_writes_response_into_cache() {
        let (ctx, service) = context(5);
        let client = Arc::clone(&ctx.client);
        let mut form = StudentForm::new(ctx, FormMode::Edit(5));
        let _ = form.update(FormMessage::Detail(QueryResult {
            key: QueryKey::Student { id: 5 },
            state: QueryState::Success {
                data: fixtures::student(5),
                is_stale: false,
            },
        }));
        type_into(&mut form, Field::Country, "land");

        let messages = submit(&mut form).await;

        let mut sent = fixtures::student(5);
        sent.country.push_str("land");
        assert_eq!(service.requests(), vec![Request::Update(5, sent.clone())]);
        assert!(matches!(messages.as_slice(), [FormMessage::Notify(Notice::Updated(5))]));
        assert_eq!(*form.draft(), StudentDraft::default());

        let cached = client.get::<Student>(&QueryKey::Student { id: 5 }).expect("cached");
        assert_eq!(cached.data, sent);
        assert!(client.is_fresh(&QueryKey::Student { id: 5 }, Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_double_submit_sends_twice() {
        let (ctx, service) = context(0);
        let mut form = StudentForm::new(ctx, FormMode::Create);
        type_into(&mut form, Field::Email, "a@b.c");

        let first = form.update(FormMessage::Submit);
        let second = form.update(FormMessage::Submit);
        let mut results = first.collect_messages().await;
        results.extend(second.collect_messages().await);

        assert_eq!(service.requests().len(), 2);
        assert!(results.iter().any(|m| matches!(m, FormMessage::Created(Err(_)))));
    }

    #[test]
    fn test_detail_for_other_record_ignored() {
        let (ctx, _) = context(0);
        let mut form = StudentForm::new(ctx, FormMode::Edit(5));
        let _ = form.update(FormMessage::Detail(QueryResult {
            key: QueryKey::Student { id: 6 },
            state: QueryState::Success {
                data: fixtures::student(6),
                is_stale: false,
            },
        }));
        assert_eq!(*form.draft(), StudentDraft::default());
    }

    #[test]
    fn test_gender_cycles_only_on_gender_field() {
        let (ctx, _) = context(0);
        let mut form = StudentForm::new(ctx, FormMode::Create);
        let _ = form.update(FormMessage::GenderNext);
        assert_eq!(form.draft().gender, Gender::Other);

        let _ = form.update(FormMessage::FocusNext);
        let _ = form.update(FormMessage::GenderNext);
        assert_eq!(form.draft().gender, Gender::Male);
        let _ = form.update(FormMessage::GenderPrevious);
        let _ = form.update(FormMessage::GenderPrevious);
        assert_eq!(form.draft().gender, Gender::Female);
    }

    #[test]
    fn test_key_bindings() {
        let (ctx, _) = context(0);
        let form = StudentForm::new(ctx, FormMode::Create);
        let key = |code, modifiers| KeyEvent::new(code, modifiers);

        assert!(matches!(
            form.on_key(key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(FormMessage::Submit)
        ));
        assert!(matches!(
            form.on_key(key(KeyCode::Char('s'), KeyModifiers::NONE)),
            Some(FormMessage::Input('s'))
        ));
        assert!(matches!(
            form.on_key(key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(FormMessage::FocusNext)
        ));
        assert!(matches!(
            form.on_key(key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(FormMessage::Back)
        ));
    }
}
