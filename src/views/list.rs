//! The paginated students table.

use std::cell::Cell;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use futures::FutureExt;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use tokio_util::sync::CancellationToken;

use super::Context;
use super::skeleton::Skeleton;
use crate::api::ApiError;
use crate::model::{Page, Student, StudentId};
use crate::notify::Notice;
use crate::pagination::{Pagination, total_pages};
use crate::query::{Query, QueryError, QueryKey, QueryResult, QueryState};
use crate::route::Route;
use crate::subscription::Subscription;
use crate::command::Command;

#[derive(Debug, Clone)]
pub enum ListMessage {
    Page(QueryResult<Page<Student>>),
    /// Hover the row at this index on the current page.
    Select(usize),
    GoTo(u32),
    Refresh,
    Delete(StudentId),
    Deleted {
        id: StudentId,
        /// Page the record was listed on when the delete was issued.
        page: u32,
        result: Result<(), ApiError>,
    },
    /// Handled by the shell.
    Open(Route),
    /// Handled by the shell.
    Notify(Notice),
}

pub struct StudentList {
    context: Context,
    page: u32,
    state: QueryState<Page<Student>>,
    selected: Option<usize>,
    /// Where the table was last drawn, for mouse hit-testing.
    table_area: Cell<Rect>,
}

impl StudentList {
    pub fn new(context: Context, page: u32) -> Self {
        Self {
            context,
            page: page.max(1),
            state: QueryState::Loading,
            selected: None,
            table_area: Cell::new(Rect::default()),
        }
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn state(&self) -> &QueryState<Page<Student>> {
        &self.state
    }

    pub fn rows(&self) -> &[Student] {
        self.state.data().map_or(&[], |page| page.items.as_slice())
    }

    pub fn selected(&self) -> Option<&Student> {
        self.selected.and_then(|i| self.rows().get(i))
    }

    pub fn pagination(&self) -> Pagination {
        let total = self.state.data().and_then(|page| page.total_count);
        Pagination::new(self.page, total_pages(total, self.context.page_size))
    }

    fn key(&self) -> QueryKey {
        QueryKey::Students { page: self.page }
    }

    pub fn update(&mut self, msg: ListMessage) -> Command<ListMessage> {
        match msg {
            ListMessage::Page(result) => {
                if result.key != self.key() {
                    tracing::trace!(key = %result.key, "dropping result for a page no longer shown");
                    return Command::none();
                }
                self.state = result.state.keep_previous(&self.state);
                let len = self.rows().len();
                self.selected = self.selected.filter(|i| *i < len);
                Command::none()
            }
            ListMessage::Select(index) => {
                let Some(id) = self.rows().get(index).map(|s| s.id) else {
                    return Command::none();
                };
                self.selected = Some(index);
                self.context.client.prefetch(
                    QueryKey::Student { id },
                    self.context.detail_stale_time,
                    self.context.student_fetcher(id),
                )
            }
            ListMessage::GoTo(page) => {
                self.go_to(page);
                Command::none()
            }
            ListMessage::Refresh => self.context.client.invalidate(self.key()),
            ListMessage::Delete(id) => {
                let page = self.page;
                tracing::debug!(id, page, "deleting student");
                Command::perform(self.context.service.delete(id), move |result| {
                    ListMessage::Deleted { id, page, result }
                })
            }
            ListMessage::Deleted { id, page, result } => match result {
                Ok(()) => Command::batch([
                    self.context.client.invalidate(QueryKey::Students { page }),
                    Command::message(ListMessage::Notify(Notice::Deleted(id))),
                ]),
                Err(e) => {
                    tracing::warn!(id, error = %e, "delete failed");
                    Command::none()
                }
            },
            ListMessage::Open(_) | ListMessage::Notify(_) => Command::none(),
        }
    }

    /// Switches to `page`; the rows on screen stay until the new page arrives.
    pub fn go_to(&mut self, page: u32) {
        let page = page.max(1);
        if page != self.page {
            self.page = page;
            self.selected = None;
        }
    }

    pub fn on_key(&self, key: KeyEvent) -> Option<ListMessage> {
        let rows = self.rows().len();
        let pagination = self.pagination();

        match key.code {
            KeyCode::Down | KeyCode::Char('j') if rows > 0 => {
                let next = self.selected.map_or(0, |i| (i + 1).min(rows - 1));
                Some(ListMessage::Select(next))
            }
            KeyCode::Up | KeyCode::Char('k') if rows > 0 => {
                let previous = self.selected.map_or(0, |i| i.saturating_sub(1));
                Some(ListMessage::Select(previous))
            }
            KeyCode::Left => pagination.previous().map(ListMessage::GoTo),
            KeyCode::Right => pagination.next().map(ListMessage::GoTo),
            KeyCode::Char(c @ '1'..='9') => {
                let page = c.to_digit(10)?;
                (page <= pagination.total).then_some(ListMessage::GoTo(page))
            }
            KeyCode::Char('a') => Some(ListMessage::Open(Route::AddStudent)),
            KeyCode::Char('e') | KeyCode::Enter => self
                .selected()
                .map(|s| ListMessage::Open(Route::EditStudent { id: s.id })),
            KeyCode::Char('d') => self.selected().map(|s| ListMessage::Delete(s.id)),
            KeyCode::Char('r') => Some(ListMessage::Refresh),
            _ => None,
        }
    }

    pub fn on_mouse(&self, mouse: MouseEvent) -> Option<ListMessage> {
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Down(MouseButton::Left) => {
                self.row_at(mouse.column, mouse.row).map(ListMessage::Select)
            }
            _ => None,
        }
    }

    /// Row index under a screen position, if any.
    fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.table_area.get();
        // Border and header line come before the first row.
        let first = area.y + 2;
        let inside = column > area.x && column < area.right().saturating_sub(1);
        if !inside || row < first || row >= area.bottom().saturating_sub(1) {
            return None;
        }
        let index = (row - first) as usize;
        (index < self.rows().len()).then_some(index)
    }

    pub fn subscriptions(&self) -> Vec<Subscription<ListMessage>> {
        vec![Subscription::new(self.page_query()).map(ListMessage::Page)]
    }

    /// The query for the current page. Each request is cancelled once the
    /// list timeout passes.
    fn page_query(&self) -> Query<Page<Student>> {
        let service = Arc::clone(&self.context.service);
        let page = self.page;
        let limit = self.context.page_size;
        let timeout = self.context.list_timeout;

        Query::new(
            self.key(),
            move || {
                let cancel = CancellationToken::new();
                let request = service.list(page, limit, cancel.clone());
                async move {
                    let timer = tokio::spawn(async move {
                        tokio::time::sleep(timeout).await;
                        tracing::debug!(page, "list request timed out");
                        cancel.cancel();
                    });
                    let result = request.await;
                    timer.abort();
                    result.map_err(QueryError::from)
                }
                .boxed()
            },
            Arc::clone(&self.context.client),
        )
    }

    pub fn view(&self, frame: &mut Frame<'_>, area: Rect) {
        let [title, body, pages, help] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let mut heading = vec![Span::from("Students").bold()];
        if self.state.is_placeholder() || matches!(self.state, QueryState::Success { is_stale: true, .. }) {
            heading.push(Span::from("  refreshing").dim());
        }
        frame.render_widget(Line::from(heading), title);

        self.table_area.set(body);
        if self.state.is_pending() {
            frame.render_widget(Skeleton::new(), body);
        } else {
            frame.render_widget(self.table(), body);
        }

        frame.render_widget(self.pagination_bar(), pages);
        frame.render_widget(
            Paragraph::new("↑/↓ select  ←/→ page  a add  e edit  d delete  r refresh  q quit").dim(),
            help,
        );
    }

    fn table(&self) -> Table<'_> {
        let header = Row::new(["#", "Avatar", "Name", "Email", "Action"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.rows().iter().enumerate().map(|(i, student)| {
            let avatar = if student.avatar.is_empty() { "·" } else { "▣" };
            let row = Row::new([
                student.id.to_string(),
                avatar.to_string(),
                student.last_name.clone(),
                student.email.clone(),
                "Edit  Delete".to_string(),
            ]);
            if self.selected == Some(i) {
                row.style(Style::default().bg(Color::Blue).fg(Color::White))
            } else {
                row
            }
        });

        Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Percentage(25),
                Constraint::Fill(1),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL))
    }

    fn pagination_bar(&self) -> Line<'static> {
        let pagination = self.pagination();
        let control = |label: &'static str, disabled: bool| {
            if disabled {
                Span::from(label).fg(Color::DarkGray)
            } else {
                Span::from(label).fg(Color::Cyan)
            }
        };

        let mut spans = vec![control("Previous", pagination.previous_disabled()), Span::from(" ")];
        for page in pagination.pages() {
            let label = format!(" {page} ");
            spans.push(if pagination.is_current(page) {
                Span::from(label).reversed()
            } else {
                Span::from(label)
            });
        }
        spans.push(Span::from(" "));
        spans.push(control("Next", pagination.next_disabled()));
        Line::from(spans)
    }
}
