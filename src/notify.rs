//! Toast notifications.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::StudentId;

/// A toast waiting to expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub shown_at: Instant,
}

/// Success messages raised by the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Deleted(StudentId),
    Added,
    Updated(StudentId),
}

impl Notice {
    pub fn text(self) -> String {
        match self {
            Self::Deleted(id) => format!("Deleted student id: {id}"),
            Self::Added => "Added a new student".to_string(),
            Self::Updated(id) => format!("Updated student id:{id}"),
        }
    }
}

/// Toasts currently on screen, oldest first.
#[derive(Debug, Clone)]
pub struct Toasts {
    items: VecDeque<Toast>,
    ttl: Duration,
}

impl Toasts {
    const MAX: usize = 5;

    pub const fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, notice: Notice) {
        let text = notice.text();
        tracing::info!(%text, "toast");
        self.items.push_back(Toast {
            text,
            shown_at: Instant::now(),
        });
        while self.items.len() > Self::MAX {
            self.items.pop_front();
        }
    }

    /// Drops toasts older than the TTL as of `now`.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < ttl);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    /// Stacks the toasts in the top-right corner of `area`.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let width = self
            .items
            .iter()
            .map(|toast| toast.text.chars().count() as u16 + 4)
            .max()
            .unwrap_or(0)
            .min(area.width);

        let [column] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::End)
            .areas(area);

        let rows = Layout::vertical(self.items.iter().map(|_| Constraint::Length(3)))
            .split(column);

        for (toast, row) in self.items.iter().zip(rows.iter()) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green));
            frame.render_widget(Clear, *row);
            frame.render_widget(
                Paragraph::new(toast.text.as_str())
                    .style(Style::default().fg(Color::Green))
                    .block(block),
                *row,
            );
        }
    }
}
