//! Placeholders drawn while data is on its way.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

const BAR: char = '░';

/// Pulsing bars in place of the students table.
#[derive(Debug, Clone, Copy)]
pub struct Skeleton {
    rows: u16,
}

impl Skeleton {
    /// Bars drawn below the header bar.
    pub const ROWS: u16 = 12;

    pub const fn new() -> Self {
        Self { rows: Self::ROWS }
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for Skeleton {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header = Style::default().fg(Color::Gray);
        let row = Style::default().fg(Color::DarkGray);

        // A wide header bar, then rows separated by a blank line.
        let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
        for _ in 0..self.rows {
            constraints.push(Constraint::Length(1));
            constraints.push(Constraint::Length(1));
        }
        let areas = Layout::vertical(constraints).split(area);

        let bar = |width: u16| BAR.to_string().repeat(width as usize);
        Paragraph::new(bar(area.width.saturating_mul(2) / 3))
            .style(header)
            .render(areas[0], buf);

        for slot in areas.iter().skip(2).step_by(2) {
            Paragraph::new(bar(slot.width)).style(row).render(*slot, buf);
        }
    }
}

/// A small centered `loading...` badge.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadingBadge;

impl LoadingBadge {
    const TEXT: &'static str = "loading...";
}

impl Widget for LoadingBadge {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = Self::TEXT.len() as u16 + 4;
        let [column] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let [badge] = Layout::vertical([Constraint::Length(3)])
            .flex(Flex::Center)
            .areas(column);

        ratatui::widgets::Clear.render(badge, buf);
        Paragraph::new(Self::TEXT)
            .style(Style::default().fg(Color::Blue))
            .block(Block::default().borders(Borders::ALL))
            .render(badge, buf);
    }
}
