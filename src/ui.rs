pub mod status_bar;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::controller::{Notice, NoticeLevel};
use crate::document::{Document, TextBuffer};
use status_bar::StatusBar;

const HORIZONTAL_MARGIN: u16 = 2;
const HELP_TEXT: &str = "Esc stop · Ctrl+N new session · Ctrl+S save · Ctrl+Q quit";

/// The whole editor screen: text, session status and a message line
pub struct EditorView<'a> {
    pub buffer: &'a TextBuffer,
    /// Characters before this offset existed before the running session
    pub session_start: Option<usize>,
    pub status: Option<&'a StatusBar>,
    pub notice: Option<&'a Notice>,
}

impl EditorView<'_> {
    fn text_lines(&self) -> (Vec<Line<'static>>, usize) {
        let plain = Style::default();
        let dim = Style::default().add_modifier(Modifier::DIM);
        let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
        let cursor = self.buffer.cursor();

        let mut lines = Vec::new();
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut cursor_line = 0;

        for (idx, c) in self.buffer.text().chars().enumerate() {
            let pre_session = self.session_start.is_some_and(|start| idx < start);
            let style = if idx == cursor {
                cursor_line = lines.len();
                cursor_style
            } else if pre_session {
                dim
            } else {
                plain
            };

            if c == '\n' {
                if idx == cursor {
                    spans.push(Span::styled(" ", cursor_style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                continue;
            }
            spans.push(Span::styled(c.to_string(), style));
        }

        if cursor >= self.buffer.char_len() {
            cursor_line = lines.len();
            spans.push(Span::styled(" ", cursor_style));
        }
        lines.push(Line::from(spans));

        (lines, cursor_line)
    }

    fn status_line(&self, width: u16) -> Line<'static> {
        if let Some(bar) = self.status.filter(|b| !b.is_disposed()) {
            if let Some(text) = bar.text() {
                let style = if bar.is_warning() {
                    let bg = if bar.flash_on() {
                        Color::Red
                    } else {
                        Color::Yellow
                    };
                    Style::default()
                        .fg(Color::Black)
                        .bg(bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                let hint = bar.tooltip();
                let pad = (width as usize).saturating_sub(text.width() + hint.width());
                return Line::from(vec![
                    Span::styled(text, style),
                    Span::raw(" ".repeat(pad)),
                    Span::styled(hint, Style::default().add_modifier(Modifier::DIM)),
                ]);
            }
        }

        Line::from(Span::styled(
            "No session running",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        ))
    }

    /// The last notice, or key help when there is nothing to say
    fn message_line(&self) -> Line<'static> {
        match self.notice {
            Some(notice) => {
                let color = match notice.level {
                    NoticeLevel::Info => Color::Green,
                    NoticeLevel::Error => Color::Red,
                };
                Line::from(Span::styled(
                    notice.message.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            }
            None => Line::from(Span::styled(
                HELP_TEXT,
                Style::default().add_modifier(Modifier::DIM),
            )),
        }
    }
}

impl Widget for EditorView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let (lines, cursor_line) = self.text_lines();
        let height = chunks[0].height as usize;
        let scroll = cursor_line.saturating_sub(height.saturating_sub(1));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0))
            .render(chunks[0], buf);

        Paragraph::new(self.status_line(chunks[1].width)).render(chunks[1], buf);

        Paragraph::new(self.message_line()).render(chunks[2], buf);
    }
}
