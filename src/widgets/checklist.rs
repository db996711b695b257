//! Scrollable list of checkbox items with a cursor.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, StatefulWidget, Widget},
};

/// Cursor position and scroll offset. The items themselves live elsewhere.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistState {
    pub cursor: usize,
    offset: usize,
}

impl ChecklistState {
    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
        }
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Keep the cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn scroll_into_view(&mut self, visible: usize) {
        if visible == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
    }
}

pub struct Checklist<'a> {
    title: &'a str,
    items: Vec<(&'a str, bool)>,
    focused: bool,
    border_color: Color,
    active_color: Color,
    text_color: Color,
}

impl<'a> Checklist<'a> {
    pub fn new(title: &'a str, items: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self {
            title,
            items: items.into_iter().collect(),
            focused: false,
            border_color: Color::Reset,
            active_color: Color::Reset,
            text_color: Color::Reset,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn colors(mut self, border: Color, active: Color, text: Color) -> Self {
        self.border_color = border;
        self.active_color = active;
        self.text_color = text;
        self
    }
}

impl StatefulWidget for Checklist<'_> {
    type State = ChecklistState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border = if self.focused {
            self.active_color
        } else {
            self.border_color
        };
        let checked = self.items.iter().filter(|(_, c)| *c).count();
        let title = format!("{} ({}/{})", self.title, checked, self.items.len());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(title)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        state.clamp(self.items.len());
        state.scroll_into_view(inner.height as usize);

        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .skip(state.offset)
            .take(inner.height as usize)
            .map(|(idx, (label, on))| {
                let marker = if *on { "☑" } else { "☐" };
                let mut style = Style::default().fg(self.text_color);
                if idx == state.cursor && self.focused {
                    style = style.fg(self.active_color).add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(format!("{} {}", marker, label), style))
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_bounds() {
        let mut state = ChecklistState::default();
        state.previous();
        assert_eq!(state.cursor, 0);
        state.next(2);
        state.next(2);
        assert_eq!(state.cursor, 1);
        state.clamp(1);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn test_scrolls_to_cursor() {
        let items: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);
        let mut state = ChecklistState {
            cursor: 7,
            offset: 0,
        };
        Checklist::new("Columns", items.iter().map(|s| (s.as_str(), true)))
            .focused(true)
            .render(area, &mut buf, &mut state);
        assert_eq!(state.offset, 5);
        let last: String = (0..20).map(|x| buf[(x, 3)].symbol().to_string()).collect();
        assert!(last.contains("c7"));
    }
}
