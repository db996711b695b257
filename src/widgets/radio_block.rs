//! Bordered block of radio options: ● selected, ○ unselected.
//! Used by every selector in the upload, transform and export forms.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

/// Next index after `selected` in a list of `len` options, wrapping around.
pub fn cycle(selected: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (selected + 1) % len
    } else {
        (selected + len - 1) % len
    }
}

/// Options are laid out in a grid with `columns` per row.
pub struct RadioBlock<'a> {
    title: &'a str,
    options: &'a [&'a str],
    selected: usize,
    focused: bool,
    columns: usize,
    border_color: Color,
    active_color: Color,
}

impl<'a> RadioBlock<'a> {
    pub fn new(
        title: &'a str,
        options: &'a [&'a str],
        selected: usize,
        focused: bool,
        columns: usize,
        border_color: Color,
        active_color: Color,
    ) -> Self {
        Self {
            title,
            options,
            selected,
            focused,
            columns: columns.max(1),
            border_color,
            active_color,
        }
    }

    /// Rows needed to show every option, borders included.
    pub fn height(options: usize, columns: usize) -> u16 {
        let columns = columns.max(1);
        options.div_ceil(columns) as u16 + 2
    }

    fn render_options(&self, area: Rect, buf: &mut Buffer) {
        if self.options.is_empty() || area.width == 0 {
            return;
        }
        let cols = self.columns.min(self.options.len());
        let rows = self.options.len().div_ceil(cols);
        let row_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(1); rows])
            .split(area);
        let col_constraints = vec![Constraint::Ratio(1, cols as u32); cols];

        for (idx, label) in self.options.iter().enumerate() {
            let Some(row_rect) = row_chunks.get(idx / cols) else {
                break;
            };
            let cell = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(col_constraints.clone())
                .split(*row_rect)[idx % cols];

            let is_selected = idx == self.selected;
            let marker = if is_selected { "●" } else { "○" };
            let mut style = Style::default().fg(if is_selected {
                self.active_color
            } else {
                self.border_color
            });
            if self.focused && is_selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Paragraph::new(Line::from(Span::styled(format!("{} {}", marker, label), style)))
                .render(cell, buf);
        }
    }
}

impl Widget for RadioBlock<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.active_color
        } else {
            self.border_color
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(self.title)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);
        self.render_options(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(cycle(2, 3, true), 0);
        assert_eq!(cycle(0, 3, false), 2);
        assert_eq!(cycle(0, 0, true), 0);
    }

    #[test]
    fn test_height() {
        assert_eq!(RadioBlock::height(6, 3), 4);
        assert_eq!(RadioBlock::height(4, 4), 3);
    }

    #[test]
    fn test_render_marks_selection() {
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        let options = ["CSV", "Excel"];
        RadioBlock::new("Format", &options, 1, false, 2, Color::Gray, Color::Cyan)
            .render(area, &mut buf);
        let line: String = (0..30).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(line.contains("○ CSV"));
        assert!(line.contains("● Excel"));
    }
}
