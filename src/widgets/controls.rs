use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

/// Bottom bar of key hints, with an optional row count on the right.
pub struct Controls<'a> {
    pairs: &'a [(&'a str, &'a str)],
    row_count: Option<usize>,
    dimmed: bool,
    bg: Color,
    key_color: Color,
    label_color: Color,
}

impl<'a> Controls<'a> {
    pub fn new(pairs: &'a [(&'a str, &'a str)]) -> Self {
        Self {
            pairs,
            row_count: None,
            dimmed: false,
            bg: Color::DarkGray,
            key_color: Color::Reset,
            label_color: Color::White,
        }
    }

    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_colors(mut self, bg: Color, key_color: Color, label_color: Color) -> Self {
        self.bg = bg;
        self.key_color = key_color;
        self.label_color = label_color;
        self
    }
}

impl Widget for Controls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints: Vec<Constraint> = self
            .pairs
            .iter()
            .flat_map(|(key, action)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 2),
                    Constraint::Length(action.chars().count() as u16 + 1),
                ]
            })
            .collect();
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(15)); // "Rows: 12345"
        }
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let base = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let key_style = if self.dimmed {
            base.bold()
        } else {
            base.fg(self.key_color).bold()
        };
        let label_style = if self.dimmed {
            base.bg(self.bg)
        } else {
            base.bg(self.bg).fg(self.label_color)
        };

        for (i, (key, action)) in self.pairs.iter().enumerate() {
            Paragraph::new(*key)
                .style(key_style)
                .centered()
                .render(layout[i * 2], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[i * 2 + 1], buf);
        }

        let mut fill_idx = self.pairs.len() * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", count))
                .style(label_style)
                .right_aligned()
                .render(layout[fill_idx], buf);
            fill_idx += 1;
        }
        Paragraph::new("")
            .style(base.bg(self.bg))
            .render(layout[fill_idx], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_pairs_and_rows() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        Controls::new(&[("q", "Quit"), ("?", "Help")])
            .with_row_count(Some(42))
            .render(area, &mut buf);
        let line: String = (0..60).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(line.contains("Quit"));
        assert!(line.contains("Help"));
        assert!(line.contains("Rows: 42"));
    }
}
