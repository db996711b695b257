//! Basic-info panel: dimensions, memory estimate and per-column schema.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Row, Table, Widget},
};

use crate::statistics::BasicInfo;

/// "12.35 MB"
pub fn format_megabytes(mb: f64) -> String {
    format!("{:.2} MB", mb)
}

pub struct InfoPanel<'a> {
    info: &'a BasicInfo,
    title: &'a str,
    header_fg: Color,
    border_color: Color,
    warning_fg: Color,
}

impl<'a> InfoPanel<'a> {
    pub fn new(info: &'a BasicInfo, title: &'a str) -> Self {
        Self {
            info,
            title,
            header_fg: Color::Reset,
            border_color: Color::Reset,
            warning_fg: Color::Yellow,
        }
    }

    pub fn with_colors(mut self, header_fg: Color, border_color: Color, warning_fg: Color) -> Self {
        self.header_fg = header_fg;
        self.border_color = border_color;
        self.warning_fg = warning_fg;
        self
    }
}

impl Widget for InfoPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(self.title)
            .border_style(Style::default().fg(self.border_color));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Fill(1)])
            .split(inner);

        let summary = vec![
            Line::from(vec![
                Span::styled("Dimensions: ", Style::default().fg(self.header_fg)),
                Span::raw(format!(
                    "{} rows x {} columns",
                    self.info.rows, self.info.columns
                )),
            ]),
            Line::from(vec![
                Span::styled("Memory: ", Style::default().fg(self.header_fg)),
                Span::raw(format_megabytes(self.info.memory_mb())),
            ]),
        ];
        Paragraph::new(summary).render(layout[0], buf);

        let rows: Vec<Row> = self
            .info
            .column_names
            .iter()
            .zip(&self.info.dtypes)
            .zip(&self.info.missing)
            .map(|((name, dtype), missing)| {
                let missing_style = if *missing > 0 {
                    Style::default().fg(self.warning_fg)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Span::raw(name.clone()),
                    Span::raw(dtype.clone()),
                    Span::styled(missing.to_string(), missing_style),
                ])
            })
            .collect();
        let header = Row::new(vec!["Column", "Type", "Missing"])
            .style(Style::default().fg(self.header_fg).bold());
        Table::new(
            rows,
            [
                Constraint::Fill(2),
                Constraint::Fill(1),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .render(layout[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(1.0 / 3.0), "0.33 MB");
    }

    #[test]
    fn test_render_lists_columns() {
        let info = BasicInfo {
            rows: 3,
            columns: 2,
            column_names: vec!["A".into(), "B".into()],
            dtypes: vec!["i64".into(), "i64".into()],
            missing: vec![0, 1],
            estimated_size_bytes: 48,
        };
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);
        InfoPanel::new(&info, "Overview").render(area, &mut buf);
        let text: String = (0..8)
            .map(|y| (0..40).map(|x| buf[(x, y)].symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("3 rows x 2 columns"));
        assert!(text.contains("Missing"));
    }
}
