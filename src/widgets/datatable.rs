//! Read-only table view of the first rows of a DataFrame.

use std::borrow::Cow;

use polars::prelude::*;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Widget},
};

const CELL_PADDING: u16 = 2;
/// Cells longer than this are cut with an ellipsis
const MAX_CELL_WIDTH: usize = 30;

pub struct DataPreview<'a> {
    df: &'a DataFrame,
    title: String,
    header_fg: Color,
    border_color: Color,
    alternate_row_bg: Option<Color>,
}

impl<'a> DataPreview<'a> {
    pub fn new(df: &'a DataFrame, title: impl Into<String>) -> Self {
        Self {
            df,
            title: title.into(),
            header_fg: Color::Reset,
            border_color: Color::Reset,
            alternate_row_bg: None,
        }
    }

    pub fn with_colors(mut self, header_fg: Color, border_color: Color) -> Self {
        self.header_fg = header_fg;
        self.border_color = border_color;
        self
    }

    pub fn with_alternate_row_bg(mut self, bg: Option<Color>) -> Self {
        self.alternate_row_bg = bg;
        self
    }
}

/// Display text for a value. Nulls render empty.
pub fn cell_text(value: &AnyValue) -> Cow<'static, str> {
    if matches!(value, AnyValue::Null) {
        return Cow::Borrowed("");
    }
    let text = value.str_value().into_owned();
    if text.chars().count() > MAX_CELL_WIDTH {
        let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        Cow::Owned(format!("{}…", cut))
    } else {
        Cow::Owned(text)
    }
}

impl Widget for DataPreview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(self.title.as_str())
            .border_style(Style::default().fg(self.border_color));
        let inner = block.inner(area);
        block.render(area, buf);

        let (height, cols) = self.df.shape();
        if cols == 0 {
            Paragraph::new("No columns").centered().render(inner, buf);
            return;
        }
        let visible_rows = height.min(inner.height.saturating_sub(1) as usize);

        let mut widths: Vec<u16> = Vec::new();
        let mut rows: Vec<Vec<Cell>> = vec![vec![]; visible_rows];
        let mut used_width = 0u16;

        for column in self.df.get_columns() {
            let mut max_len = column.name().chars().count().min(MAX_CELL_WIDTH) as u16;
            let mut cells = Vec::with_capacity(visible_rows);
            for row_index in 0..visible_rows {
                let text = column
                    .get(row_index)
                    .map(|v| cell_text(&v))
                    .unwrap_or(Cow::Borrowed(""));
                max_len = max_len.max(text.chars().count() as u16);
                cells.push(text);
            }
            if used_width + max_len > inner.width {
                if widths.is_empty() {
                    widths.push(inner.width);
                    for (row, text) in rows.iter_mut().zip(cells) {
                        row.push(Cell::from(Line::from(text)));
                    }
                }
                break;
            }
            used_width += max_len + CELL_PADDING;
            widths.push(max_len);
            for (row, text) in rows.iter_mut().zip(cells) {
                row.push(Cell::from(Line::from(text)));
            }
        }

        let rows: Vec<Row> = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let style = match self.alternate_row_bg {
                    Some(bg) if i % 2 == 1 => Style::default().bg(bg),
                    _ => Style::default(),
                };
                Row::new(row).style(style)
            })
            .collect();
        let headers: Vec<Span> = self
            .df
            .get_column_names()
            .iter()
            .take(widths.len())
            .map(|name| Span::raw(name.to_string()))
            .collect();

        Table::new(rows, widths)
            .column_spacing(CELL_PADDING)
            .header(Row::new(headers).style(Style::default().fg(self.header_fg).bold()))
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    #[test]
    fn test_null_renders_empty() {
        assert_eq!(cell_text(&AnyValue::Null), "");
        assert_eq!(cell_text(&AnyValue::Int64(5)), "5");
    }

    #[test]
    fn test_long_text_is_cut() {
        let long = "x".repeat(50);
        let text = cell_text(&AnyValue::String(&long));
        assert_eq!(text.chars().count(), MAX_CELL_WIDTH);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_render_header_and_rows() {
        let df = df!("name" => ["ann", "bob"], "age" => [30i64, 41]).unwrap();
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        DataPreview::new(&df, "Preview").render(area, &mut buf);
        assert!(line(&buf, 1, 30).contains("name"));
        assert!(line(&buf, 1, 30).contains("age"));
        assert!(line(&buf, 2, 30).contains("ann"));
        assert!(line(&buf, 3, 30).contains("41"));
    }
}
