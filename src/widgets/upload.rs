//! Upload screen rendering.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::datatable::DataPreview;
use super::radio_block::RadioBlock;
use super::{input_block, render_button};
use crate::config::Theme;
use crate::source::{Separator, TextEncoding, PREVIEW_ROWS};
use crate::upload_form::{UploadFocus, UploadForm};

pub fn render_upload(area: Rect, buf: &mut Buffer, form: &UploadForm, theme: &Theme) {
    let border = theme.get("modal_border");
    let active = theme.get("modal_border_active");
    let csv = form.is_csv();

    let mut constraints = vec![
        Constraint::Length(3), // path
        Constraint::Length(1), // detected encoding
    ];
    if csv {
        constraints.push(Constraint::Length(RadioBlock::height(TextEncoding::ALL.len(), 3)));
        constraints.push(Constraint::Length(RadioBlock::height(Separator::ALL.len(), 4)));
    }
    constraints.push(Constraint::Length(1)); // buttons
    constraints.push(Constraint::Fill(1)); // preview
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let path_block = input_block(
        " File (.csv or .xlsx) ",
        form.focus == UploadFocus::Path,
        border,
        active,
    );
    let path_inner = path_block.inner(layout[0]);
    path_block.render(layout[0], buf);
    (&form.path_input).render(path_inner, buf);

    let hint = match form.detected {
        Some(enc) if csv => Line::from(vec![
            Span::styled(" Detected encoding: ", Style::default().fg(theme.get("text_secondary"))),
            Span::styled(enc.label(), Style::default().fg(theme.get("success"))),
        ]),
        Some(_) => Line::from(Span::styled(
            " Spreadsheet: no encoding or separator needed",
            Style::default().fg(theme.get("text_secondary")),
        )),
        None => Line::from(Span::styled(
            " Enter a path and press Enter",
            Style::default().fg(theme.get("dimmed")),
        )),
    };
    Paragraph::new(hint).render(layout[1], buf);

    let mut next = 2;
    if csv {
        let encodings: Vec<&str> = TextEncoding::ALL.iter().map(|e| e.label()).collect();
        RadioBlock::new(
            " Encoding ",
            &encodings,
            form.encoding.index(),
            form.focus == UploadFocus::Encoding,
            3,
            border,
            active,
        )
        .render(layout[next], buf);
        let separators: Vec<&str> = Separator::ALL.iter().map(|s| s.label()).collect();
        RadioBlock::new(
            " Separator ",
            &separators,
            form.separator.index(),
            form.focus == UploadFocus::Separator,
            4,
            border,
            active,
        )
        .render(layout[next + 1], buf);
        next += 2;
    }

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Length(12), Constraint::Fill(1)])
        .split(layout[next]);
    render_button("Preview", form.focus == UploadFocus::Preview, active, buttons[0], buf);
    render_button("Load", form.focus == UploadFocus::Load, active, buttons[1], buf);

    if let Some(df) = &form.preview {
        DataPreview::new(df, format!(" Preview (first {} rows) ", PREVIEW_ROWS))
            .with_colors(theme.get("table_header"), border)
            .render(layout[next + 1], buf);
    }
}
