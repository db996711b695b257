//! Transform screen rendering: treatment form on the left, result and export
//! form on the right.

use polars::prelude::DataFrame;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, StatefulWidget, Widget},
};

use super::checklist::Checklist;
use super::datatable::DataPreview;
use super::info::format_megabytes;
use super::radio_block::RadioBlock;
use super::{input_block, render_button};
use crate::config::Theme;
use crate::export::ExportFormat;
use crate::export_form::{ExportFocus, ExportForm};
use crate::source::{Separator, TextEncoding, PREVIEW_ROWS};
use crate::statistics::BasicInfo;
use crate::transform::Treatment;
use crate::transform_form::{
    TransformFocus, TransformForm, FILL_METHODS, SAMPLE_SIZE_KINDS, SAMPLING_METHODS,
};

const FORM_WIDTH: u16 = 56;

pub fn render_transform(
    area: Rect,
    buf: &mut Buffer,
    form: &mut TransformForm,
    df: &DataFrame,
    info: &BasicInfo,
    theme: &Theme,
) {
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(FORM_WIDTH), Constraint::Fill(1)])
        .split(area);
    render_treatment_form(main[0], buf, form, theme);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(PREVIEW_ROWS as u16 + 3),
            Constraint::Fill(1),
        ])
        .split(main[1]);

    let summary = match form.applied {
        Some(t) => format!(
            " {} applied: {} rows x {} columns, {}",
            t.label(),
            info.rows,
            info.columns,
            format_megabytes(info.memory_mb())
        ),
        None => format!(
            " Current data: {} rows x {} columns, {}",
            info.rows,
            info.columns,
            format_megabytes(info.memory_mb())
        ),
    };
    Paragraph::new(summary)
        .style(Style::default().fg(theme.get("text_secondary")))
        .render(right[0], buf);

    let head = df.head(Some(PREVIEW_ROWS));
    DataPreview::new(&head, " First rows ")
        .with_colors(theme.get("table_header"), theme.get("modal_border"))
        .render(right[1], buf);

    if let Some(export) = &form.export {
        render_export_form(right[2], buf, export, form.focus == TransformFocus::Export, theme);
    }
}

fn render_treatment_form(area: Rect, buf: &mut Buffer, form: &mut TransformForm, theme: &Theme) {
    let border = theme.get("modal_border");
    let active = theme.get("modal_border_active");
    let focus = form.focus;

    let mut constraints = vec![Constraint::Length(3)];
    match form.treatment {
        Treatment::Sampling => {
            constraints.push(Constraint::Length(RadioBlock::height(SAMPLING_METHODS.len(), 2)));
            if !form.is_first_or_last() {
                constraints.push(Constraint::Length(3));
            }
            constraints.push(Constraint::Length(3));
            if form.is_stratified() {
                constraints.push(Constraint::Length(3));
            }
        }
        Treatment::Renaming => constraints.push(Constraint::Fill(1)),
        Treatment::Filling => {
            constraints.push(Constraint::Fill(1));
            constraints.push(Constraint::Length(RadioBlock::height(FILL_METHODS.len(), 3)));
            if form.is_custom_fill() {
                constraints.push(Constraint::Length(3));
            }
        }
    }
    constraints.push(Constraint::Length(1));
    if form.treatment != Treatment::Renaming {
        constraints.push(Constraint::Fill(1));
    }
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let treatments: Vec<&str> = Treatment::ALL.iter().map(|t| t.label()).collect();
    let selected = Treatment::ALL
        .iter()
        .position(|t| *t == form.treatment)
        .unwrap_or(0);
    RadioBlock::new(
        " Treatment ",
        &treatments,
        selected,
        focus == TransformFocus::Treatment,
        3,
        border,
        active,
    )
    .render(layout[0], buf);

    let mut row = 1;
    match form.treatment {
        Treatment::Sampling => {
            RadioBlock::new(
                " Method ",
                &SAMPLING_METHODS,
                form.method,
                focus == TransformFocus::Method,
                2,
                border,
                active,
            )
            .render(layout[row], buf);
            row += 1;
            if !form.is_first_or_last() {
                RadioBlock::new(
                    " Sample size ",
                    &SAMPLE_SIZE_KINDS,
                    usize::from(form.by_percentage),
                    focus == TransformFocus::SizeKind,
                    2,
                    border,
                    active,
                )
                .render(layout[row], buf);
                row += 1;
            }
            let percentage = form.by_percentage && !form.is_first_or_last();
            let (title, input) = if percentage {
                (" Percentage (0-100) ", &form.percentage_input)
            } else {
                (" Number of rows ", &form.rows_input)
            };
            let block = input_block(title, focus == TransformFocus::Size, border, active);
            let inner = block.inner(layout[row]);
            block.render(layout[row], buf);
            input.render(inner, buf);
            row += 1;
            if form.is_stratified() {
                let column = form
                    .columns()
                    .get(form.strata_column)
                    .cloned()
                    .unwrap_or_default();
                let block = input_block(
                    " Stratify by (←→) ",
                    focus == TransformFocus::StrataColumn,
                    border,
                    active,
                );
                Paragraph::new(format!("◀ {} ▶", column))
                    .block(block)
                    .render(layout[row], buf);
                row += 1;
            }
        }
        Treatment::Renaming => {
            let block = input_block(
                " New names (blank keeps the name) ",
                focus == TransformFocus::RenameList,
                border,
                active,
            );
            let inner = block.inner(layout[row]);
            block.render(layout[row], buf);
            let visible = inner.height as usize;
            let start = (form.rename_cursor + 1).saturating_sub(visible);
            let rows = form.renames.iter().enumerate().skip(start).take(visible);
            for (offset, (name, input)) in rows {
                let y = inner.y + (offset - start) as u16;
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(45),
                        Constraint::Length(3),
                        Constraint::Fill(1),
                    ])
                    .split(Rect::new(inner.x, y, inner.width, 1));
                let mut style = Style::default().fg(theme.get("text_primary"));
                if offset == form.rename_cursor && focus == TransformFocus::RenameList {
                    style = style.add_modifier(Modifier::BOLD).fg(active);
                }
                Paragraph::new(Line::from(Span::styled(name.as_str(), style))).render(cols[0], buf);
                Paragraph::new("→").render(cols[1], buf);
                input.render(cols[2], buf);
            }
            row += 1;
        }
        Treatment::Filling => {
            Checklist::new(
                "Columns to fill",
                form.fill_columns.iter().map(|(c, on)| (c.as_str(), *on)),
            )
            .focused(focus == TransformFocus::FillColumns)
            .colors(border, active, theme.get("text_primary"))
            .render(layout[row], buf, &mut form.fill_cursor);
            row += 1;
            RadioBlock::new(
                " Fill with ",
                &FILL_METHODS,
                form.fill_method,
                focus == TransformFocus::FillMethod,
                3,
                border,
                active,
            )
            .render(layout[row], buf);
            row += 1;
            if form.is_custom_fill() {
                let block = input_block(
                    " Custom value ",
                    focus == TransformFocus::CustomValue,
                    border,
                    active,
                );
                let inner = block.inner(layout[row]);
                block.render(layout[row], buf);
                (&form.custom_input).render(inner, buf);
                row += 1;
            }
        }
    }
    render_button("Apply", focus == TransformFocus::Apply, active, layout[row], buf);
}

fn render_export_form(
    area: Rect,
    buf: &mut Buffer,
    form: &ExportForm,
    active_pane: bool,
    theme: &Theme,
) {
    let border = theme.get("modal_border");
    let active = theme.get("modal_border_active");
    let focused = |f: ExportFocus| active_pane && form.focus == f;
    let csv = form.format == ExportFormat::Csv;

    let mut constraints = vec![
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(RadioBlock::height(ExportFormat::ALL.len(), 2)),
    ];
    if csv {
        constraints.push(Constraint::Length(RadioBlock::height(Separator::ALL.len(), 4)));
        constraints.push(Constraint::Length(RadioBlock::height(TextEncoding::ALL.len(), 3)));
    }
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Fill(1));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, (title, input, f)) in [
        (" Output directory ", &form.dir_input, ExportFocus::Directory),
        (" File name ", &form.name_input, ExportFocus::FileName),
    ]
    .into_iter()
    .enumerate()
    {
        let block = input_block(title, focused(f), border, active);
        let inner = block.inner(layout[i]);
        block.render(layout[i], buf);
        input.render(inner, buf);
    }

    let formats: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.as_str()).collect();
    RadioBlock::new(
        " Format ",
        &formats,
        form.format.index(),
        focused(ExportFocus::Format),
        2,
        border,
        active,
    )
    .render(layout[2], buf);

    let mut row = 3;
    if csv {
        let separators: Vec<&str> = Separator::ALL.iter().map(|s| s.label()).collect();
        RadioBlock::new(
            " Separator ",
            &separators,
            form.separator.index(),
            focused(ExportFocus::Separator),
            4,
            border,
            active,
        )
        .render(layout[row], buf);
        let encodings: Vec<&str> = TextEncoding::ALL.iter().map(|e| e.label()).collect();
        RadioBlock::new(
            " Encoding ",
            &encodings,
            form.encoding.index(),
            focused(ExportFocus::Encoding),
            3,
            border,
            active,
        )
        .render(layout[row + 1], buf);
        row += 2;
    }
    render_button("Export", focused(ExportFocus::ExportButton), active, layout[row], buf);
    if let Some(status) = &form.status {
        Paragraph::new(status.as_str())
            .style(Style::default().fg(theme.get("success")))
            .render(layout[row + 1], buf);
    }
}
