//! Explore screen rendering: checklists on the left, report page on the right.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, StatefulWidget, Widget, Wrap},
};

use super::chart::{BoxPlotChart, CorrelationGrid, DescribeView, DistributionChart, MissingBars};
use super::checklist::Checklist;
use crate::analysis::AnalysisKind;
use crate::config::Theme;
use crate::explore_view::{report_pages, ExploreFocus, ExploreView, ReportPage};
use crate::session::SessionState;

const SIDEBAR_WIDTH: u16 = 32;

pub fn render_explore(
    area: Rect,
    buf: &mut Buffer,
    view: &mut ExploreView,
    session: &SessionState,
    theme: &Theme,
) {
    let border = theme.get("modal_border");
    let active = theme.get("modal_border_active");
    let text = theme.get("text_primary");

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
        .split(area);
    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(AnalysisKind::ALL.len() as u16 + 2),
        ])
        .split(main[0]);

    Checklist::new("Columns", session.columns.iter())
        .focused(view.focus == ExploreFocus::Columns)
        .colors(border, active, text)
        .render(sidebar[0], buf, &mut view.columns);
    Checklist::new(
        "Analyses",
        AnalysisKind::ALL
            .iter()
            .map(|k| (k.label(), session.analyses.is_enabled(*k))),
    )
    .focused(view.focus == ExploreFocus::Analyses)
    .colors(border, active, text)
    .render(sidebar[1], buf, &mut view.analyses);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(main[1]);
    render_report(right[0], buf, view, theme);

    if let Some(status) = &view.status {
        Paragraph::new(status.as_str())
            .style(Style::default().fg(theme.get("success")))
            .render(right[1], buf);
    }
}

fn render_report(area: Rect, buf: &mut Buffer, view: &ExploreView, theme: &Theme) {
    let Some(report) = &view.report else {
        Paragraph::new("Choose columns and analyses, then press Enter to run them")
            .centered()
            .style(Style::default().fg(theme.get("text_secondary")))
            .render(area, buf);
        return;
    };
    let pages = report_pages(report);
    let Some(page) = pages.get(view.page).copied() else {
        Paragraph::new("Nothing to show for the selected analyses")
            .centered()
            .style(Style::default().fg(theme.get("warning")))
            .render(area, buf);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Fill(1)])
        .split(area);
    let header_style = if view.focus == ExploreFocus::Report {
        Style::default().fg(theme.get("modal_border_active"))
    } else {
        Style::default().fg(theme.get("table_header"))
    };
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", page.title(report)),
            header_style.bold(),
        ),
        Span::styled(
            format!("({}/{})  ←→ page  s save charts", view.page + 1, pages.len()),
            Style::default().fg(theme.get("dimmed")),
        ),
    ]))
    .render(layout[0], buf);

    let body = layout[1];
    match page {
        ReportPage::Describe => {
            if let Some(table) = &report.describe {
                DescribeView { table, theme }.render(body, buf);
            }
        }
        ReportPage::Distribution(i) => {
            if let Some(data) = report.distributions.get(i) {
                DistributionChart { data, theme }.render(body, buf);
            }
        }
        ReportPage::Correlation => {
            if let Some(matrix) = &report.correlation {
                CorrelationGrid { matrix, theme }.render(body, buf);
            }
        }
        ReportPage::MissingValues => {
            if let Some(counts) = &report.missing {
                MissingBars { counts, theme }.render(body, buf);
            }
        }
        ReportPage::BoxPlot(i) => {
            if let Some(stats) = report.box_plots.get(i) {
                BoxPlotChart { stats, theme }.render(body, buf);
            }
        }
        ReportPage::Notes => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(" Notes ")
                .border_style(Style::default().fg(theme.get("modal_border")));
            let lines: Vec<Line> = report
                .notes
                .iter()
                .map(|n| Line::from(format!("• {}", n)))
                .collect();
            Paragraph::new(lines)
                .style(Style::default().fg(theme.get("warning")))
                .wrap(Wrap { trim: true })
                .block(block)
                .render(body, buf);
        }
    }
}
