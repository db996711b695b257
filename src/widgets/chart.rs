//! Terminal renderings of the analysis report: describe table, histogram with
//! density, box plot, correlation grid and missing-value bars.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Style, Stylize},
    symbols,
    text::Span,
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, BorderType, Borders, Chart, Dataset, GraphType,
        Paragraph, Row, Table, Widget,
    },
};

use crate::chart_data::{format_axis_label, BoxPlotStats, DistributionData};
use crate::chart_export::coolwarm;
use crate::config::Theme;
use crate::statistics::{CorrelationMatrix, DescribeTable};

const BOX_HALF_WIDTH: f64 = 0.3;
const CAP_HALF_WIDTH: f64 = 0.2;
/// Width of one heatmap cell: "-0.00" plus padding
const HEATMAP_CELL_WIDTH: u16 = 7;

fn titled_block<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .border_style(Style::default().fg(theme.get("modal_border")))
}

fn axis_labels(lo: f64, hi: f64, style: Style) -> Vec<Span<'static>> {
    vec![
        Span::styled(format_axis_label(lo), style),
        Span::styled(format_axis_label((lo + hi) / 2.0), style),
        Span::styled(format_axis_label(hi), style),
    ]
}

pub struct DescribeView<'a> {
    pub table: &'a DescribeTable,
    pub theme: &'a Theme,
}

impl Widget for DescribeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = titled_block(" Descriptive statistics ".to_string(), self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.table.is_empty() {
            Paragraph::new("No numeric columns selected")
                .centered()
                .style(Style::default().fg(self.theme.get("warning")))
                .render(inner, buf);
            return;
        }

        let mut header = vec![String::new()];
        header.extend(self.table.columns.iter().map(|c| c.name.clone()));
        let stat_names = self.table.columns[0].rows().map(|(name, _)| name);
        let rows: Vec<Row> = stat_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut cells = vec![Span::styled(
                    name.to_string(),
                    Style::default().fg(self.theme.get("table_header")),
                )];
                cells.extend(
                    self.table
                        .columns
                        .iter()
                        .map(|c| Span::raw(format_axis_label(c.rows()[i].1))),
                );
                Row::new(cells)
            })
            .collect();
        let mut widths = vec![Constraint::Length(6)];
        widths.extend(self.table.columns.iter().map(|_| Constraint::Min(10)));
        Table::new(rows, widths)
            .header(
                Row::new(header).style(Style::default().fg(self.theme.get("table_header")).bold()),
            )
            .column_spacing(2)
            .render(inner, buf);
    }
}

pub struct DistributionChart<'a> {
    pub data: &'a DistributionData,
    pub theme: &'a Theme,
}

impl Widget for DistributionChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = titled_block(format!(" Distribution: {} ", self.data.column), self.theme);
        if self.data.bins.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new("No data to plot").centered().render(inner, buf);
            return;
        }

        let bars: Vec<(f64, f64)> = self
            .data
            .bins
            .iter()
            .map(|b| (b.center(), b.count as f64))
            .collect();
        let (x_min, x_max) = self.data.x_bounds();
        let y_max = self.data.y_max().max(1.0);

        let mut datasets = vec![Dataset::default()
            .name("count")
            .marker(symbols::Marker::HalfBlock)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(self.theme.get("chart_series")))
            .data(&bars)];
        if !self.data.density.is_empty() {
            datasets.push(
                Dataset::default()
                    .name("density")
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.get("chart_density")))
                    .data(&self.data.density),
            );
        }

        let label_style = Style::default().fg(self.theme.get("text_primary"));
        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([x_min, x_max])
                    .style(label_style)
                    .labels(axis_labels(x_min, x_max, label_style)),
            )
            .y_axis(
                Axis::default()
                    .bounds([0.0, y_max])
                    .style(label_style)
                    .labels(axis_labels(0.0, y_max, label_style)),
            )
            .render(area, buf);
    }
}

/// Line segments that draw one vertical box at x = 0.
fn box_segments(stats: &BoxPlotStats) -> Vec<Vec<(f64, f64)>> {
    let (b, c) = (BOX_HALF_WIDTH, CAP_HALF_WIDTH);
    vec![
        // box outline
        vec![
            (-b, stats.q1),
            (b, stats.q1),
            (b, stats.q3),
            (-b, stats.q3),
            (-b, stats.q1),
        ],
        vec![(-b, stats.median), (b, stats.median)],
        vec![(0.0, stats.q3), (0.0, stats.upper_whisker)],
        vec![(0.0, stats.q1), (0.0, stats.lower_whisker)],
        vec![(-c, stats.upper_whisker), (c, stats.upper_whisker)],
        vec![(-c, stats.lower_whisker), (c, stats.lower_whisker)],
    ]
}

pub struct BoxPlotChart<'a> {
    pub stats: &'a BoxPlotStats,
    pub theme: &'a Theme,
}

impl Widget for BoxPlotChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = titled_block(format!(" Box plot: {} ", self.stats.name), self.theme);
        let segments = box_segments(self.stats);
        let outliers: Vec<(f64, f64)> = self.stats.outliers.iter().map(|v| (0.0, *v)).collect();
        let series = Style::default().fg(self.theme.get("chart_series"));

        let mut datasets: Vec<Dataset> = segments
            .iter()
            .map(|points| {
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(series)
                    .data(points)
            })
            .collect();
        if !outliers.is_empty() {
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(self.theme.get("warning")))
                    .data(&outliers),
            );
        }

        let (lo, hi) = self.stats.y_bounds();
        let label_style = Style::default().fg(self.theme.get("text_primary"));
        Chart::new(datasets)
            .block(block)
            .x_axis(Axis::default().bounds([-1.0, 1.0]).style(label_style))
            .y_axis(
                Axis::default()
                    .bounds([lo, hi])
                    .style(label_style)
                    .labels(axis_labels(lo, hi, label_style)),
            )
            .render(area, buf);
    }
}

pub struct CorrelationGrid<'a> {
    pub matrix: &'a CorrelationMatrix,
    pub theme: &'a Theme,
}

impl Widget for CorrelationGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = titled_block(" Correlation ".to_string(), self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let names = &self.matrix.columns;
        let label_width = names
            .iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0)
            .min(16) as u16
            + 1;
        let text_style = Style::default().fg(self.theme.get("text_primary"));

        // header row: column names cut to the cell width
        for (j, name) in names.iter().enumerate() {
            let x = inner.x + label_width + j as u16 * HEATMAP_CELL_WIDTH;
            if x + HEATMAP_CELL_WIDTH > inner.right() {
                break;
            }
            let short: String = name.chars().take(HEATMAP_CELL_WIDTH as usize - 1).collect();
            buf.set_string(x, inner.y, short, text_style.bold());
        }

        for (i, name) in names.iter().enumerate() {
            let y = inner.y + 1 + i as u16;
            if y >= inner.bottom() {
                break;
            }
            let short: String = name.chars().take(label_width as usize - 1).collect();
            buf.set_string(inner.x, y, short, text_style.bold());
            for j in 0..names.len() {
                let x = inner.x + label_width + j as u16 * HEATMAP_CELL_WIDTH;
                if x + HEATMAP_CELL_WIDTH > inner.right() {
                    break;
                }
                let r = self.matrix.get(i, j);
                let rgb = coolwarm(r);
                let bg = Color::Rgb(rgb.0, rgb.1, rgb.2);
                let cell_style = Style::default().bg(bg).fg(Color::Black);
                for dx in 0..HEATMAP_CELL_WIDTH - 1 {
                    buf[(x + dx, y)].set_style(cell_style);
                }
                let text = if r.is_finite() {
                    format!("{:>5.2}", r)
                } else {
                    "  nan".to_string()
                };
                buf.set_string(x, y, text, cell_style);
            }
        }
    }
}

pub struct MissingBars<'a> {
    pub counts: &'a [(String, usize)],
    pub theme: &'a Theme,
}

impl Widget for MissingBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = titled_block(" Missing values ".to_string(), self.theme);
        let bar_style = Style::default().fg(self.theme.get("chart_series"));
        let bars: Vec<Bar> = self
            .counts
            .iter()
            .map(|(name, n)| {
                Bar::default()
                    .label(name.as_str().into())
                    .value(*n as u64)
                    .style(bar_style)
            })
            .collect();
        let bar_width = match self.counts.len() {
            0 => 1,
            n => (area.width.saturating_sub(2) / n as u16)
                .saturating_sub(1)
                .clamp(1, 12),
        };
        BarChart::default()
            .block(block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buf: &Buffer, area: Rect) -> String {
        (area.y..area.bottom())
            .map(|y| {
                (area.x..area.right())
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_box_segments_cover_whiskers() {
        let stats = BoxPlotStats {
            name: "v".into(),
            lower_whisker: 1.0,
            q1: 2.0,
            median: 3.0,
            q3: 4.0,
            upper_whisker: 5.0,
            outliers: vec![],
        };
        let segments = box_segments(&stats);
        let ys: Vec<f64> = segments.iter().flatten().map(|(_, y)| *y).collect();
        assert!(ys.contains(&1.0));
        assert!(ys.contains(&5.0));
        assert_eq!(segments[1], vec![(-0.3, 3.0), (0.3, 3.0)]);
    }

    #[test]
    fn test_correlation_grid_annotates_values() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into()],
            coefficients: vec![vec![1.0, -0.5], vec![-0.5, 1.0]],
        };
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        CorrelationGrid {
            matrix: &matrix,
            theme: &Theme::default(),
        }
        .render(area, &mut buf);
        let out = text(&buf, area);
        assert!(out.contains(" 1.00"));
        assert!(out.contains("-0.50"));
    }

    #[test]
    fn test_empty_distribution_shows_message() {
        let data = DistributionData {
            column: "x".into(),
            bins: vec![],
            density: vec![],
        };
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        DistributionChart {
            data: &data,
            theme: &Theme::default(),
        }
        .render(area, &mut buf);
        assert!(text(&buf, area).contains("No data to plot"));
    }
}
