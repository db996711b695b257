//! Render analysis charts to PNG or SVG files with plotters.

use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chart_data::{BoxPlotStats, DistributionData};
use crate::error::DataError;
use crate::statistics::CorrelationMatrix;

/// Image format for saved charts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChartExportFormat {
    #[default]
    Png,
    Svg,
}

impl ChartExportFormat {
    pub const ALL: [Self; 2] = [Self::Png, Self::Svg];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

/// A chart ready to be drawn.
#[derive(Debug, Clone, Copy)]
pub enum ChartSpec<'a> {
    Distribution(&'a DistributionData),
    Correlation(&'a CorrelationMatrix),
    MissingValues(&'a [(String, usize)]),
    BoxPlot(&'a BoxPlotStats),
}

impl ChartSpec<'_> {
    /// File name (without extension) for this chart.
    pub fn file_stem(&self) -> String {
        match self {
            Self::Distribution(d) => format!("distribution_{}", sanitize(&d.column)),
            Self::Correlation(_) => "correlation".to_string(),
            Self::MissingValues(_) => "missing_values".to_string(),
            Self::BoxPlot(b) => format!("box_plot_{}", sanitize(&b.name)),
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

const SERIES: RGBColor = RGBColor(31, 119, 180);
const DENSITY: RGBColor = RGBColor(214, 39, 40);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 20);

/// Write a chart to `path` in the given format.
pub fn write_chart(
    path: &Path,
    chart: &ChartSpec<'_>,
    format: ChartExportFormat,
    size: (u32, u32),
) -> Result<()> {
    match format {
        ChartExportFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_chart(&root, chart)?;
            root.present()?;
        }
        ChartExportFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_chart(&root, chart)?;
            root.present()?;
        }
    }
    info!(path = %path.display(), chart = %chart.file_stem(), "saved chart");
    Ok(())
}

/// Write every chart into `dir`, creating it if needed. Returns the written paths.
pub fn write_charts(
    dir: &Path,
    charts: &[ChartSpec<'_>],
    format: ChartExportFormat,
    size: (u32, u32),
) -> Result<Vec<PathBuf>> {
    if charts.is_empty() {
        return Err(DataError::validation("There are no charts to save").into());
    }
    std::fs::create_dir_all(dir).map_err(|e| DataError::io(dir, e))?;
    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = dir.join(format!("{}.{}", chart.file_stem(), format.extension()));
        write_chart(&path, chart, format, size)?;
        written.push(path);
    }
    Ok(written)
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, chart: &ChartSpec<'_>) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match chart {
        ChartSpec::Distribution(data) => draw_distribution(root, data),
        ChartSpec::Correlation(matrix) => draw_correlation(root, matrix),
        ChartSpec::MissingValues(counts) => draw_missing_values(root, counts),
        ChartSpec::BoxPlot(stats) => draw_box_plot(root, stats),
    }
}

fn draw_distribution<DB>(root: &DrawingArea<DB, Shift>, data: &DistributionData) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = data.x_bounds();
    let y_max = data.y_max().max(1.0) * 1.05;

    let mut chart = ChartBuilder::on(root)
        .margin(30)
        .caption(format!("Distribution of {}", data.column), CAPTION_FONT)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc(data.column.as_str())
        .y_desc("Count")
        .draw()?;

    chart.draw_series(data.bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], SERIES.mix(0.6).filled())
    }))?;

    if !data.density.is_empty() {
        chart.draw_series(LineSeries::new(
            data.density.iter().copied(),
            DENSITY.stroke_width(2),
        ))?;
    }
    Ok(())
}

/// Diverging blue-white-red scale for coefficients in [-1, 1].
pub fn coolwarm(r: f64) -> RGBColor {
    if !r.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let (low, mid, high) = ((59, 76, 192), (221, 221, 221), (180, 4, 38));
    let lerp = |a: u8, b: u8, t: f64| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    let t = r.clamp(-1.0, 1.0);
    let (from, to, t) = if t < 0.0 {
        (mid, low, -t)
    } else {
        (mid, high, t)
    };
    RGBColor(
        lerp(from.0, to.0, t),
        lerp(from.1, to.1, t),
        lerp(from.2, to.2, t),
    )
}

fn draw_correlation<DB>(root: &DrawingArea<DB, Shift>, matrix: &CorrelationMatrix) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = matrix.columns.len() as i32;
    let names = &matrix.columns;
    let label = |v: &SegmentValue<i32>, flip: bool| match v {
        SegmentValue::CenterOf(i) => {
            let idx = if flip { n - 1 - *i } else { *i };
            names.get(idx as usize).cloned().unwrap_or_default()
        }
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(root)
        .margin(30)
        .caption("Correlation matrix", CAPTION_FONT)
        .x_label_area_size(60)
        .y_label_area_size(100)
        // integer ranges are inclusive, so 0..n-1 gives exactly n cells
        .build_cartesian_2d((0..n - 1).into_segmented(), (0..n - 1).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&|v| label(v, false))
        .y_label_formatter(&|v| label(v, true))
        .draw()?;

    let text_style = ("sans-serif", 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (i, row) in matrix.coefficients.iter().enumerate() {
        // row 0 at the top
        let y = n - 1 - i as i32;
        for (j, r) in row.iter().enumerate() {
            let x = j as i32;
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                coolwarm(*r).filled(),
            )))?;
            let annotation = if r.is_finite() {
                format!("{:.2}", r)
            } else {
                "n/a".to_string()
            };
            chart.draw_series(std::iter::once(Text::new(
                annotation,
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                text_style.clone(),
            )))?;
        }
    }
    Ok(())
}

fn draw_missing_values<DB>(root: &DrawingArea<DB, Shift>, counts: &[(String, usize)]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = counts.len() as i32;
    let y_max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(root)
        .margin(30)
        .caption("Missing values per column", CAPTION_FONT)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => counts
                .get(*i as usize)
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc("Missing values")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(SERIES.filled())
            .margin(10)
            .data(counts.iter().enumerate().map(|(i, (_, c))| (i as i32, *c as f64))),
    )?;
    Ok(())
}

fn draw_box_plot<DB>(root: &DrawingArea<DB, Shift>, stats: &BoxPlotStats) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (y_lo, y_hi) = stats.y_bounds();
    let pad = (y_hi - y_lo) * 0.05;

    let mut chart = ChartBuilder::on(root)
        .margin(30)
        .caption(format!("Box plot of {}", stats.name), CAPTION_FONT)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-1.0..1.0, (y_lo - pad)..(y_hi + pad))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .x_desc(stats.name.as_str())
        .y_desc("Value")
        .draw()?;

    let box_half = 0.3;
    let cap_half = 0.2;
    let line = SERIES.stroke_width(2);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(-box_half, stats.q1), (box_half, stats.q3)],
        SERIES.mix(0.3).filled(),
    )))?;
    let segments = [
        vec![
            (-box_half, stats.q1),
            (box_half, stats.q1),
            (box_half, stats.q3),
            (-box_half, stats.q3),
            (-box_half, stats.q1),
        ],
        vec![(-box_half, stats.median), (box_half, stats.median)],
        vec![(0.0, stats.lower_whisker), (0.0, stats.q1)],
        vec![(0.0, stats.q3), (0.0, stats.upper_whisker)],
        vec![(-cap_half, stats.lower_whisker), (cap_half, stats.lower_whisker)],
        vec![(-cap_half, stats.upper_whisker), (cap_half, stats.upper_whisker)],
    ];
    for points in segments {
        chart.draw_series(LineSeries::new(points, line))?;
    }
    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|v| Circle::new((0.0, *v), 3, DENSITY.filled())),
    )?;
    Ok(())
}
