//! Numeric preparation for the analysis charts.
//!
//! Produces plain data (bins, density points, box statistics) that both the
//! terminal renderer and the image export draw from.

use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::error::DataError;
use crate::statistics::{is_numeric_type, numeric_values, quantile, sample_std, sorted};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Histogram of one column with a density curve scaled to bin counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionData {
    pub column: String,
    pub bins: Vec<HistogramBin>,
    /// (x, estimated count) points; empty when the values have no spread.
    pub density: Vec<(f64, f64)>,
}

impl DistributionData {
    pub fn x_bounds(&self) -> (f64, f64) {
        match (self.bins.first(), self.bins.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0.0, 1.0),
        }
    }

    pub fn y_max(&self) -> f64 {
        let bins = self.bins.iter().map(|b| b.count as f64);
        let curve = self.density.iter().map(|(_, y)| *y);
        bins.chain(curve).fold(0.0, f64::max)
    }
}

/// Box-and-whisker statistics. Whiskers stop at the last value within 1.5 IQR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotStats {
    pub name: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxPlotStats {
    pub fn y_bounds(&self) -> (f64, f64) {
        let lo = self.outliers.iter().copied().fold(self.lower_whisker, f64::min);
        let hi = self.outliers.iter().copied().fold(self.upper_whisker, f64::max);
        if hi > lo {
            (lo, hi)
        } else {
            (lo - 0.5, hi + 0.5)
        }
    }
}

fn column_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let col = df.column(column)?;
    if !is_numeric_type(col.dtype()) {
        return Err(DataError::validation(format!("Column '{}' is not numeric", column)).into());
    }
    let values = sorted(numeric_values(col.as_materialized_series())?);
    if values.is_empty() {
        return Err(
            DataError::validation(format!("Column '{}' has no values to plot", column)).into(),
        );
    }
    Ok(values)
}

/// Histogram plus density curve for one numeric column.
///
/// `bins` of `None` (or zero) picks the count automatically.
pub fn distribution(
    df: &DataFrame,
    column: &str,
    bins: Option<usize>,
    kde_points: usize,
) -> Result<DistributionData> {
    let values = column_values(df, column)?;
    let bin_count = bins.filter(|b| *b > 0).unwrap_or_else(|| auto_bin_count(&values));
    let bins = histogram(&values, bin_count);
    let bin_width = bins.first().map(|b| b.end - b.start).unwrap_or(1.0);
    let (x_min, x_max) = (values[0], values[values.len() - 1]);
    let density = gaussian_kde(&values, x_min, x_max, kde_points)
        .into_iter()
        .map(|(x, d)| (x, d * values.len() as f64 * bin_width))
        .collect();

    Ok(DistributionData {
        column: column.to_string(),
        bins,
        density,
    })
}

/// Smaller bin width of the Sturges and Freedman-Diaconis rules, as a bin count.
pub fn auto_bin_count(sorted_values: &[f64]) -> usize {
    let n = sorted_values.len();
    if n < 2 {
        return 1;
    }
    let range = sorted_values[n - 1] - sorted_values[0];
    if range <= 0.0 {
        return 1;
    }

    let sturges_width = range / ((n as f64).log2() + 1.0);
    let iqr = quantile(sorted_values, 0.75) - quantile(sorted_values, 0.25);
    let fd_width = 2.0 * iqr / (n as f64).cbrt();
    let width = if fd_width > 0.0 {
        sturges_width.min(fd_width)
    } else {
        sturges_width
    };
    ((range / width).ceil() as usize).clamp(1, 500)
}

/// Equal-width bins over the value range. The last bin includes its right edge.
pub fn histogram(sorted_values: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    let Some((&lo, &hi)) = sorted_values.first().zip(sorted_values.last()) else {
        return Vec::new();
    };
    let bin_count = bin_count.max(1);
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bin_count as f64;

    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bin_count {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for v in sorted_values {
        let idx = (((v - lo) / width).floor() as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Gaussian kernel density on `points` evenly spaced x values, Scott's bandwidth.
pub fn gaussian_kde(values: &[f64], x_min: f64, x_max: f64, points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    let std = sample_std(values);
    if n < 2 || !std.is_finite() || std == 0.0 || points < 2 || x_max <= x_min {
        return Vec::new();
    }

    let bandwidth = std * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (x_max - x_min) / (points - 1) as f64;
    (0..points)
        .map(|i| {
            let x = x_min + step * i as f64;
            let sum: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect()
}

pub fn box_plot(df: &DataFrame, column: &str) -> Result<BoxPlotStats> {
    let values = column_values(df, column)?;
    let q1 = quantile(&values, 0.25);
    let median = quantile(&values, 0.5);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let inside = || values.iter().copied().filter(|v| *v >= lower_fence && *v <= upper_fence);
    let lower_whisker = inside().next().unwrap_or(q1);
    let upper_whisker = inside().last().unwrap_or(q3);
    let outliers = values
        .iter()
        .copied()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .collect();

    Ok(BoxPlotStats {
        name: column.to_string(),
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Format axis label: scientific notation for very large or very small magnitudes.
pub fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [1.0, 2.0, 2.0, 3.0, 4.0, 5.0];
        let bins = histogram(&values, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[3].end, 5.0);
        assert_eq!(bins[3].count, 2);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[7.0, 7.0], 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(bins[0].start, 6.5);
    }

    #[test]
    fn test_auto_bin_count() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let bins = auto_bin_count(&values);
        assert!((5..=20).contains(&bins), "got {}", bins);
        assert_eq!(auto_bin_count(&[3.0]), 1);
    }

    #[test]
    fn test_kde_constant_values_is_empty() {
        assert!(gaussian_kde(&[2.0, 2.0, 2.0], 2.0, 2.0, 50).is_empty());
    }

    #[test]
    fn test_kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let curve = gaussian_kde(&values, -10.0, 20.0, 400);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.02, "area {}", area);
    }

    #[test]
    fn test_box_plot_outliers() {
        let df = df!("v" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        let stats = box_plot(&df, "v").unwrap();
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.lower_whisker, 1.0);
    }

    #[test]
    fn test_distribution_rejects_text() {
        let df = df!("s" => ["a", "b"]).unwrap();
        assert!(distribution(&df, "s", None, 100).is_err());
    }

    #[test]
    fn test_format_axis_label() {
        assert_eq!(format_axis_label(1.5), "1.50");
        assert_eq!(format_axis_label(0.0), "0.00");
        assert_eq!(format_axis_label(2_000_000.0), "2.00e6");
    }
}
