//! The explore-mode analyses and the report they produce.

use color_eyre::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::chart_data::{self, BoxPlotStats, DistributionData};
use crate::chart_export::ChartSpec;
use crate::config::AnalysisConfig;
use crate::error::DataError;
use crate::statistics::{self, CorrelationMatrix, DescribeTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    DescriptiveStatistics,
    Distribution,
    Correlation,
    MissingValues,
    BoxPlot,
}

impl AnalysisKind {
    pub const ALL: [Self; 5] = [
        Self::DescriptiveStatistics,
        Self::Distribution,
        Self::Correlation,
        Self::MissingValues,
        Self::BoxPlot,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::DescriptiveStatistics => "Descriptive statistics",
            Self::Distribution => "Distribution",
            Self::Correlation => "Correlation",
            Self::MissingValues => "Missing values",
            Self::BoxPlot => "Box plots",
        }
    }
}

/// Which analyses are switched on. Every kind has an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSelection(BTreeMap<AnalysisKind, bool>);

impl Default for AnalysisSelection {
    /// Descriptive statistics only.
    fn default() -> Self {
        Self(
            AnalysisKind::ALL
                .into_iter()
                .map(|k| (k, k == AnalysisKind::DescriptiveStatistics))
                .collect(),
        )
    }
}

impl AnalysisSelection {
    pub fn set(&mut self, kind: AnalysisKind, enabled: bool) {
        self.0.insert(kind, enabled);
    }

    pub fn is_enabled(&self, kind: AnalysisKind) -> bool {
        self.0.get(&kind).copied().unwrap_or(false)
    }

    pub fn enabled(&self) -> impl Iterator<Item = AnalysisKind> + '_ {
        self.0.iter().filter(|(_, on)| **on).map(|(k, _)| *k)
    }
}

/// Result of one analysis run. A `None`/empty section was either not requested
/// or had nothing to show; `notes` says which.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub columns: Vec<String>,
    pub describe: Option<DescribeTable>,
    pub distributions: Vec<DistributionData>,
    pub correlation: Option<CorrelationMatrix>,
    pub missing: Option<Vec<(String, usize)>>,
    pub box_plots: Vec<BoxPlotStats>,
    /// Messages for analyses that had nothing to show
    pub notes: Vec<String>,
}

impl AnalysisReport {
    /// Charts in display order, for saving to files.
    pub fn charts(&self) -> Vec<ChartSpec<'_>> {
        let mut charts: Vec<ChartSpec<'_>> =
            self.distributions.iter().map(ChartSpec::Distribution).collect();
        if let Some(matrix) = &self.correlation {
            charts.push(ChartSpec::Correlation(matrix));
        }
        if let Some(missing) = &self.missing {
            charts.push(ChartSpec::MissingValues(missing));
        }
        charts.extend(self.box_plots.iter().map(ChartSpec::BoxPlot));
        charts
    }
}

/// Run every enabled analysis over `columns`.
///
/// An empty column selection is an error. Analyses whose numeric
/// precondition is not met add a note instead of failing.
pub fn run(
    df: &DataFrame,
    columns: &[String],
    selection: &AnalysisSelection,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    if columns.is_empty() {
        return Err(DataError::validation("Select at least one column").into());
    }

    let numeric = statistics::numeric_columns(df, columns)?;
    let mut report = AnalysisReport {
        columns: columns.to_vec(),
        ..AnalysisReport::default()
    };

    for kind in selection.enabled() {
        debug!(analysis = kind.label(), columns = columns.len(), "running analysis");
        match kind {
            AnalysisKind::DescriptiveStatistics => {
                let table = statistics::describe(df, columns)?;
                if table.is_empty() {
                    report
                        .notes
                        .push("No numeric columns selected for descriptive statistics".into());
                }
                report.describe = Some(table);
            }
            AnalysisKind::Distribution => {
                if numeric.is_empty() {
                    report
                        .notes
                        .push("No numeric columns selected for distribution plots".into());
                }
                let bins = Some(config.histogram_bins).filter(|b| *b > 0);
                for name in &numeric {
                    match chart_data::distribution(df, name, bins, config.kde_points) {
                        Ok(data) => report.distributions.push(data),
                        Err(e) => report.notes.push(e.to_string()),
                    }
                }
            }
            AnalysisKind::Correlation => {
                report.correlation = statistics::correlation(df, columns)?;
                if report.correlation.is_none() {
                    report
                        .notes
                        .push("Correlation needs at least 2 numeric columns".into());
                }
            }
            AnalysisKind::MissingValues => {
                report.missing = statistics::missing_values(df, columns)?;
                if report.missing.is_none() {
                    report
                        .notes
                        .push("No missing values in the selected columns".into());
                }
            }
            AnalysisKind::BoxPlot => {
                if numeric.is_empty() {
                    report
                        .notes
                        .push("No numeric columns selected for box plots".into());
                }
                for name in &numeric {
                    match chart_data::box_plot(df, name) {
                        Ok(stats) => report.box_plots.push(stats),
                        Err(e) => report.notes.push(e.to_string()),
                    }
                }
            }
        }
    }
    Ok(report)
}
