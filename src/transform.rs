//! Dataset transformations: sampling, column renaming and missing-value fill.
//!
//! Every function takes the dataset by reference and returns a new one.

use chrono::{NaiveDate, NaiveDateTime};
use color_eyre::Result;
use polars::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::DataError;
use crate::statistics::is_numeric_type;

/// Kind of transformation, used to name exported files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Treatment {
    Sampling,
    Renaming,
    Filling,
}

impl Treatment {
    pub const ALL: [Self; 3] = [Self::Sampling, Self::Renaming, Self::Filling];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Sampling => "sampling",
            Self::Renaming => "renaming",
            Self::Filling => "filling",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sampling => "Sampling",
            Self::Renaming => "Rename columns",
            Self::Filling => "Fill missing values",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingMethod {
    /// Uniform draw without replacement
    Random,
    /// Proportional draw within each value of `column`
    Stratified { column: String },
    FirstRows,
    LastRows,
}

impl SamplingMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Stratified { .. } => "Stratified random",
            Self::FirstRows => "First rows",
            Self::LastRows => "Last rows",
        }
    }
}

/// Either an exact row count or a fraction of the rows. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleSize {
    Rows(usize),
    Fraction(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRequest {
    pub method: SamplingMethod,
    pub size: SampleSize,
}

impl SampleRequest {
    pub fn new(method: SamplingMethod, size: SampleSize) -> Self {
        Self { method, size }
    }

    /// Number of rows to draw from a dataset of `height` rows.
    pub fn row_count(&self, height: usize) -> Result<usize> {
        match self.size {
            SampleSize::Rows(n) if n > height => Err(DataError::validation(format!(
                "Cannot take {} rows from a dataset with {} rows",
                n, height
            ))
            .into()),
            SampleSize::Rows(n) => Ok(n),
            SampleSize::Fraction(f) if !(0.0..=1.0).contains(&f) => Err(DataError::validation(
                format!("Sampling fraction must be between 0 and 1, got {}", f),
            )
            .into()),
            SampleSize::Fraction(f) => {
                let n = (f * height as f64).round_ties_even() as usize;
                Ok(n.min(height))
            }
        }
    }
}

/// Sample rows with a fresh, unseeded generator.
pub fn sample(df: &DataFrame, request: &SampleRequest) -> Result<DataFrame> {
    sample_with_rng(df, request, &mut rand::thread_rng())
}

/// Sample rows. Output keeps every column and the original row order.
pub fn sample_with_rng<R: Rng + ?Sized>(
    df: &DataFrame,
    request: &SampleRequest,
    rng: &mut R,
) -> Result<DataFrame> {
    let height = df.height();
    let n = request.row_count(height)?;
    debug!(method = request.method.label(), rows = n, of = height, "sampling");

    let out = match &request.method {
        SamplingMethod::FirstRows => df.head(Some(n)),
        SamplingMethod::LastRows => df.tail(Some(n)),
        SamplingMethod::Random => {
            let mut indices: Vec<u32> = rand::seq::index::sample(rng, height, n)
                .into_iter()
                .map(|i| i as u32)
                .collect();
            indices.sort_unstable();
            take_rows(df, indices)?
        }
        SamplingMethod::Stratified { column } => {
            let indices = stratified_indices(df, column, n, rng)?;
            take_rows(df, indices)?
        }
    };
    Ok(out)
}

fn take_rows(df: &DataFrame, indices: Vec<u32>) -> Result<DataFrame> {
    let idx = IdxCa::new("indices".into(), indices);
    Ok(df.take(&idx)?)
}

/// Row indices grouped by the value of `column`. Nulls form their own group.
fn strata(df: &DataFrame, column: &str) -> Result<BTreeMap<Option<String>, Vec<u32>>> {
    let as_text = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let mut groups: BTreeMap<Option<String>, Vec<u32>> = BTreeMap::new();
    for (i, value) in as_text.str()?.iter().enumerate() {
        groups
            .entry(value.map(str::to_string))
            .or_default()
            .push(i as u32);
    }
    Ok(groups)
}

/// Allocate `n` draws across groups in proportion to their size (largest remainder).
pub fn allocate_proportional(group_sizes: &[usize], n: usize) -> Vec<usize> {
    let total: usize = group_sizes.iter().sum();
    if total == 0 {
        return vec![0; group_sizes.len()];
    }
    let quotas: Vec<f64> = group_sizes
        .iter()
        .map(|&size| n as f64 * size as f64 / total as f64)
        .collect();
    let mut counts: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let mut remaining = n.saturating_sub(counts.iter().sum());

    let mut by_remainder: Vec<usize> = (0..group_sizes.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for i in by_remainder {
        if remaining == 0 {
            break;
        }
        if counts[i] < group_sizes[i] {
            counts[i] += 1;
            remaining -= 1;
        }
    }
    counts
}

fn stratified_indices<R: Rng + ?Sized>(
    df: &DataFrame,
    column: &str,
    n: usize,
    rng: &mut R,
) -> Result<Vec<u32>> {
    let groups: Vec<Vec<u32>> = strata(df, column)?.into_values().collect();
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    let counts = allocate_proportional(&sizes, n);

    let mut indices = Vec::with_capacity(n);
    for (group, count) in groups.iter().zip(counts) {
        indices.extend(
            rand::seq::index::sample(rng, group.len(), count)
                .into_iter()
                .map(|i| group[i]),
        );
    }
    indices.sort_unstable();
    Ok(indices)
}

/// Rename columns. Unmapped columns keep their names.
///
/// Fails when a source column is unknown, a new name is blank, or the result
/// would contain two columns with the same name.
pub fn rename(df: &DataFrame, mapping: &[(String, String)]) -> Result<DataFrame> {
    let mut names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    for (old, new) in mapping {
        let new = new.trim();
        if new.is_empty() {
            return Err(DataError::validation(format!("New name for '{}' is empty", old)).into());
        }
        let idx = df
            .get_column_index(old)
            .ok_or_else(|| DataError::validation(format!("Unknown column '{}'", old)))?;
        names[idx] = new.to_string();
    }

    let mut seen = HashSet::with_capacity(names.len());
    if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
        return Err(DataError::DuplicateName(dup.clone()).into());
    }

    let mut out = df.clone();
    out.set_column_names(names)?;
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillMethod {
    Zero,
    Mean,
    Median,
    ForwardFill,
    BackwardFill,
    Custom(String),
}

impl FillMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::ForwardFill => "ffill",
            Self::BackwardFill => "bfill",
            Self::Custom(_) => "custom",
        }
    }
}

/// Columns that contain at least one null, in dataset order.
pub fn columns_with_nulls(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| c.name().to_string())
        .collect()
}

/// Replace nulls in `columns`. Other columns are left untouched.
///
/// Mean and median skip non-numeric columns. Integer columns become float when
/// the fill value has a fractional part. A custom value that does not parse as
/// the column's type turns the column into text.
pub fn fill(df: &DataFrame, columns: &[String], method: &FillMethod) -> Result<DataFrame> {
    if columns.is_empty() {
        return Err(DataError::validation("Select at least one column to fill").into());
    }
    if let FillMethod::Custom(value) = method {
        if value.is_empty() {
            return Err(DataError::validation("Enter a value to fill with").into());
        }
    }

    let mut out = df.clone();
    let mut exprs = Vec::new();
    for name in columns {
        let column = df.column(name)?;
        if column.null_count() == 0 {
            continue;
        }
        let series = column.as_materialized_series();
        match method {
            FillMethod::ForwardFill => {
                out.with_column(series.fill_null(FillNullStrategy::Forward(None))?)?;
            }
            FillMethod::BackwardFill => {
                out.with_column(series.fill_null(FillNullStrategy::Backward(None))?)?;
            }
            FillMethod::Zero => exprs.push(literal_fill(name, series.dtype(), "0")),
            FillMethod::Custom(value) => exprs.push(literal_fill(name, series.dtype(), value)),
            FillMethod::Mean | FillMethod::Median => {
                if !is_numeric_type(series.dtype()) {
                    warn!(column = %name, method = method.label(), "skipping non-numeric column");
                    continue;
                }
                let value = match method {
                    FillMethod::Mean => series.mean(),
                    _ => series.median(),
                };
                // all-null column: nothing to fill with
                let Some(value) = value else {
                    continue;
                };
                exprs.push(numeric_fill(name, series.dtype(), value));
            }
        }
    }

    if !exprs.is_empty() {
        out = out.lazy().with_columns(exprs).collect()?;
    }
    Ok(out)
}

fn is_integer_type(dtype: &DataType) -> bool {
    is_numeric_type(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// `value` as an i64 when it is whole and inside the i64 range.
fn exact_i64(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Integer fill that keeps the column's type, if `value` fits that type.
fn integer_fill(name: &str, dtype: &DataType, value: i64) -> Option<Expr> {
    Series::new(PlSmallStr::EMPTY, [value]).strict_cast(dtype).ok()?;
    Some(col(name).fill_null(lit(value).cast(dtype.clone())))
}

/// Integer columns keep their type for whole, in-range values; anything else
/// turns the column into float.
fn numeric_fill(name: &str, dtype: &DataType, value: f64) -> Expr {
    let as_integer = exact_i64(value)
        .filter(|_| is_integer_type(dtype))
        .and_then(|v| integer_fill(name, dtype, v));
    match as_integer {
        Some(expr) => expr,
        None => col(name).cast(DataType::Float64).fill_null(lit(value)),
    }
}

fn text_fill(name: &str, value: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .fill_null(lit(value.to_string()))
}

/// Fill with a literal typed like the column, falling back to text.
fn literal_fill(name: &str, dtype: &DataType, value: &str) -> Expr {
    let trimmed = value.trim();
    match dtype {
        d if is_numeric_type(d) => match (trimmed.parse::<i64>(), trimmed.parse::<f64>()) {
            (Ok(i), _) if is_integer_type(d) => {
                integer_fill(name, d, i).unwrap_or_else(|| numeric_fill(name, d, i as f64))
            }
            (_, Ok(f)) => numeric_fill(name, d, f),
            _ => text_fill(name, value),
        },
        DataType::Boolean => match parse_bool(trimmed) {
            Some(b) => col(name).fill_null(lit(b)),
            None => text_fill(name, value),
        },
        DataType::Date if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() => col(name)
            .fill_null(lit(trimmed.to_string()).cast(DataType::Date)),
        DataType::Datetime(..) if parse_datetime(trimmed).is_some() => col(name)
            .fill_null(lit(trimmed.to_string()).cast(dtype.clone())),
        _ => text_fill(name, value),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
