use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::error::DataError;

/// Shape, column names, types and missing counts of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicInfo {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub dtypes: Vec<String>,
    pub missing: Vec<usize>,
    pub estimated_size_bytes: usize,
}

impl BasicInfo {
    pub fn memory_mb(&self) -> f64 {
        self.estimated_size_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn missing_for(&self, column: &str) -> Option<usize> {
        self.column_names
            .iter()
            .position(|c| c == column)
            .map(|i| self.missing[i])
    }
}

pub fn basic_info(df: &DataFrame) -> BasicInfo {
    let columns = df.get_columns();
    BasicInfo {
        rows: df.height(),
        columns: df.width(),
        column_names: columns.iter().map(|c| c.name().to_string()).collect(),
        dtypes: columns.iter().map(|c| dtype_name(c.dtype())).collect(),
        missing: columns.iter().map(|c| c.null_count()).collect(),
        estimated_size_bytes: df.estimated_size(),
    }
}

/// Short type name shown to the user.
pub fn dtype_name(dtype: &DataType) -> String {
    match dtype {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => "integer".into(),
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            "unsigned integer".into()
        }
        DataType::Float32 | DataType::Float64 => "float".into(),
        DataType::String => "text".into(),
        DataType::Boolean => "boolean".into(),
        DataType::Date => "date".into(),
        DataType::Datetime(..) => "datetime".into(),
        DataType::Null => "empty".into(),
        other => other.to_string(),
    }
}

pub fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of the numeric columns among `columns`, in the given order.
pub fn numeric_columns(df: &DataFrame, columns: &[String]) -> Result<Vec<String>> {
    let mut numeric = Vec::new();
    for name in columns {
        if is_numeric_type(df.column(name)?.dtype()) {
            numeric.push(name.clone());
        }
    }
    Ok(numeric)
}

/// Non-null values of a numeric column as f64.
pub fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.iter().flatten().filter(|v| v.is_finite()).collect())
}

/// Same as [`numeric_values`], keeping nulls so rows stay aligned.
fn numeric_values_aligned(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.iter().collect())
}

/// Quantile of sorted values with linear interpolation between order statistics.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let weight = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub(crate) fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// One column of a describe table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// (label, value) rows in display order.
    pub fn rows(&self) -> [(&'static str, f64); 8] {
        [
            ("count", self.count as f64),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DescribeTable {
    pub columns: Vec<ColumnSummary>,
}

impl DescribeTable {
    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Aggregations for one describe column, aliased `<column>::<stat>`.
fn describe_exprs(name: &str) -> Vec<Expr> {
    let c = col(name).cast(DataType::Float64);
    let alias = |stat: &str| format!("{}::{}", name, stat);
    vec![
        c.clone().count().alias(alias("count")),
        c.clone().mean().alias(alias("mean")),
        c.clone().std(1).alias(alias("std")),
        c.clone().min().alias(alias("min")),
        c.clone()
            .quantile(lit(0.25), QuantileMethod::Linear)
            .alias(alias("q25")),
        c.clone()
            .quantile(lit(0.5), QuantileMethod::Linear)
            .alias(alias("median")),
        c.clone()
            .quantile(lit(0.75), QuantileMethod::Linear)
            .alias(alias("q75")),
        c.max().alias(alias("max")),
    ]
}

/// Summary statistics for the numeric columns among `columns`.
///
/// Non-numeric columns are skipped. An empty selection is an error.
/// Everything is computed in one lazy `select`; quartiles interpolate linearly.
pub fn describe(df: &DataFrame, columns: &[String]) -> Result<DescribeTable> {
    if columns.is_empty() {
        return Err(DataError::validation("Select at least one column").into());
    }
    let numeric = numeric_columns(df, columns)?;
    if numeric.is_empty() {
        return Ok(DescribeTable::default());
    }

    let exprs: Vec<Expr> = numeric.iter().flat_map(|name| describe_exprs(name)).collect();
    let row = df.clone().lazy().select(exprs).collect()?;
    // Null aggregates (empty or single-value columns) read as NaN
    let stat = |name: &str, key: &str| -> Result<f64> {
        let value = row.column(&format!("{}::{}", name, key))?.get(0)?;
        Ok(value.extract::<f64>().unwrap_or(f64::NAN))
    };

    let mut summaries = Vec::with_capacity(numeric.len());
    for name in numeric {
        summaries.push(ColumnSummary {
            count: stat(&name, "count")? as usize,
            mean: stat(&name, "mean")?,
            std: stat(&name, "std")?,
            min: stat(&name, "min")?,
            q25: stat(&name, "q25")?,
            median: stat(&name, "median")?,
            q75: stat(&name, "q75")?,
            max: stat(&name, "max")?,
            name,
        });
    }
    Ok(DescribeTable { columns: summaries })
}

/// Pearson correlation matrix over numeric columns. Symmetric with a unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.coefficients[i][j]
    }
}

/// Correlation over the numeric subset of `columns`.
///
/// Returns `None` when fewer than two numeric columns are selected. Each pair
/// uses only rows where both values are present.
pub fn correlation(df: &DataFrame, columns: &[String]) -> Result<Option<CorrelationMatrix>> {
    let numeric = numeric_columns(df, columns)?;
    if numeric.len() < 2 {
        return Ok(None);
    }

    let values = numeric
        .iter()
        .map(|name| numeric_values_aligned(df.column(name)?.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?;

    let n = numeric.len();
    let mut coefficients = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(&values[i], &values[j]);
            coefficients[i][j] = r;
            coefficients[j][i] = r;
        }
    }

    Ok(Some(CorrelationMatrix {
        columns: numeric,
        coefficients,
    }))
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip();

    if xs.len() < 2 {
        return f64::NAN;
    }

    let mean_x = mean(&xs);
    let mean_y = mean(&ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Null counts for `columns`. `None` when there is nothing missing.
pub fn missing_values(df: &DataFrame, columns: &[String]) -> Result<Option<Vec<(String, usize)>>> {
    let mut counts = Vec::with_capacity(columns.len());
    for name in columns {
        counts.push((name.clone(), df.column(name)?.null_count()));
    }
    if counts.iter().all(|(_, n)| *n == 0) {
        return Ok(None);
    }
    Ok(Some(counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_linear() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 0.5), 2.5);
        assert_eq!(quantile(&v, 0.25), 1.75);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_sample_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&v) - 2.138089935).abs() < 1e-6);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_pearson_ignores_incomplete_pairs() {
        let a = [Some(1.0), Some(2.0), None, Some(4.0)];
        let b = [Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_column() {
        let a = [Some(1.0), Some(1.0), Some(1.0)];
        let b = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&a, &b), 0.0);
    }

    #[test]
    fn test_describe_skips_text_columns() {
        let df = df!("n" => [1i64, 2, 3], "s" => ["a", "b", "c"]).unwrap();
        let table = describe(&df, &["n".to_string(), "s".to_string()]).unwrap();
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].name, "n");
        assert_eq!(table.columns[0].median, 2.0);
    }

    #[test]
    fn test_describe_quartiles_interpolate() {
        let df = df!("v" => [Some(4.0), None, Some(1.0), Some(3.0), Some(2.0)]).unwrap();
        let table = describe(&df, &["v".to_string()]).unwrap();
        let v = table.get("v").unwrap();
        assert_eq!(v.count, 4);
        assert!((v.q25 - 1.75).abs() < 1e-12);
        assert!((v.median - 2.5).abs() < 1e-12);
        assert!((v.q75 - 3.25).abs() < 1e-12);
        assert!((v.std - 1.290994449).abs() < 1e-6);
        assert_eq!((v.min, v.max), (1.0, 4.0));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let df = df!("v" => [7i64]).unwrap();
        let table = describe(&df, &["v".to_string()]).unwrap();
        assert_eq!(table.columns[0].count, 1);
        assert!(table.columns[0].std.is_nan());
        assert_eq!(table.columns[0].median, 7.0);
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(dtype_name(&DataType::Int64), "integer");
        assert_eq!(dtype_name(&DataType::String), "text");
        assert_eq!(dtype_name(&DataType::Float64), "float");
    }
}
