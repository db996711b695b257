#![allow(dead_code)]

use datakit::source::{LoadOptions, SourceFile};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Three rows of `A,B` with one missing `B`.
pub const SMALL_CSV: &str = "A,B\n1,2\n3,4\n5,\n";

pub fn source(name: &str, text: &str) -> SourceFile {
    SourceFile::new(name, text.as_bytes().to_vec())
}

pub fn small_dataset() -> DataFrame {
    datakit::source::load(&source("small.csv", SMALL_CSV), &LoadOptions::default()).unwrap()
}

/// Dataset with a `group` column: every fourth row is "a", the rest "b".
pub fn grouped_dataset(rows: usize) -> DataFrame {
    df!(
        "id" => (0..rows as i64).collect::<Vec<i64>>(),
        "group" => (0..rows).map(|i| if i % 4 == 0 { "a" } else { "b" }).collect::<Vec<&str>>(),
        "value" => (0..rows).map(|i| i as f64 * 0.5).collect::<Vec<f64>>()
    )
    .unwrap()
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn i64_values(df: &DataFrame, column: &str) -> Vec<Option<i64>> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

pub fn str_values(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}
