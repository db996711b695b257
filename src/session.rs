//! Session state and the commands that change it.
//!
//! The UI never mutates [`SessionState`] directly: every user action is a
//! [`Command`] passed to [`SessionState::apply`], which either succeeds and
//! returns an [`Outcome`] to display, or fails and leaves the state untouched.

use color_eyre::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::analysis::{self, AnalysisKind, AnalysisReport, AnalysisSelection};
use crate::config::AnalysisConfig;
use crate::error::DataError;
use crate::export::{self, ExportOptions};
use crate::source::{self, FileKind, LoadOptions, Separator, SourceFile, TextEncoding};
use crate::statistics::{self, BasicInfo};
use crate::transform::{self, FillMethod, SampleRequest, Treatment};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    None,
    Explore,
    Transform,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "Overview",
            Self::Explore => "Explore",
            Self::Transform => "Transform",
        }
    }
}

/// Per-column inclusion flags, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection(Vec<(String, bool)>);

impl ColumnSelection {
    /// Every column of `df`, all selected.
    pub fn for_dataset(df: &DataFrame) -> Self {
        Self(
            df.get_column_names()
                .iter()
                .map(|n| (n.to_string(), true))
                .collect(),
        )
    }

    /// Rebuild for a new dataset, keeping flags of columns that still exist.
    pub fn carried_over(&self, df: &DataFrame) -> Self {
        Self(
            df.get_column_names()
                .iter()
                .map(|n| {
                    let name = n.to_string();
                    let flag = self.is_selected(&name).unwrap_or(true);
                    (name, flag)
                })
                .collect(),
        )
    }

    pub fn set(&mut self, name: &str, selected: bool) -> Result<()> {
        let entry = self
            .0
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| DataError::validation(format!("Unknown column '{}'", name)))?;
        entry.1 = selected;
        Ok(())
    }

    pub fn set_all(&mut self, selected: bool) {
        for entry in &mut self.0 {
            entry.1 = selected;
        }
    }

    pub fn is_selected(&self, name: &str) -> Option<bool> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn selected(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, s)| *s)
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A user action.
#[derive(Debug, Clone)]
pub enum Command {
    Load {
        source: SourceFile,
        options: LoadOptions,
    },
    /// Replace the dataset with the last exported file
    ContinueFromLastExport,
    SetMode(Mode),
    SetColumn {
        name: String,
        selected: bool,
    },
    SetAllColumns(bool),
    SetAnalysis {
        kind: AnalysisKind,
        enabled: bool,
    },
    RunAnalyses(AnalysisConfig),
    Sample(SampleRequest),
    Rename(Vec<(String, String)>),
    Fill {
        columns: Vec<String>,
        method: FillMethod,
    },
    Export {
        path: PathBuf,
        options: ExportOptions,
    },
    Reset,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::ContinueFromLastExport => "continue_from_last_export",
            Self::SetMode(_) => "set_mode",
            Self::SetColumn { .. } => "set_column",
            Self::SetAllColumns(_) => "set_all_columns",
            Self::SetAnalysis { .. } => "set_analysis",
            Self::RunAnalyses(_) => "run_analyses",
            Self::Sample(_) => "sample",
            Self::Rename(_) => "rename",
            Self::Fill { .. } => "fill",
            Self::Export { .. } => "export",
            Self::Reset => "reset",
        }
    }
}

/// What a successful command produced, for display.
#[derive(Debug, Clone)]
pub enum Outcome {
    Loaded(BasicInfo),
    ModeChanged(Mode),
    SelectionChanged,
    Report(Box<AnalysisReport>),
    Transformed {
        treatment: Treatment,
        info: BasicInfo,
    },
    Exported(PathBuf),
    Reset,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(skip)]
    pub dataset: Option<DataFrame>,
    pub encoding: TextEncoding,
    /// None unless the dataset came from delimited text
    pub separator: Option<Separator>,
    pub loaded: bool,
    pub columns: ColumnSelection,
    pub analyses: AnalysisSelection,
    pub mode: Mode,
    pub last_export: Option<PathBuf>,
    /// Options the last export was written with, reused to read it back
    pub last_export_options: Option<ExportOptions>,
    pub source_name: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&DataFrame> {
        self.dataset.as_ref()
    }

    pub fn basic_info(&self) -> Option<BasicInfo> {
        self.dataset.as_ref().map(statistics::basic_info)
    }

    /// Base for the next output file name.
    pub fn default_output_base(&self) -> String {
        export::default_output_base(self.last_export.as_deref(), self.source_name.as_deref())
    }

    /// JSON view of the session for debug logging. The dataset itself is summarized.
    pub fn snapshot_json(&self) -> String {
        let value = serde_json::json!({
            "state": self,
            "dataset": self.basic_info().map(|i| (i.rows, i.columns)),
        });
        value.to_string()
    }

    /// Apply a command. On error the state is left exactly as it was.
    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        let name = command.name();
        let mut next = self.clone();
        let outcome = next.apply_in_place(command)?;
        *self = next;
        debug!(command = name, "command applied");
        Ok(outcome)
    }

    fn require_dataset(&self) -> Result<&DataFrame> {
        Ok(self
            .dataset
            .as_ref()
            .ok_or_else(|| DataError::validation("Load a file first"))?)
    }

    fn replace_dataset(&mut self, df: DataFrame, treatment: Treatment) -> Outcome {
        self.columns = self.columns.carried_over(&df);
        let info = statistics::basic_info(&df);
        info!(
            treatment = treatment.suffix(),
            rows = info.rows,
            columns = info.columns,
            "dataset replaced"
        );
        self.dataset = Some(df);
        Outcome::Transformed { treatment, info }
    }

    fn apply_in_place(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Load { source, options } => {
                if self.loaded {
                    return Err(DataError::validation(
                        "A file is already loaded. Reset the session to load another one.",
                    )
                    .into());
                }
                let kind = source.kind()?;
                let df = source::load(&source, &options)?;
                self.encoding = options.encoding;
                self.separator = (kind == FileKind::Csv).then_some(options.separator);
                self.source_name = Some(source.name);
                self.columns = ColumnSelection::for_dataset(&df);
                self.analyses = AnalysisSelection::default();
                self.mode = Mode::None;
                self.loaded = true;
                let info = statistics::basic_info(&df);
                self.dataset = Some(df);
                Ok(Outcome::Loaded(info))
            }
            Command::ContinueFromLastExport => {
                let path = self.last_export.clone().ok_or_else(|| {
                    DataError::validation("No file has been generated in this session yet")
                })?;
                let options = match self.last_export_options {
                    Some(o) => LoadOptions::new(o.encoding, o.separator),
                    None => LoadOptions::new(self.encoding, self.separator.unwrap_or_default()),
                };
                let df = source::load_path(&path, &options)?;
                let is_csv = FileKind::from_path(&path) == Some(FileKind::Csv);
                self.encoding = options.encoding;
                self.separator = is_csv.then_some(options.separator);
                self.columns = ColumnSelection::for_dataset(&df);
                self.loaded = true;
                let info = statistics::basic_info(&df);
                self.dataset = Some(df);
                Ok(Outcome::Loaded(info))
            }
            Command::SetMode(mode) => {
                if mode != Mode::None {
                    self.require_dataset()?;
                }
                self.mode = mode;
                Ok(Outcome::ModeChanged(mode))
            }
            Command::SetColumn { name, selected } => {
                self.columns.set(&name, selected)?;
                Ok(Outcome::SelectionChanged)
            }
            Command::SetAllColumns(selected) => {
                self.columns.set_all(selected);
                Ok(Outcome::SelectionChanged)
            }
            Command::SetAnalysis { kind, enabled } => {
                self.analyses.set(kind, enabled);
                Ok(Outcome::SelectionChanged)
            }
            Command::RunAnalyses(config) => {
                let df = self.require_dataset()?;
                let report = analysis::run(df, &self.columns.selected(), &self.analyses, &config)?;
                Ok(Outcome::Report(Box::new(report)))
            }
            Command::Sample(request) => {
                let df = transform::sample(self.require_dataset()?, &request)?;
                Ok(self.replace_dataset(df, Treatment::Sampling))
            }
            Command::Rename(mapping) => {
                let df = transform::rename(self.require_dataset()?, &mapping)?;
                Ok(self.replace_dataset(df, Treatment::Renaming))
            }
            Command::Fill { columns, method } => {
                let df = transform::fill(self.require_dataset()?, &columns, &method)?;
                Ok(self.replace_dataset(df, Treatment::Filling))
            }
            Command::Export { path, options } => {
                export::export(self.require_dataset()?, &path, &options)?;
                self.last_export = Some(path.clone());
                self.last_export_options = Some(options);
                Ok(Outcome::Exported(path))
            }
            Command::Reset => {
                *self = SessionState::default();
                info!("session reset");
                Ok(Outcome::Reset)
            }
        }
    }
}
