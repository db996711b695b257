//! Transform screen state: treatment selector, one form per treatment, and
//! the export form shown once a treatment has been applied.

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use polars::prelude::DataFrame;

use crate::config::{SamplingConfig, Theme};
use crate::error::DataError;
use crate::export_form::{ExportAction, ExportForm};
use crate::session::Command;
use crate::transform::{self, FillMethod, SampleRequest, SampleSize, SamplingMethod, Treatment};
use crate::upload_form::horizontal;
use crate::widgets::checklist::ChecklistState;
use crate::widgets::radio_block::cycle;
use crate::widgets::text_input::{TextInput, TextInputEvent};

pub const SAMPLING_METHODS: [&str; 4] = ["Random", "Stratified", "First rows", "Last rows"];
pub const SAMPLE_SIZE_KINDS: [&str; 2] = ["Rows", "Percentage"];
pub const FILL_METHODS: [&str; 6] = ["0", "mean", "median", "ffill", "bfill", "custom"];

const RANDOM: usize = 0;
const STRATIFIED: usize = 1;
const FIRST_ROWS: usize = 2;
const LAST_ROWS: usize = 3;
const CUSTOM_FILL: usize = 5;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TransformFocus {
    #[default]
    Treatment,
    // sampling
    Method,
    SizeKind,
    Size,
    StrataColumn,
    // renaming
    RenameList,
    // filling
    FillColumns,
    FillMethod,
    CustomValue,
    Apply,
    /// Keys go to the export form
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformAction {
    None,
    Apply,
    Export,
}

pub struct TransformForm {
    pub focus: TransformFocus,
    pub treatment: Treatment,
    // sampling
    pub method: usize,
    pub by_percentage: bool,
    pub rows_input: TextInput,
    pub percentage_input: TextInput,
    pub strata_column: usize,
    // renaming: (current name, new name)
    pub renames: Vec<(String, TextInput)>,
    pub rename_cursor: usize,
    // filling
    pub fill_columns: Vec<(String, bool)>,
    pub fill_cursor: ChecklistState,
    pub fill_method: usize,
    pub custom_input: TextInput,
    /// Treatment whose result is the current dataset
    pub applied: Option<Treatment>,
    pub export: Option<ExportForm>,
    columns: Vec<String>,
    height: usize,
}

impl TransformForm {
    /// Fresh forms for `df`. Row count defaults to `min(default_rows, height)`;
    /// fill targets default to the columns that contain nulls.
    pub fn new(df: &DataFrame, sampling: &SamplingConfig, theme: &Theme) -> Self {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let with_nulls = transform::columns_with_nulls(df);
        let height = df.height();
        let mut form = Self {
            focus: TransformFocus::Treatment,
            treatment: Treatment::Sampling,
            method: RANDOM,
            by_percentage: false,
            rows_input: TextInput::new()
                .with_theme(theme)
                .with_value(sampling.default_rows.min(height).to_string()),
            percentage_input: TextInput::new()
                .with_theme(theme)
                .with_value(sampling.default_percentage.min(100).to_string()),
            strata_column: 0,
            renames: columns
                .iter()
                .map(|c| (c.clone(), TextInput::new().with_theme(theme)))
                .collect(),
            rename_cursor: 0,
            fill_columns: columns
                .iter()
                .map(|c| (c.clone(), with_nulls.contains(c)))
                .collect(),
            fill_cursor: ChecklistState::default(),
            fill_method: 0,
            custom_input: TextInput::new().with_theme(theme),
            applied: None,
            export: None,
            columns,
            height,
        };
        form.sync_focus();
        form
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_stratified(&self) -> bool {
        self.method == STRATIFIED
    }

    pub fn is_first_or_last(&self) -> bool {
        self.method > STRATIFIED
    }

    pub fn is_custom_fill(&self) -> bool {
        self.fill_method == CUSTOM_FILL
    }

    pub fn wants_text(&self) -> bool {
        match self.focus {
            TransformFocus::Size | TransformFocus::RenameList | TransformFocus::CustomValue => {
                true
            }
            TransformFocus::Export => self.export.as_ref().is_some_and(|e| e.wants_text()),
            _ => false,
        }
    }

    fn focus_order(&self) -> Vec<TransformFocus> {
        let mut order = vec![TransformFocus::Treatment];
        match self.treatment {
            Treatment::Sampling => {
                order.push(TransformFocus::Method);
                if !self.is_first_or_last() {
                    order.push(TransformFocus::SizeKind);
                }
                order.push(TransformFocus::Size);
                if self.method == STRATIFIED {
                    order.push(TransformFocus::StrataColumn);
                }
            }
            Treatment::Renaming => order.push(TransformFocus::RenameList),
            Treatment::Filling => {
                order.extend([TransformFocus::FillColumns, TransformFocus::FillMethod]);
                if self.is_custom_fill() {
                    order.push(TransformFocus::CustomValue);
                }
            }
        }
        order.push(TransformFocus::Apply);
        if self.export.is_some() {
            order.push(TransformFocus::Export);
        }
        order
    }

    fn sync_focus(&mut self) {
        let size_focused = self.focus == TransformFocus::Size;
        self.rows_input
            .set_focused(size_focused && !self.uses_percentage());
        self.percentage_input
            .set_focused(size_focused && self.uses_percentage());
        for (i, (_, input)) in self.renames.iter_mut().enumerate() {
            input.set_focused(self.focus == TransformFocus::RenameList && i == self.rename_cursor);
        }
        self.custom_input
            .set_focused(self.focus == TransformFocus::CustomValue);
    }

    fn move_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[cycle(idx, order.len(), forward)];
        if self.focus == TransformFocus::Export {
            if let Some(export) = &mut self.export {
                export.enter(forward);
            }
        }
        self.sync_focus();
    }

    fn uses_percentage(&self) -> bool {
        self.by_percentage && !self.is_first_or_last()
    }

    /// Validate the form and build the command for the selected treatment.
    pub fn build_command(&self) -> Result<Command> {
        match self.treatment {
            Treatment::Sampling => {
                let size = if self.uses_percentage() {
                    let pct: f64 = self
                        .percentage_input
                        .value()
                        .trim()
                        .parse()
                        .map_err(|_| DataError::validation("Percentage must be a number"))?;
                    if !(0.0..=100.0).contains(&pct) {
                        return Err(
                            DataError::validation("Percentage must be between 0 and 100").into()
                        );
                    }
                    SampleSize::Fraction(pct / 100.0)
                } else {
                    let rows: usize = self.rows_input.value().trim().parse().map_err(|_| {
                        DataError::validation("Number of rows must be a whole number")
                    })?;
                    if rows == 0 {
                        return Err(
                            DataError::validation("Number of rows must be at least 1").into()
                        );
                    }
                    SampleSize::Rows(rows.min(self.height))
                };
                let method = match self.method {
                    RANDOM => SamplingMethod::Random,
                    STRATIFIED => SamplingMethod::Stratified {
                        column: self
                            .columns
                            .get(self.strata_column)
                            .cloned()
                            .ok_or_else(|| {
                                DataError::validation("Choose a column to stratify by")
                            })?,
                    },
                    FIRST_ROWS => SamplingMethod::FirstRows,
                    LAST_ROWS => SamplingMethod::LastRows,
                    other => {
                        return Err(DataError::validation(format!(
                            "Unknown sampling method {}",
                            other
                        ))
                        .into())
                    }
                };
                Ok(Command::Sample(SampleRequest::new(method, size)))
            }
            Treatment::Renaming => {
                let mapping: Vec<(String, String)> = self
                    .renames
                    .iter()
                    .filter_map(|(old, input)| {
                        let new = input.value().trim();
                        (!new.is_empty() && new != old).then(|| (old.clone(), new.to_string()))
                    })
                    .collect();
                if mapping.is_empty() {
                    return Err(
                        DataError::validation("Enter a new name for at least one column").into(),
                    );
                }
                Ok(Command::Rename(mapping))
            }
            Treatment::Filling => {
                let columns: Vec<String> = self
                    .fill_columns
                    .iter()
                    .filter(|(_, on)| *on)
                    .map(|(c, _)| c.clone())
                    .collect();
                let method = match self.fill_method {
                    0 => FillMethod::Zero,
                    1 => FillMethod::Mean,
                    2 => FillMethod::Median,
                    3 => FillMethod::ForwardFill,
                    4 => FillMethod::BackwardFill,
                    _ => FillMethod::Custom(self.custom_input.value().to_string()),
                };
                Ok(Command::Fill { columns, method })
            }
        }
    }

    /// Show the export form for the treatment just applied, and rebuild the
    /// column-dependent fields for the new dataset.
    pub fn applied(&mut self, df: &DataFrame, export: ExportForm, theme: &Theme) {
        let treatment = self.treatment;
        let method = self.method;
        let by_percentage = self.by_percentage;
        let fill_method = self.fill_method;
        let rows = self.rows_input.value().to_string();
        let pct = self.percentage_input.value().to_string();
        *self = Self::new(
            df,
            &SamplingConfig {
                default_rows: 0,
                default_percentage: 0,
            },
            theme,
        );
        self.treatment = treatment;
        self.method = method;
        self.by_percentage = by_percentage;
        self.fill_method = fill_method;
        self.rows_input.set_value(rows);
        self.percentage_input.set_value(pct);
        self.applied = Some(treatment);
        self.export = Some(export);
        self.focus = TransformFocus::Export;
        if let Some(export) = &mut self.export {
            export.enter(true);
        }
        self.sync_focus();
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> TransformAction {
        if self.focus == TransformFocus::Export {
            let Some(export) = &mut self.export else {
                self.focus = TransformFocus::Treatment;
                return TransformAction::None;
            };
            return match export.handle_key(key) {
                ExportAction::Export => TransformAction::Export,
                ExportAction::FocusOut { forward } => {
                    self.move_focus(forward);
                    TransformAction::None
                }
                ExportAction::None => TransformAction::None,
            };
        }

        match key.code {
            KeyCode::Tab => {
                self.move_focus(true);
                return TransformAction::None;
            }
            KeyCode::BackTab => {
                self.move_focus(false);
                return TransformAction::None;
            }
            _ => {}
        }

        match self.focus {
            TransformFocus::Treatment => {
                if let Some(forward) = horizontal(key) {
                    let idx = Treatment::ALL
                        .iter()
                        .position(|t| *t == self.treatment)
                        .unwrap_or(0);
                    self.treatment = Treatment::ALL[cycle(idx, Treatment::ALL.len(), forward)];
                }
            }
            TransformFocus::Method => {
                if let Some(forward) = horizontal(key) {
                    self.method = cycle(self.method, SAMPLING_METHODS.len(), forward);
                }
            }
            TransformFocus::SizeKind => {
                if horizontal(key).is_some() {
                    self.by_percentage = !self.by_percentage;
                }
            }
            TransformFocus::Size => {
                let input = if self.uses_percentage() {
                    &mut self.percentage_input
                } else {
                    &mut self.rows_input
                };
                if input.handle_key(key) == TextInputEvent::Submit {
                    return TransformAction::Apply;
                }
            }
            TransformFocus::StrataColumn => {
                if let Some(forward) = horizontal(key) {
                    self.strata_column = cycle(self.strata_column, self.columns.len(), forward);
                }
            }
            TransformFocus::RenameList => match key.code {
                KeyCode::Down => {
                    self.rename_cursor =
                        (self.rename_cursor + 1).min(self.renames.len().saturating_sub(1));
                    self.sync_focus();
                }
                KeyCode::Up => {
                    self.rename_cursor = self.rename_cursor.saturating_sub(1);
                    self.sync_focus();
                }
                _ => {
                    if let Some((_, input)) = self.renames.get_mut(self.rename_cursor) {
                        if input.handle_key(key) == TextInputEvent::Submit {
                            return TransformAction::Apply;
                        }
                    }
                }
            },
            TransformFocus::FillColumns => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    self.fill_cursor.next(self.fill_columns.len())
                }
                KeyCode::Up | KeyCode::Char('k') => self.fill_cursor.previous(),
                KeyCode::Char(' ') => {
                    if let Some(entry) = self.fill_columns.get_mut(self.fill_cursor.cursor) {
                        entry.1 = !entry.1;
                    }
                }
                KeyCode::Char('a') => {
                    let all = self.fill_columns.iter().all(|(_, on)| *on);
                    for entry in &mut self.fill_columns {
                        entry.1 = !all;
                    }
                }
                _ => {}
            },
            TransformFocus::FillMethod => {
                if let Some(forward) = horizontal(key) {
                    self.fill_method = cycle(self.fill_method, FILL_METHODS.len(), forward);
                }
            }
            TransformFocus::CustomValue => {
                if self.custom_input.handle_key(key) == TextInputEvent::Submit {
                    return TransformAction::Apply;
                }
            }
            TransformFocus::Apply if key.code == KeyCode::Enter => return TransformAction::Apply,
            TransformFocus::Apply | TransformFocus::Export => {}
        }
        self.sync_focus();
        TransformAction::None
    }
}
