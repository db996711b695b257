//! Export form state and focus management.

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::{Path, PathBuf};

use crate::config::{ExportConfig, Theme};
use crate::export::{self, ExportFormat, ExportOptions};
use crate::source::{Separator, TextEncoding};
use crate::transform::Treatment;
use crate::upload_form::horizontal;
use crate::widgets::radio_block::cycle;
use crate::widgets::text_input::{TextInput, TextInputEvent};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExportFocus {
    #[default]
    Directory,
    FileName,
    Format,
    // CSV only
    Separator,
    Encoding,
    ExportButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    None,
    Export,
    /// Tab moved past the first or last field
    FocusOut { forward: bool },
}

pub struct ExportForm {
    pub focus: ExportFocus,
    pub dir_input: TextInput,
    pub name_input: TextInput,
    pub format: ExportFormat,
    pub separator: Separator,
    pub encoding: TextEncoding,
    /// Message after the last export
    pub status: Option<String>,
}

impl ExportForm {
    /// Form for exporting the result of `treatment`. The file name defaults to
    /// `<base>_<treatment>`; separator and encoding default to the session's.
    pub fn open(
        base: &str,
        treatment: Treatment,
        config: &ExportConfig,
        separator: Separator,
        encoding: TextEncoding,
        theme: &Theme,
    ) -> Self {
        let mut form = Self {
            focus: ExportFocus::Directory,
            dir_input: TextInput::new()
                .with_theme(theme)
                .with_value(config.output_dir.clone()),
            name_input: TextInput::new()
                .with_theme(theme)
                .with_value(export::output_stem(base, treatment)),
            format: config.format,
            separator,
            encoding,
            status: None,
        };
        form.sync_focus();
        form
    }

    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            format: self.format,
            separator: self.separator,
            encoding: self.encoding,
        }
    }

    /// Destination file. Creates the output directory.
    pub fn target_path(&self) -> Result<PathBuf> {
        let dir = self.dir_input.value().trim();
        let dir = (!dir.is_empty()).then(|| Path::new(dir));
        export::output_path(dir, self.name_input.value(), self.format)
    }

    pub fn wants_text(&self) -> bool {
        matches!(self.focus, ExportFocus::Directory | ExportFocus::FileName)
    }

    fn focus_order(&self) -> Vec<ExportFocus> {
        let mut order = vec![
            ExportFocus::Directory,
            ExportFocus::FileName,
            ExportFocus::Format,
        ];
        if self.format == ExportFormat::Csv {
            order.extend([ExportFocus::Separator, ExportFocus::Encoding]);
        }
        order.push(ExportFocus::ExportButton);
        order
    }

    /// Focus the first field (or the last one when entering backwards).
    pub fn enter(&mut self, forward: bool) {
        let order = self.focus_order();
        self.focus = if forward {
            order[0]
        } else {
            order[order.len() - 1]
        };
        self.sync_focus();
    }

    /// Unfocus both text fields.
    pub fn leave(&mut self) {
        self.dir_input.set_focused(false);
        self.name_input.set_focused(false);
    }

    fn sync_focus(&mut self) {
        self.dir_input
            .set_focused(self.focus == ExportFocus::Directory);
        self.name_input
            .set_focused(self.focus == ExportFocus::FileName);
    }

    fn move_focus(&mut self, forward: bool) -> ExportAction {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let at_edge = if forward {
            idx + 1 == order.len()
        } else {
            idx == 0
        };
        if at_edge {
            self.leave();
            return ExportAction::FocusOut { forward };
        }
        self.focus = order[cycle(idx, order.len(), forward)];
        self.sync_focus();
        ExportAction::None
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> ExportAction {
        match key.code {
            KeyCode::Tab => return self.move_focus(true),
            KeyCode::BackTab => return self.move_focus(false),
            _ => {}
        }
        match self.focus {
            ExportFocus::Directory | ExportFocus::FileName => {
                let input = if self.focus == ExportFocus::Directory {
                    &mut self.dir_input
                } else {
                    &mut self.name_input
                };
                match input.handle_key(key) {
                    TextInputEvent::Submit => self.move_focus(true),
                    _ => ExportAction::None,
                }
            }
            ExportFocus::Format => {
                if let Some(forward) = horizontal(key) {
                    let idx = cycle(self.format.index(), ExportFormat::ALL.len(), forward);
                    self.format = ExportFormat::ALL[idx];
                }
                ExportAction::None
            }
            ExportFocus::Separator => {
                if let Some(forward) = horizontal(key) {
                    let idx = cycle(self.separator.index(), Separator::ALL.len(), forward);
                    self.separator = Separator::ALL[idx];
                }
                ExportAction::None
            }
            ExportFocus::Encoding => {
                if let Some(forward) = horizontal(key) {
                    let idx = cycle(self.encoding.index(), TextEncoding::ALL.len(), forward);
                    self.encoding = TextEncoding::ALL[idx];
                }
                ExportAction::None
            }
            ExportFocus::ExportButton if key.code == KeyCode::Enter => ExportAction::Export,
            ExportFocus::ExportButton => ExportAction::None,
        }
    }
}
