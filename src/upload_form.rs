//! Upload screen state: path, encoding and separator choices, preview.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{FileLoadingConfig, Theme};
use crate::source::{self, FileKind, LoadOptions, Separator, SourceFile, TextEncoding};
use crate::widgets::radio_block::cycle;
use crate::widgets::text_input::{TextInput, TextInputEvent};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UploadFocus {
    #[default]
    Path,
    Encoding,
    Separator,
    Preview,
    Load,
}

/// What the app should do after a key press on the upload screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    None,
    /// Path confirmed: read the file and sniff its encoding
    Open,
    Preview,
    Load,
}

pub struct UploadForm {
    pub focus: UploadFocus,
    pub path_input: TextInput,
    pub encoding: TextEncoding,
    /// Sniffed encoding of the current file, shown as a hint
    pub detected: Option<TextEncoding>,
    pub separator: Separator,
    pub preview: Option<DataFrame>,
    source: Option<(PathBuf, SourceFile)>,
    forced_encoding: Option<TextEncoding>,
    infer_schema_length: Option<usize>,
}

impl UploadForm {
    pub fn new(theme: &Theme, defaults: &FileLoadingConfig) -> Self {
        let mut path_input = TextInput::new().with_theme(theme);
        path_input.set_focused(true);
        Self {
            focus: UploadFocus::Path,
            path_input,
            encoding: defaults.encoding.unwrap_or_default(),
            detected: None,
            separator: defaults.separator.unwrap_or_default(),
            preview: None,
            source: None,
            forced_encoding: defaults.encoding,
            infer_schema_length: defaults.infer_schema_length,
        }
    }

    pub fn path(&self) -> PathBuf {
        source::expand_path(self.path_input.value().trim())
    }

    pub fn set_path(&mut self, path: &Path) {
        self.path_input.set_value(path.display().to_string());
        self.preview = None;
    }

    /// True unless the path names a spreadsheet. Unknown extensions show the CSV options.
    pub fn is_csv(&self) -> bool {
        FileKind::from_path(&self.path()) != Some(FileKind::Xlsx)
    }

    /// Read the file at the current path, reusing the last read when the path is unchanged.
    pub fn source(&mut self) -> Result<&SourceFile> {
        let path = self.path();
        let stale = self.source.as_ref().map(|(p, _)| p != &path).unwrap_or(true);
        if stale {
            let file = SourceFile::read(&path)?;
            self.source = Some((path, file));
        }
        self.source
            .as_ref()
            .map(|(_, file)| file)
            .ok_or_else(|| eyre!("No file selected"))
    }

    /// Read the file and pre-select its sniffed encoding, unless one is forced.
    pub fn open(&mut self) -> Result<()> {
        self.preview = None;
        let detected = source::sniff_encoding(&self.source()?.bytes);
        debug!(encoding = detected.label(), "sniffed encoding");
        self.detected = Some(detected);
        self.encoding = self.forced_encoding.unwrap_or(detected);
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            infer_schema_length: self.infer_schema_length,
            ..LoadOptions::new(self.encoding, self.separator)
        }
    }

    /// First rows under the current choices. Does not touch the session.
    pub fn run_preview(&mut self) -> Result<()> {
        let options = self.load_options();
        let df = source::preview(self.source()?, &options)?;
        self.preview = Some(df);
        Ok(())
    }

    fn focus_order(&self) -> Vec<UploadFocus> {
        let mut order = vec![UploadFocus::Path];
        if self.is_csv() {
            order.extend([UploadFocus::Encoding, UploadFocus::Separator]);
        }
        order.extend([UploadFocus::Preview, UploadFocus::Load]);
        order
    }

    fn move_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[cycle(idx, order.len(), forward)];
        self.path_input.set_focused(self.focus == UploadFocus::Path);
    }

    /// True while typed characters belong to the path field.
    pub fn wants_text(&self) -> bool {
        self.focus == UploadFocus::Path
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> UploadAction {
        match key.code {
            KeyCode::Tab => {
                let leaving_path = self.focus == UploadFocus::Path;
                self.move_focus(true);
                return if leaving_path {
                    UploadAction::Open
                } else {
                    UploadAction::None
                };
            }
            KeyCode::BackTab => {
                self.move_focus(false);
                return UploadAction::None;
            }
            _ => {}
        }

        match self.focus {
            UploadFocus::Path => match self.path_input.handle_key(key) {
                TextInputEvent::Submit => {
                    self.move_focus(true);
                    UploadAction::Open
                }
                TextInputEvent::Changed => {
                    self.preview = None;
                    self.detected = None;
                    UploadAction::None
                }
                _ => UploadAction::None,
            },
            UploadFocus::Encoding => {
                if let Some(forward) = horizontal(key) {
                    let idx = cycle(self.encoding.index(), TextEncoding::ALL.len(), forward);
                    self.encoding = TextEncoding::ALL[idx];
                    self.preview = None;
                }
                UploadAction::None
            }
            UploadFocus::Separator => {
                if let Some(forward) = horizontal(key) {
                    let idx = cycle(self.separator.index(), Separator::ALL.len(), forward);
                    self.separator = Separator::ALL[idx];
                    self.preview = None;
                }
                UploadAction::None
            }
            UploadFocus::Preview if key.code == KeyCode::Enter => UploadAction::Preview,
            UploadFocus::Load if key.code == KeyCode::Enter => UploadAction::Load,
            _ => UploadAction::None,
        }
    }
}

/// Left/Right (or h/l) as a direction for radio selectors.
pub(crate) fn horizontal(key: &KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => Some(true),
        KeyCode::Left | KeyCode::Char('h') => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::io::Write;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn form() -> UploadForm {
        UploadForm::new(&Theme::default(), &FileLoadingConfig::default())
    }

    #[test]
    fn test_xlsx_path_skips_csv_options() {
        let mut form = form();
        form.set_path(Path::new("book.xlsx"));
        form.focus = UploadFocus::Preview;
        form.handle_key(&key(KeyCode::BackTab));
        assert_eq!(form.focus, UploadFocus::Path);
        form.set_path(Path::new("data.csv"));
        form.focus = UploadFocus::Preview;
        form.handle_key(&key(KeyCode::BackTab));
        assert_eq!(form.focus, UploadFocus::Separator);
    }

    #[test]
    fn test_open_sniffs_and_preview_reads_five_rows() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"\xEF\xBB\xBFn\n1\n2\n3\n4\n5\n6\n7\n").unwrap();
        let mut form = form();
        form.set_path(file.path());
        form.open().unwrap();
        assert_eq!(form.detected, Some(TextEncoding::Utf8Sig));
        assert_eq!(form.encoding, TextEncoding::Utf8Sig);
        form.run_preview().unwrap();
        assert_eq!(form.preview.as_ref().map(|df| df.height()), Some(5));
    }

    #[test]
    fn test_forced_encoding_wins_over_sniffing() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"a\n1\n").unwrap();
        let defaults = FileLoadingConfig {
            encoding: Some(TextEncoding::Latin1),
            ..FileLoadingConfig::default()
        };
        let mut form = UploadForm::new(&Theme::default(), &defaults);
        form.set_path(file.path());
        form.open().unwrap();
        assert_eq!(form.detected, Some(TextEncoding::Utf8));
        assert_eq!(form.encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_separator_cycles() {
        let mut form = form();
        form.set_path(Path::new("x.csv"));
        form.focus = UploadFocus::Separator;
        form.handle_key(&key(KeyCode::Right));
        assert_eq!(form.separator, Separator::Semicolon);
        form.handle_key(&key(KeyCode::Left));
        form.handle_key(&key(KeyCode::Left));
        assert_eq!(form.separator, Separator::Pipe);
    }
}
