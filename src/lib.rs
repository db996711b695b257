use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, error, info};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub mod analysis;
pub mod chart_data;
pub mod chart_export;
pub mod config;
pub mod error;
pub mod error_display;
pub mod explore_view;
pub mod export;
pub mod export_form;
pub mod logging;
pub mod session;
pub mod source;
pub mod statistics;
pub mod transform;
pub mod transform_form;
pub mod upload_form;
pub mod widgets;

pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use datakit_cli::Args;
pub use error::DataError;
pub use session::{Command, Mode, Outcome, SessionState};

use chart_export::ChartExportFormat;
use error_display::{error_kind, user_message_from_report};
use explore_view::{ExploreAction, ExploreView};
use export_form::ExportForm;
use transform_form::{TransformAction, TransformForm};
use upload_form::{UploadAction, UploadForm};
use widgets::controls::Controls;
use widgets::overview::{MenuItem, OverviewView};

/// Application name used for config, log and other app-specific paths
pub const APP_NAME: &str = "datakit";

/// Name shown in the header and help overlay
pub const APP_DISPLAY_NAME: &str = "Data Toolkit";

/// Subdirectory of the output directory that saved charts go to
pub const CHARTS_DIR: &str = "charts";

#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Select a file on the upload screen and sniff its encoding
    Open(PathBuf),
    Exit,
    Crash(String),
    Resize(u16, u16),
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Upload,
    Overview,
    Explore,
    Transform,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Overview => Mode::None.label(),
            Self::Explore => Mode::Explore.label(),
            Self::Transform => Mode::Transform.label(),
        }
    }
}

pub struct App {
    events: Sender<AppEvent>,
    config: AppConfig,
    theme: Theme,
    debug: bool,
    pub session: SessionState,
    pub error_modal: ErrorModal,
    pub show_help: bool,
    pub upload: UploadForm,
    pub overview_cursor: usize,
    pub explore: ExploreView,
    pub transform: Option<TransformForm>,
    /// Result of the last successful action, shown above the controls
    pub status: Option<String>,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        Self::new_with_config(events, Theme::default(), AppConfig::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, config: AppConfig) -> App {
        let debug = config.debug.enabled;
        App {
            upload: UploadForm::new(&theme, &config.file_loading),
            events,
            config,
            theme,
            debug,
            session: SessionState::new(),
            error_modal: ErrorModal::new(),
            show_help: false,
            overview_cursor: 0,
            explore: ExploreView::new(),
            transform: None,
            status: None,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn enable_debug(&mut self) {
        self.debug = true;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a color from the theme
    fn color(&self, name: &str) -> ratatui::style::Color {
        self.theme.get(name)
    }

    pub fn screen(&self) -> Screen {
        if !self.session.loaded {
            return Screen::Upload;
        }
        match self.session.mode {
            Mode::None => Screen::Overview,
            Mode::Explore => Screen::Explore,
            Mode::Transform => Screen::Transform,
        }
    }

    /// Log a failed action and show it to the user. The session is unchanged.
    fn report_error(&mut self, action: &str, err: &color_eyre::Report) {
        error!(
            action,
            kind = error_kind(err),
            error = %format!("{:#}", err),
            "action failed"
        );
        self.error_modal.show(user_message_from_report(err));
    }

    /// Apply a command to the session and update the views from its outcome.
    pub fn dispatch(&mut self, command: Command) -> Option<Outcome> {
        let name = command.name();
        match self.session.apply(command) {
            Ok(outcome) => {
                if self.debug {
                    debug!(
                        command = name,
                        snapshot = %self.session.snapshot_json(),
                        "session state"
                    );
                }
                self.after(&outcome);
                Some(outcome)
            }
            Err(e) => {
                self.report_error(name, &e);
                None
            }
        }
    }

    fn after(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Loaded(info) => {
                self.explore.clear();
                self.transform = None;
                self.overview_cursor = 0;
                self.status = Some(format!(
                    "Loaded {} rows x {} columns",
                    info.rows, info.columns
                ));
            }
            Outcome::ModeChanged(Mode::Transform) => {
                self.transform = self
                    .session
                    .dataset()
                    .map(|df| TransformForm::new(df, &self.config.sampling, &self.theme));
            }
            Outcome::ModeChanged(_) | Outcome::SelectionChanged => {}
            Outcome::Report(report) => {
                self.explore.set_report(report.as_ref().clone());
            }
            Outcome::Transformed { treatment, info } => {
                self.status = Some(format!(
                    "{} applied: {} rows x {} columns",
                    treatment.label(),
                    info.rows,
                    info.columns
                ));
                let export = ExportForm::open(
                    &self.session.default_output_base(),
                    *treatment,
                    &self.config.export,
                    self.export_separator(),
                    self.session.encoding,
                    &self.theme,
                );
                if let (Some(form), Some(df)) = (self.transform.as_mut(), self.session.dataset()) {
                    form.applied(df, export, &self.theme);
                }
            }
            Outcome::Exported(path) => {
                let message = format!("Saved to {}", path.display());
                if let Some(export) = self.transform.as_mut().and_then(|t| t.export.as_mut()) {
                    export.status = Some(message.clone());
                }
                self.status = Some(message);
            }
            Outcome::Reset => {
                let path = self.upload.path_input.value().to_string();
                self.upload = UploadForm::new(&self.theme, &self.config.file_loading);
                self.upload.path_input.set_value(path);
                self.explore.clear();
                self.transform = None;
                self.overview_cursor = 0;
                self.status = Some("Session reset".to_string());
            }
        }
    }

    /// Separator for new exports: the one the data was read with, else the configured default.
    fn export_separator(&self) -> source::Separator {
        self.session
            .separator
            .or(self.config.file_loading.separator)
            .unwrap_or_default()
    }

    fn wants_text(&self) -> bool {
        match self.screen() {
            Screen::Upload => self.upload.wants_text(),
            Screen::Transform => self.transform.as_ref().is_some_and(|t| t.wants_text()),
            Screen::Overview | Screen::Explore => false,
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        // Error modal has highest priority
        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        if self.show_help {
            if matches!(
                event.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return None;
        }

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('c') if ctrl => return Some(AppEvent::Exit),
            KeyCode::Char('r') if ctrl => {
                self.dispatch(Command::Reset);
                return None;
            }
            KeyCode::F(1) => {
                self.show_help = true;
                return None;
            }
            KeyCode::Char('q') if !self.wants_text() => return Some(AppEvent::Exit),
            KeyCode::Char('?') if !self.wants_text() => {
                self.show_help = true;
                return None;
            }
            KeyCode::Esc if matches!(self.screen(), Screen::Explore | Screen::Transform) => {
                self.dispatch(Command::SetMode(Mode::None));
                return None;
            }
            _ => {}
        }

        match self.screen() {
            Screen::Upload => self.upload_key(event),
            Screen::Overview => self.overview_key(event),
            Screen::Explore => self.explore_key(event),
            Screen::Transform => self.transform_key(event),
        }
        None
    }

    fn upload_key(&mut self, event: &KeyEvent) {
        match self.upload.handle_key(event) {
            UploadAction::None => {}
            UploadAction::Open => {
                if let Err(e) = self.upload.open() {
                    self.report_error("open", &e);
                }
            }
            UploadAction::Preview => {
                if let Err(e) = self.upload.run_preview() {
                    self.report_error("preview", &e);
                }
            }
            UploadAction::Load => {
                let options = self.upload.load_options();
                match self.upload.source() {
                    Ok(source) => {
                        let source = source.clone();
                        self.dispatch(Command::Load { source, options });
                    }
                    Err(e) => self.report_error("load", &e),
                }
            }
        }
    }

    fn overview_key(&mut self, event: &KeyEvent) {
        let menu = MenuItem::available(self.session.last_export.is_some());
        let chosen = match event.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.overview_cursor = (self.overview_cursor + 1).min(menu.len() - 1);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.overview_cursor = self.overview_cursor.saturating_sub(1);
                None
            }
            KeyCode::Enter => menu.get(self.overview_cursor).copied(),
            KeyCode::Char('e') => Some(MenuItem::Explore),
            KeyCode::Char('t') => Some(MenuItem::Transform),
            KeyCode::Char('c') => menu
                .contains(&MenuItem::ContinueFromLastExport)
                .then_some(MenuItem::ContinueFromLastExport),
            _ => None,
        };
        match chosen {
            Some(MenuItem::Explore) => {
                self.dispatch(Command::SetMode(Mode::Explore));
            }
            Some(MenuItem::Transform) => {
                self.dispatch(Command::SetMode(Mode::Transform));
            }
            Some(MenuItem::ContinueFromLastExport) => {
                self.dispatch(Command::ContinueFromLastExport);
            }
            None => {}
        }
    }

    fn explore_key(&mut self, event: &KeyEvent) {
        match self.explore.handle_key(event, &self.session) {
            ExploreAction::None => {}
            ExploreAction::Apply(command) => {
                self.dispatch(command);
            }
            ExploreAction::RunAnalyses => {
                self.dispatch(Command::RunAnalyses(self.config.analysis.clone()));
            }
            ExploreAction::SaveCharts => {
                if let Err(e) = self.save_charts() {
                    self.report_error("save_charts", &e);
                }
            }
        }
    }

    /// Write every chart of the current report to `<output_dir>/charts`.
    pub fn save_charts(&mut self) -> Result<Vec<PathBuf>> {
        let Some(report) = &self.explore.report else {
            return Err(DataError::validation("Run the analyses first").into());
        };
        let format = ChartExportFormat::from_extension(&self.config.analysis.chart_format)
            .unwrap_or_default();
        let dir = export::resolve_output_dir(Some(Path::new(&self.config.export.output_dir)))?
            .join(CHARTS_DIR);
        let size = (
            self.config.analysis.chart_width,
            self.config.analysis.chart_height,
        );
        let written = chart_export::write_charts(&dir, &report.charts(), format, size)?;
        info!(count = written.len(), dir = %dir.display(), "saved charts");
        self.explore.status = Some(format!(
            "Saved {} chart(s) to {}",
            written.len(),
            dir.display()
        ));
        Ok(written)
    }

    fn transform_key(&mut self, event: &KeyEvent) {
        let Some(form) = self.transform.as_mut() else {
            return;
        };
        match form.handle_key(event) {
            TransformAction::None => {}
            TransformAction::Apply => match form.build_command() {
                Ok(command) => {
                    self.dispatch(command);
                }
                Err(e) => self.report_error("transform", &e),
            },
            TransformAction::Export => {
                let Some(export) = form.export.as_ref() else {
                    return;
                };
                let options = export.options();
                match export.target_path() {
                    Ok(path) => {
                        self.dispatch(Command::Export { path, options });
                    }
                    Err(e) => self.report_error("export", &e),
                }
            }
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path) => {
                self.upload.set_path(path);
                if let Err(e) = self.upload.open() {
                    self.report_error("open", &e);
                }
                None
            }
            AppEvent::Resize(_, _) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn controls(&self) -> &'static [(&'static str, &'static str)] {
        match self.screen() {
            Screen::Upload => &[
                ("Tab", "Next"),
                ("←→", "Choose"),
                ("Enter", "Confirm"),
                ("F1", "Help"),
                ("^C", "Quit"),
            ],
            Screen::Overview => &[
                ("↑↓", "Move"),
                ("Enter", "Select"),
                ("^R", "Reset"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            Screen::Explore => &[
                ("Tab", "Focus"),
                ("Space", "Toggle"),
                ("a", "All"),
                ("Enter", "Run"),
                ("s", "Save charts"),
                ("Esc", "Menu"),
                ("^R", "Reset"),
                ("q", "Quit"),
            ],
            Screen::Transform => &[
                ("Tab", "Next"),
                ("←→", "Choose"),
                ("Enter", "Apply"),
                ("Esc", "Menu"),
                ("^R", "Reset"),
                ("F1", "Help"),
            ],
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            Span::styled(
                format!(" {} ", APP_DISPLAY_NAME),
                Style::default()
                    .fg(self.color("primary"))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("v{}  ", env!("CARGO_PKG_VERSION")),
                Style::default().fg(self.color("dimmed")),
            ),
            Span::styled(
                self.screen().label(),
                Style::default().fg(self.color("secondary")),
            ),
        ];
        if let Some(name) = &self.session.source_name {
            spans.push(Span::styled(
                format!("  {}", name),
                Style::default().fg(self.color("text_secondary")),
            ));
        }
        if self.debug {
            spans.push(Span::styled(
                format!(
                    "  [debug] encoding={} separator={}",
                    self.session.encoding.label(),
                    self.session.separator.map(|s| s.label()).unwrap_or("-")
                ),
                Style::default().fg(self.color("warning")),
            ));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_error_modal(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 70, 40);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Error")
            .border_style(Style::default().fg(self.color("error")));
        let inner_area = block.inner(popup_area);
        block.render(popup_area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(inner_area);

        Paragraph::new(self.error_modal.message.as_str())
            .style(Style::default().fg(self.color("error")))
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);

        Paragraph::new("[ OK ]")
            .centered()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.color("modal_border_active"))),
            )
            .render(chunks[1], buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 60, 60);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} v{} ", APP_DISPLAY_NAME, env!("CARGO_PKG_VERSION")))
            .border_style(Style::default().fg(self.color("modal_border_active")));
        Paragraph::new(HELP_TEXT)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(self.color("text_primary")))
            .block(block)
            .render(popup_area, buf);
    }
}

const HELP_TEXT: &str = "\
Upload:     type a path, Enter to read it and detect its encoding.
            Pick encoding and separator with ←→, then Preview or Load.

Overview:   first rows, types and missing counts of the data.
            e Explore, t Transform, c continue from the last generated file.

Explore:    Space toggles the column or analysis under the cursor, a toggles all columns.
            Enter runs the selected analyses. In the report, ←→ changes page.
            s saves the report's charts to the output directory.

Transform:  choose Sampling, Rename or Fill, fill in the form and Apply.
            The result replaces the current data and can be exported.

Global:     Esc back to the menu, Ctrl+R reset the session, F1 or ? help,
            q or Ctrl+C quit.";

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::default()
            .style(Style::default().bg(self.color("background")))
            .render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Fill(1),
                Constraint::Length(1), // status
                Constraint::Length(1), // controls
            ])
            .split(area);
        self.render_header(layout[0], buf);

        let body = layout[1];
        let theme = self.theme.clone();
        match self.screen() {
            Screen::Upload => widgets::upload::render_upload(body, buf, &self.upload, &theme),
            Screen::Overview => {
                if let (Some(df), Some(info)) =
                    (self.session.dataset(), self.session.basic_info())
                {
                    let menu = MenuItem::available(self.session.last_export.is_some());
                    OverviewView {
                        df,
                        info: &info,
                        menu: &menu,
                        cursor: self.overview_cursor.min(menu.len() - 1),
                        source_name: self.session.source_name.as_deref(),
                        theme: &theme,
                    }
                    .render(body, buf);
                }
            }
            Screen::Explore => {
                widgets::explore::render_explore(
                    body,
                    buf,
                    &mut self.explore,
                    &self.session,
                    &theme,
                )
            }
            Screen::Transform => {
                if let (Some(form), Some(df), Some(info)) = (
                    self.transform.as_mut(),
                    self.session.dataset(),
                    self.session.basic_info(),
                ) {
                    widgets::transform::render_transform(body, buf, form, df, &info, &theme);
                }
            }
        }

        if let Some(status) = &self.status {
            Paragraph::new(format!(" {}", status))
                .style(Style::default().fg(self.color("success")))
                .render(layout[2], buf);
        }

        let row_count = self.session.dataset().map(|df| df.height());
        Controls::new(self.controls())
            .with_row_count(row_count)
            .with_dimmed(self.error_modal.active || self.show_help)
            .with_colors(
                self.color("controls_bg"),
                self.color("primary"),
                self.color("text_primary"),
            )
            .render(layout[3], buf);

        if self.show_help {
            self.render_help(area, buf);
        }
        // Error modal last so it is on top of everything
        if self.error_modal.active {
            self.render_error_modal(area, buf);
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_starts_on_upload_screen() {
        let (tx, _rx) = channel();
        let app = App::new(tx);
        assert_eq!(app.screen(), Screen::Upload);
        assert!(!app.error_modal.active);
    }

    #[test]
    fn test_error_modal_blocks_keys_until_dismissed() {
        let (tx, _rx) = channel();
        let mut app = App::new(tx);
        app.error_modal.show("boom".to_string());
        assert!(app.event(&key(KeyCode::Char('q'))).is_none());
        app.event(&key(KeyCode::Enter));
        assert!(!app.error_modal.active);
    }

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(Rect::new(0, 0, 100, 100), 50, 50);
        assert_eq!(r, Rect::new(25, 25, 50, 50));
    }
}
