//! Explore screen state: column and analysis checklists, and paging through
//! the last analysis report.

use crossterm::event::{KeyCode, KeyEvent};

use crate::analysis::{AnalysisKind, AnalysisReport};
use crate::session::{Command, SessionState};
use crate::widgets::checklist::ChecklistState;
use crate::widgets::radio_block::cycle;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExploreFocus {
    #[default]
    Columns,
    Analyses,
    Report,
}

/// One screenful of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPage {
    Describe,
    Distribution(usize),
    Correlation,
    MissingValues,
    BoxPlot(usize),
    Notes,
}

impl ReportPage {
    pub fn title(self, report: &AnalysisReport) -> String {
        match self {
            Self::Describe => "Descriptive statistics".to_string(),
            Self::Distribution(i) => report
                .distributions
                .get(i)
                .map(|d| format!("Distribution of {}", d.column))
                .unwrap_or_default(),
            Self::Correlation => "Correlation".to_string(),
            Self::MissingValues => "Missing values".to_string(),
            Self::BoxPlot(i) => report
                .box_plots
                .get(i)
                .map(|b| format!("Box plot of {}", b.name))
                .unwrap_or_default(),
            Self::Notes => "Notes".to_string(),
        }
    }
}

/// Pages in display order. Sections with nothing to show are skipped.
pub fn report_pages(report: &AnalysisReport) -> Vec<ReportPage> {
    let mut pages = Vec::new();
    if report.describe.is_some() {
        pages.push(ReportPage::Describe);
    }
    pages.extend((0..report.distributions.len()).map(ReportPage::Distribution));
    if report.correlation.is_some() {
        pages.push(ReportPage::Correlation);
    }
    if report.missing.is_some() {
        pages.push(ReportPage::MissingValues);
    }
    pages.extend((0..report.box_plots.len()).map(ReportPage::BoxPlot));
    if !report.notes.is_empty() {
        pages.push(ReportPage::Notes);
    }
    pages
}

#[derive(Debug, Clone)]
pub enum ExploreAction {
    None,
    Apply(Command),
    RunAnalyses,
    SaveCharts,
}

#[derive(Default)]
pub struct ExploreView {
    pub focus: ExploreFocus,
    pub columns: ChecklistState,
    pub analyses: ChecklistState,
    pub report: Option<AnalysisReport>,
    pub page: usize,
    /// Last save message
    pub status: Option<String>,
}

impl ExploreView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_report(&mut self, report: AnalysisReport) {
        self.report = Some(report);
        self.page = 0;
        self.status = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn current_page(&self) -> Option<ReportPage> {
        let report = self.report.as_ref()?;
        report_pages(report).get(self.page).copied()
    }

    fn turn_page(&mut self, forward: bool) {
        let count = self.report.as_ref().map(|r| report_pages(r).len()).unwrap_or(0);
        if count > 0 {
            self.page = cycle(self.page.min(count - 1), count, forward);
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent, session: &SessionState) -> ExploreAction {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                let order = [
                    ExploreFocus::Columns,
                    ExploreFocus::Analyses,
                    ExploreFocus::Report,
                ];
                let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
                self.focus = order[cycle(idx, order.len(), key.code == KeyCode::Tab)];
                return ExploreAction::None;
            }
            KeyCode::Enter | KeyCode::Char('r') => return ExploreAction::RunAnalyses,
            KeyCode::Char('s') if self.report.is_some() => return ExploreAction::SaveCharts,
            _ => {}
        }

        match self.focus {
            ExploreFocus::Columns => {
                let len = session.columns.len();
                match key.code {
                    KeyCode::Down | KeyCode::Char('j') => self.columns.next(len),
                    KeyCode::Up | KeyCode::Char('k') => self.columns.previous(),
                    KeyCode::Char(' ') => {
                        if let Some((name, on)) = session.columns.iter().nth(self.columns.cursor) {
                            return ExploreAction::Apply(Command::SetColumn {
                                name: name.to_string(),
                                selected: !on,
                            });
                        }
                    }
                    KeyCode::Char('a') => {
                        let all = session.columns.iter().all(|(_, on)| on);
                        return ExploreAction::Apply(Command::SetAllColumns(!all));
                    }
                    _ => {}
                }
            }
            ExploreFocus::Analyses => match key.code {
                KeyCode::Down | KeyCode::Char('j') => self.analyses.next(AnalysisKind::ALL.len()),
                KeyCode::Up | KeyCode::Char('k') => self.analyses.previous(),
                KeyCode::Char(' ') => {
                    if let Some(kind) = AnalysisKind::ALL.get(self.analyses.cursor) {
                        return ExploreAction::Apply(Command::SetAnalysis {
                            kind: *kind,
                            enabled: !session.analyses.is_enabled(*kind),
                        });
                    }
                }
                _ => {}
            },
            ExploreFocus::Report => match key.code {
                KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => self.turn_page(true),
                KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => self.turn_page(false),
                _ => {}
            },
        }
        ExploreAction::None
    }
}
