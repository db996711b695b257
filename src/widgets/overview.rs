//! Overview screen: first rows, basic info and the mode menu.

use polars::prelude::DataFrame;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use super::datatable::DataPreview;
use super::info::InfoPanel;
use crate::config::Theme;
use crate::source::PREVIEW_ROWS;
use crate::statistics::BasicInfo;

/// Entries of the mode menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Explore,
    Transform,
    ContinueFromLastExport,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            Self::Explore => "Explore the data",
            Self::Transform => "Transform the data",
            Self::ContinueFromLastExport => "Continue from the last generated file",
        }
    }

    /// Menu entries; continuing is offered once something has been exported.
    pub fn available(has_last_export: bool) -> Vec<Self> {
        let mut items = vec![Self::Explore, Self::Transform];
        if has_last_export {
            items.push(Self::ContinueFromLastExport);
        }
        items
    }
}

pub struct OverviewView<'a> {
    pub df: &'a DataFrame,
    pub info: &'a BasicInfo,
    pub menu: &'a [MenuItem],
    pub cursor: usize,
    pub source_name: Option<&'a str>,
    pub theme: &'a Theme,
}

impl Widget for OverviewView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = self.theme.get("modal_border");
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(PREVIEW_ROWS as u16 + 3),
                Constraint::Fill(1),
            ])
            .split(area);
        let head = self.df.head(Some(PREVIEW_ROWS));
        let title = match self.source_name {
            Some(name) => format!(" {} ", name),
            None => " Data ".to_string(),
        };
        DataPreview::new(&head, title)
            .with_colors(self.theme.get("table_header"), border)
            .render(layout[0], buf);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(2), Constraint::Length(44)])
            .split(layout[1]);
        InfoPanel::new(self.info, " Basic information ")
            .with_colors(self.theme.get("table_header"), border, self.theme.get("warning"))
            .render(bottom[0], buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" What next? ")
            .border_style(Style::default().fg(self.theme.get("modal_border_active")));
        let inner = block.inner(bottom[1]);
        block.render(bottom[1], buf);
        let lines: Vec<Line> = self
            .menu
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut style = Style::default().fg(self.theme.get("text_primary"));
                if i == self.cursor {
                    style = style
                        .fg(self.theme.get("primary"))
                        .add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(format!(" {} ", item.label()), style))
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}
