pub mod chart;
pub mod checklist;
pub mod controls;
pub mod datatable;
pub mod explore;
pub mod info;
pub mod overview;
pub mod radio_block;
pub mod text_input;
pub mod transform;
pub mod upload;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

/// "[ Label ]" button, reversed when focused.
pub fn render_button(label: &str, focused: bool, color: Color, area: Rect, buf: &mut Buffer) {
    let mut style = Style::default().fg(color);
    if focused {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Paragraph::new(format!("[ {} ]", label))
        .style(style)
        .centered()
        .render(area, buf);
}

/// Rounded block around a text input, highlighted when focused.
pub fn input_block(title: &str, focused: bool, border: Color, active: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .border_style(Style::default().fg(if focused { active } else { border }))
}
