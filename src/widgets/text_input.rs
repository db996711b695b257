use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Submit, // Enter pressed
    Cancel, // Esc pressed
    Changed,
}

/// Single-line text input widget wrapping tui-textarea
pub struct TextInput {
    textarea: TextArea<'static>,
    value: String,
    text_color: Option<Color>,
    cursor_focused: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        // single line: no cursor line underline
        textarea.set_cursor_line_style(Style::default());
        let mut widget = Self {
            textarea,
            value: String::new(),
            text_color: None,
            cursor_focused: None,
            focused: false,
        };
        widget.set_focused(false);
        widget
    }

    /// Input pre-filled with `value`
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value.into());
        self
    }

    /// Text color from `text_primary`, cursor color from `cursor_focused`
    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.cursor_focused = Some(theme.get("cursor_focused"));
        self.apply_style();
        self
    }

    fn apply_style(&mut self) {
        let style = self
            .text_color
            .map(|c| Style::default().fg(c))
            .unwrap_or_default();
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        let focused = self.focused;
        self.set_focused(focused);
    }

    /// Show the cursor when focused, hide it otherwise
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            let cursor_style = match self.cursor_focused.unwrap_or(Color::Reset) {
                Color::Reset => Style::default().add_modifier(Modifier::REVERSED),
                color => Style::default().bg(color).fg(Color::Black),
            };
            self.textarea.set_cursor_style(cursor_style);
        } else {
            // same style as the text hides the cursor
            let style = self.textarea.style();
            self.textarea.set_cursor_style(style);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the contents; the cursor moves to the end
    pub fn set_value(&mut self, value: String) {
        let single_line = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![single_line.clone()]);
        self.value = single_line;
        self.textarea.move_cursor(CursorMove::End);
        self.apply_style();
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => return TextInputEvent::Submit,
            KeyCode::Esc => return TextInputEvent::Cancel,
            _ => {}
        }
        let input = key_event_to_input(event);
        if matches!(input.key, Key::Null | Key::Char('\n') | Key::Char('\r')) {
            return TextInputEvent::None;
        }
        if self.textarea.input(input) {
            self.value = self.textarea.lines().first().cloned().unwrap_or_default();
            TextInputEvent::Changed
        } else {
            TextInputEvent::None
        }
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Null,
    };
    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let style = cell.style().remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}
