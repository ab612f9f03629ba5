use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::{AppContent, AppRequest};
use crate::ui::{dim_style, normal_style, sel_style};

const MENU: &str = " File  Edit  Format  View  Help";

/// Append-only text buffer with a line/column status bar.
#[derive(Debug, Clone, Default)]
pub struct Notepad {
    text: String,
}

impl Notepad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> String {
        let lines = self.text.split('\n').count();
        format!("Ln {}, Col {}", lines, self.text.chars().count())
    }
}

impl AppContent for Notepad {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        if area.height < 3 {
            return;
        }
        f.render_widget(
            Paragraph::new(Span::styled(MENU, dim_style())),
            Rect { height: 1, ..area },
        );

        let body = Rect {
            y: area.y + 1,
            height: area.height - 2,
            ..area
        };
        let mut lines: Vec<Line> = self
            .text
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), normal_style())))
            .collect();
        if focused {
            if let Some(last) = lines.last_mut() {
                last.spans.push(Span::styled("_", sel_style()));
            }
        }
        // Keep the caret line in view.
        let overflow = lines.len().saturating_sub(body.height as usize);
        let visible: Vec<Line> = lines.into_iter().skip(overflow).collect();
        f.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), body);

        f.render_widget(
            Paragraph::new(Span::styled(self.status(), dim_style())).alignment(Alignment::Right),
            Rect {
                y: area.y + area.height - 1,
                height: 1,
                ..area
            },
        );
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.text.push(c),
            KeyCode::Enter => self.text.push('\n'),
            KeyCode::Tab => self.text.push_str("    "),
            KeyCode::Backspace => {
                self.text.pop();
            }
            _ => {}
        }
        AppRequest::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(pad: &mut Notepad, s: &str) {
        for c in s.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            pad.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
        }
    }

    #[test]
    fn status_counts_lines_and_chars() {
        let mut pad = Notepad::new();
        assert_eq!(pad.status(), "Ln 1, Col 0");
        type_str(&mut pad, "ab\ncd");
        assert_eq!(pad.text(), "ab\ncd");
        assert_eq!(pad.status(), "Ln 2, Col 5");
    }

    #[test]
    fn backspace_and_control_chords() {
        let mut pad = Notepad::new();
        type_str(&mut pad, "hey");
        pad.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        pad.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(pad.text(), "he");
    }
}
