use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::pyeval::Interpreter;
use super::{clip, AppContent, AppRequest};
use crate::ui::{normal_style, title_style};

const PROMPT_PATH: &str = "C:\\Users\\Admin";
const PY_PROMPT: &str = ">>> ";
const HELP_TEXT: &str = "Available commands: help, cls, echo, python, date, ver";
const PY_BANNER: &str = "Python 3.12.0 (deskshell) on linux\nType \"exit()\" to leave.";
/// Scrollback kept per window; older lines are dropped first.
const MAX_HISTORY: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Input,
    Output,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermLine {
    pub kind: LineKind,
    pub text: String,
}

/// Command prompt with a `python` sub-mode.
#[derive(Debug)]
pub struct Terminal {
    history: VecDeque<TermLine>,
    input: String,
    python: Option<Interpreter>,
}

impl Terminal {
    pub fn new() -> Self {
        let mut term = Self {
            history: VecDeque::new(),
            input: String::new(),
            python: None,
        };
        term.output(&format!("deskshell [Version {}]", env!("CARGO_PKG_VERSION")));
        term.output("");
        term.output("Type \"python\" to enter Python mode, or \"help\" for commands.");
        term
    }

    pub fn history(&self) -> &VecDeque<TermLine> {
        &self.history
    }

    pub fn in_python(&self) -> bool {
        self.python.is_some()
    }

    fn prompt(&self) -> String {
        if self.python.is_some() {
            PY_PROMPT.to_string()
        } else {
            format!("{PROMPT_PATH}>")
        }
    }

    fn push_line(&mut self, kind: LineKind, text: String) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(TermLine { kind, text });
    }

    fn output(&mut self, text: &str) {
        for line in text.split('\n') {
            self.push_line(LineKind::Output, line.to_string());
        }
    }

    fn error(&mut self, text: String) {
        self.push_line(LineKind::Error, text);
    }

    /// Execute one submitted line.
    pub fn submit(&mut self, cmd: &str) {
        let echoed = format!("{}{cmd}", self.prompt());
        self.push_line(LineKind::Input, echoed);
        let trimmed = cmd.trim();

        if let Some(py) = self.python.as_mut() {
            if trimmed.eq_ignore_ascii_case("exit()") {
                self.python = None;
                self.output("Exiting Python interpreter.");
                return;
            }
            match py.run_line(trimmed) {
                Ok(Some(out)) => self.output(&out),
                Ok(None) => {}
                Err(err) => self.error(format!("Error: {err}")),
            }
            return;
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "" => {}
            "help" => self.output(HELP_TEXT),
            "cls" | "clear" => self.history.clear(),
            "python" => {
                self.python = Some(Interpreter::new());
                self.output(PY_BANNER);
            }
            "date" => {
                let now = chrono::Local::now().format("%a %b %d %Y %H:%M:%S").to_string();
                self.output(&now);
            }
            "ver" => self.output(&format!("deskshell {}", env!("CARGO_PKG_VERSION"))),
            lower if lower.starts_with("echo ") => self.output(&trimmed[5..]),
            _ => self.error(format!(
                "'{trimmed}' is not recognized as an internal or external command."
            )),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContent for Terminal {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        if area.height == 0 {
            return;
        }
        let width = area.width as usize;
        let mut lines: Vec<Line> = self
            .history
            .iter()
            .map(|l| {
                let style = match l.kind {
                    LineKind::Input => title_style(),
                    LineKind::Output => normal_style(),
                    LineKind::Error => Style::default().fg(Color::LightRed),
                };
                Line::from(Span::styled(clip(&l.text, width), style))
            })
            .collect();
        let caret = if focused { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(self.prompt(), title_style()),
            Span::styled(format!("{}{caret}", self.input), normal_style()),
        ]));
        let skip = lines.len().saturating_sub(area.height as usize);
        let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
        f.render_widget(Paragraph::new(visible), area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest {
        match key.code {
            KeyCode::Enter => {
                let cmd = std::mem::take(&mut self.input);
                self.submit(&cmd);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.input.push(c),
            _ => {}
        }
        AppRequest::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last(term: &Terminal) -> &TermLine {
        term.history().back().unwrap()
    }

    #[test]
    fn builtin_commands() {
        let mut term = Terminal::new();
        term.submit("help");
        assert_eq!(last(&term).text, HELP_TEXT);
        term.submit("echo hello there");
        assert_eq!(last(&term).text, "hello there");
        term.submit("ver");
        assert!(last(&term).text.starts_with("deskshell "));
        term.submit("cls");
        assert!(term.history().is_empty());
    }

    #[test]
    fn unknown_command_is_an_error_line() {
        let mut term = Terminal::new();
        term.submit("frobnicate");
        assert_eq!(last(&term).kind, LineKind::Error);
        assert_eq!(
            last(&term).text,
            "'frobnicate' is not recognized as an internal or external command."
        );
    }

    #[test]
    fn python_mode_keeps_variables_until_exit() {
        let mut term = Terminal::new();
        term.submit("python");
        assert!(term.in_python());
        term.submit("x = 6");
        term.submit("print(x * 7)");
        assert_eq!(last(&term).text, "42");
        term.submit("for i in range(2):");
        assert_eq!(last(&term).kind, LineKind::Error);
        term.submit("exit()");
        assert!(!term.in_python());
        assert_eq!(last(&term).text, "Exiting Python interpreter.");
    }

    #[test]
    fn scrollback_drops_oldest_lines() {
        let mut term = Terminal::new();
        for i in 0..MAX_HISTORY {
            term.submit(&format!("echo line {i}"));
        }
        assert_eq!(term.history().len(), MAX_HISTORY);
        assert_eq!(last(&term).text, format!("line {}", MAX_HISTORY - 1));
        let oldest = term.history().front().unwrap();
        assert_eq!(oldest.kind, LineKind::Input);
        assert!(oldest.text.ends_with(&format!("echo line {}", MAX_HISTORY / 2)));
    }

    #[test]
    fn typing_then_enter_submits() {
        let mut term = Terminal::new();
        for c in "ver".chars() {
            term.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        term.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(term.history()[term.history().len() - 2].kind, LineKind::Input);
        assert!(last(&term).text.starts_with("deskshell "));
    }
}
