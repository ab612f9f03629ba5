use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::{clip, AppContent, AppRequest};
use crate::ui::{dim_style, normal_style, sel_style, title_style};

const NEW_FOLDER_NAME: &str = "New Folder";

#[derive(Debug, Clone)]
enum NodeKind {
    Folder(Vec<usize>),
    File(String),
    Shortcut(&'static str),
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Viewing(usize),
    ConfirmDelete(usize),
}

/// In-memory file browser over a small demo drive.
#[derive(Debug, Clone)]
pub struct Explorer {
    nodes: Vec<Node>,
    history: Vec<usize>,
    selected: usize,
    mode: Mode,
}

impl Explorer {
    pub fn new() -> Self {
        let mut ex = Self {
            nodes: Vec::new(),
            history: Vec::new(),
            selected: 0,
            mode: Mode::Browse,
        };
        let root = ex.push_folder(None, "C:");
        let docs = ex.push_folder(Some(root), "Documents");
        ex.push(
            docs,
            "resume.txt",
            NodeKind::File(
                "Senior Engineer\nExperience: 10 Years\nSkills: Rust, TypeScript, Linux".into(),
            ),
        );
        ex.push(docs, "ideas.txt", NodeKind::File("Build a desktop in the terminal...".into()));
        ex.push_folder(Some(root), "Pictures");
        let sys = ex.push_folder(Some(root), "System");
        ex.push(
            sys,
            "boot.log",
            NodeKind::File("System initialized successfully.\nDrivers loaded.\nKernel active.".into()),
        );
        ex.push(root, "Snake.lnk", NodeKind::Shortcut("game"));
        ex.history.push(root);
        ex
    }

    fn push_folder(&mut self, parent: Option<usize>, name: &str) -> usize {
        match parent {
            Some(p) => self.push(p, name, NodeKind::Folder(Vec::new())),
            None => {
                self.nodes.push(Node {
                    name: name.into(),
                    kind: NodeKind::Folder(Vec::new()),
                });
                self.nodes.len() - 1
            }
        }
    }

    fn push(&mut self, parent: usize, name: &str, kind: NodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.into(),
            kind,
        });
        if let NodeKind::Folder(children) = &mut self.nodes[parent].kind {
            children.push(id);
        }
        id
    }

    fn cwd(&self) -> usize {
        self.history.last().copied().unwrap_or(0)
    }

    fn entries(&self) -> &[usize] {
        match &self.nodes[self.cwd()].kind {
            NodeKind::Folder(children) => children.as_slice(),
            _ => &[],
        }
    }

    pub fn path(&self) -> String {
        self.history
            .iter()
            .map(|&id| self.nodes[id].name.as_str())
            .collect::<Vec<_>>()
            .join("\\")
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries()
            .iter()
            .map(|&id| self.nodes[id].name.as_str())
            .collect()
    }

    pub fn viewing(&self) -> Option<&str> {
        match self.mode {
            Mode::Viewing(id) => match &self.nodes[id].kind {
                NodeKind::File(text) => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.entries().len() {
            self.selected += 1;
        }
    }

    pub fn open_selected(&mut self) -> AppRequest {
        let Some(&id) = self.entries().get(self.selected) else {
            return AppRequest::None;
        };
        match &self.nodes[id].kind {
            NodeKind::Folder(_) => {
                self.history.push(id);
                self.selected = 0;
                AppRequest::None
            }
            NodeKind::File(_) => {
                self.mode = Mode::Viewing(id);
                AppRequest::None
            }
            NodeKind::Shortcut(app) => AppRequest::Launch(*app),
        }
    }

    pub fn back(&mut self) {
        if self.history.len() > 1 {
            self.history.pop();
            self.selected = 0;
        }
    }

    pub fn new_folder(&mut self) {
        let cwd = self.cwd();
        self.push(cwd, NEW_FOLDER_NAME, NodeKind::Folder(Vec::new()));
        self.selected = self.entries().len() - 1;
    }

    pub fn request_delete(&mut self) {
        if let Some(&id) = self.entries().get(self.selected) {
            self.mode = Mode::ConfirmDelete(id);
        }
    }

    fn confirm_delete(&mut self, id: usize) {
        let cwd = self.cwd();
        if let NodeKind::Folder(children) = &mut self.nodes[cwd].kind {
            children.retain(|&c| c != id);
        }
        let len = self.entries().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        self.mode = Mode::Browse;
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContent for Explorer {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let width = area.width as usize;
        let mut lines = vec![
            Line::from(Span::styled(
                clip(&format!("[<] [New]  {}", self.path()), width),
                dim_style(),
            )),
            Line::from(Span::styled("-".repeat(width), dim_style())),
        ];

        match self.mode {
            Mode::Viewing(id) => {
                lines.push(Line::from(Span::styled(
                    clip(&self.nodes[id].name, width),
                    title_style(),
                )));
                for text in self.viewing().unwrap_or_default().lines() {
                    lines.push(Line::from(Span::styled(text.to_string(), normal_style())));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("[Esc] close", dim_style())));
                f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
                return;
            }
            Mode::ConfirmDelete(id) => {
                lines.push(Line::from(Span::styled(
                    clip(&format!("Delete '{}'? [y/n]", self.nodes[id].name), width),
                    sel_style(),
                )));
                lines.push(Line::from(Span::styled(
                    "This action cannot be undone.",
                    dim_style(),
                )));
            }
            Mode::Browse => {}
        }

        let entries = self.entries();
        if entries.is_empty() {
            lines.push(Line::from(Span::styled("This folder is empty.", dim_style())));
        }
        let rows = (area.height as usize).saturating_sub(lines.len() + 1);
        let start = self.selected.saturating_sub(rows.saturating_sub(1));
        for (idx, &id) in entries.iter().enumerate().skip(start).take(rows) {
            let node = &self.nodes[id];
            let tag = match node.kind {
                NodeKind::Folder(_) => "[D]",
                NodeKind::File(_) => "[F]",
                NodeKind::Shortcut(_) => "[*]",
            };
            let style = if idx == self.selected && focused {
                sel_style()
            } else {
                normal_style()
            };
            lines.push(Line::from(Span::styled(
                clip(&format!("{tag} {}", node.name), width),
                style,
            )));
        }
        f.render_widget(Paragraph::new(lines), area);

        let status = Rect {
            y: area.y + area.height - 1,
            height: 1,
            ..area
        };
        f.render_widget(
            Paragraph::new(Span::styled(format!("{} items", entries.len()), dim_style())),
            status,
        );
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest {
        match self.mode {
            Mode::Viewing(_) => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace) {
                    self.mode = Mode::Browse;
                }
            }
            Mode::ConfirmDelete(id) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(id),
                KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Browse,
                _ => {}
            },
            Mode::Browse => match key.code {
                KeyCode::Up => self.up(),
                KeyCode::Down => self.down(),
                KeyCode::Enter => return self.open_selected(),
                KeyCode::Backspace | KeyCode::Left => self.back(),
                KeyCode::Char('n') => self.new_folder(),
                KeyCode::Delete => self.request_delete(),
                _ => {}
            },
        }
        AppRequest::None
    }

    /// Toolbar on row 0, entries from row 2. Clicking the selected entry
    /// again opens it.
    fn handle_click(&mut self, col: u16, row: u16) -> AppRequest {
        if self.mode != Mode::Browse {
            return AppRequest::None;
        }
        if row == 0 {
            match col {
                0..=2 => self.back(),
                4..=8 => self.new_folder(),
                _ => {}
            }
            return AppRequest::None;
        }
        let Some(idx) = (row as usize).checked_sub(2) else {
            return AppRequest::None;
        };
        if idx >= self.entries().len() {
            return AppRequest::None;
        }
        if idx == self.selected {
            return self.open_selected();
        }
        self.selected = idx;
        AppRequest::None
    }
}
