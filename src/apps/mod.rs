//! Built-in applications. Each one is an opaque [`AppContent`] the window
//! manager stores but never looks inside.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::core::{AppCatalog, AppDefinition, Size, WindowManager};

pub mod explorer;
pub mod notepad;
pub mod paint;
pub mod pyeval;
pub mod settings;
pub mod snake;
pub mod terminal;

/// Something an app asks the shell to do on its behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRequest {
    None,
    Launch(&'static str),
}

/// Content region hosted inside a window frame.
///
/// Coordinates handed to the mouse hooks are cells relative to the top-left
/// of the content area. State lives in the implementor and survives
/// minimize/restore because the handle is never rebuilt.
pub trait AppContent {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool);

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest;

    fn handle_click(&mut self, _col: u16, _row: u16) -> AppRequest {
        AppRequest::None
    }

    /// Pointer moved with the button held, outside any window gesture.
    fn handle_drag(&mut self, _col: u16, _row: u16) {}

    fn tick(&mut self, _now: Instant) {}
}

pub type AppHandle = Box<dyn AppContent>;

pub type ShellManager = WindowManager<AppHandle, ShellProps>;

/// Props the shell hands to app factories: the shared wallpaper selection.
#[derive(Debug, Clone, Default)]
pub struct ShellProps {
    wallpaper: Rc<Cell<usize>>,
}

impl ShellProps {
    pub fn new(wallpaper: usize) -> Self {
        Self {
            wallpaper: Rc::new(Cell::new(wallpaper)),
        }
    }

    pub fn wallpaper(&self) -> usize {
        self.wallpaper.get()
    }

    pub fn set_wallpaper(&self, index: usize) {
        self.wallpaper.set(index);
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

fn make_explorer(_: Option<&ShellProps>) -> AppHandle {
    Box::new(explorer::Explorer::new())
}

fn make_terminal(_: Option<&ShellProps>) -> AppHandle {
    Box::new(terminal::Terminal::new())
}

fn make_notepad(_: Option<&ShellProps>) -> AppHandle {
    Box::new(notepad::Notepad::new())
}

fn make_paint(_: Option<&ShellProps>) -> AppHandle {
    Box::new(paint::Paint::new())
}

fn make_snake(_: Option<&ShellProps>) -> AppHandle {
    Box::new(snake::Snake::new(Instant::now()))
}

fn make_settings(props: Option<&ShellProps>) -> AppHandle {
    Box::new(settings::SettingsApp::new(props.cloned().unwrap_or_default()))
}

pub const SETTINGS_APP: &str = "settings";

pub fn definitions() -> Vec<AppDefinition<AppHandle, ShellProps>> {
    vec![
        AppDefinition {
            id: "explorer",
            name: "File Explorer",
            icon: "[PC]",
            default_size: Some(Size::new(800, 500)),
            description: "Browse and organise the files on drive C:.",
            factory: make_explorer,
        },
        AppDefinition {
            id: "terminal",
            name: "Terminal",
            icon: "[>_]",
            default_size: Some(Size::new(600, 400)),
            description: "Command prompt with a small Python mode.",
            factory: make_terminal,
        },
        AppDefinition {
            id: "notepad",
            name: "Notepad",
            icon: "[Tx]",
            default_size: Some(Size::new(500, 400)),
            description: "Plain text editor.",
            factory: make_notepad,
        },
        AppDefinition {
            id: "paint",
            name: "Paint",
            icon: "[Pa]",
            default_size: Some(Size::new(700, 500)),
            description: "Draw on a canvas with the mouse.",
            factory: make_paint,
        },
        AppDefinition {
            id: "game",
            name: "Snake",
            icon: "[Sn]",
            default_size: Some(Size::new(450, 500)),
            description: "Eat, grow and stay off the walls.",
            factory: make_snake,
        },
        AppDefinition {
            id: SETTINGS_APP,
            name: "Settings",
            icon: "[Se]",
            default_size: Some(Size::new(900, 600)),
            description: "Pick a desktop background.",
            factory: make_settings,
        },
    ]
}

pub fn catalog() -> AppCatalog<AppHandle, ShellProps> {
    AppCatalog::new(definitions())
}

// ── Shared drawing helpers ────────────────────────────────────────────────────

/// Clip `text` to at most `width` characters.
pub(crate) fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
