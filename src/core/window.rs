use std::fmt;

use super::geometry::{Bounds, Point, Size};

/// Identifier handed out by the window manager. Never reused while the
/// manager lives, even after the window it named has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win-{}", self.0)
    }
}

/// One open application frame.
///
/// Fields are read-only outside the core: every mutation goes through
/// [`WindowManager`](super::manager::WindowManager). `content` is created once
/// by the app factory and kept for the window's whole life, so minimizing or
/// redrawing never rebuilds application state.
pub struct Window<C> {
    pub(crate) id: WindowId,
    pub(crate) app_id: String,
    pub(crate) title: String,
    pub(crate) icon: &'static str,
    pub(crate) content: C,
    pub(crate) minimized: bool,
    pub(crate) maximized: bool,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) z_index: u64,
}

impl<C> Window<C> {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> &'static str {
        self.icon
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Stored geometry. While maximized this is the geometry to restore to.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn z_index(&self) -> u64 {
        self.z_index
    }
}

impl<C> fmt::Debug for Window<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("app_id", &self.app_id)
            .field("title", &self.title)
            .field("minimized", &self.minimized)
            .field("maximized", &self.maximized)
            .field("bounds", &self.bounds())
            .field("z_index", &self.z_index)
            .finish_non_exhaustive()
    }
}
