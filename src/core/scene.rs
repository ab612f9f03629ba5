use std::time::Instant;

use super::controller::Controllers;
use super::geometry::{Bounds, Point, Viewport};
use super::manager::WindowManager;
use super::presentation::Presentation;
use super::window::{Window, WindowId};

/// Everything the chrome needs to paint one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneWindow {
    pub id: WindowId,
    /// Geometry to paint this frame, mid-animation if one is running.
    pub bounds: Bounds,
    /// Resolved geometry the window is settling towards.
    pub target: Bounds,
    pub visible: bool,
    pub active: bool,
    pub maximized: bool,
    pub z_index: u64,
    pub presentation: Presentation,
}

/// Maximized windows cover the work area; others use their stored geometry.
pub fn resolve_bounds<C>(win: &Window<C>, viewport: Viewport) -> Bounds {
    if win.is_maximized() {
        viewport.work_area()
    } else {
        win.bounds()
    }
}

/// Build the back-to-front list of windows for this frame.
pub fn compose<C, P>(
    wm: &WindowManager<C, P>,
    controllers: &mut Controllers,
    viewport: Viewport,
    now: Instant,
) -> Vec<SceneWindow> {
    let active = wm.active_id();
    wm.paint_order()
        .into_iter()
        .map(|win| {
            let id = win.id();
            let target = resolve_bounds(win, viewport);
            let presentation = controllers.presentation(id, win.is_minimized(), now);
            let bounds = controllers.displayed_bounds(id, target, presentation.transition, now);
            SceneWindow {
                id,
                bounds,
                target,
                visible: !win.is_minimized(),
                active: active == Some(id),
                maximized: win.is_maximized(),
                z_index: win.z_index(),
                presentation,
            }
        })
        .collect()
}

/// Topmost interactive window under `point`, if any.
pub fn hit_test(scene: &[SceneWindow], point: Point) -> Option<WindowId> {
    scene
        .iter()
        .rev()
        .filter(|w| w.visible && w.presentation.interactive)
        .find(|w| w.bounds.contains(point))
        .map(|w| w.id)
}
