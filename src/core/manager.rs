use serde::{Deserialize, Serialize};

use super::app::AppCatalog;
use super::events::{EventBus, Notification};
use super::geometry::{Point, Size};
use super::window::{Window, WindowId};
use crate::error::ShellError;

/// What happens to focus when the active window closes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FocusOnClose {
    /// Leave nothing focused.
    #[default]
    Clear,
    /// Hand focus to the highest remaining visible window.
    Topmost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WmConfig {
    pub min_size: Size,
    pub cascade_origin: Point,
    pub cascade_step: i32,
    /// Number of cascade slots before new windows wrap back to the origin.
    pub cascade_wrap: usize,
    pub z_index_seed: u64,
    pub focus_on_close: FocusOnClose,
}

impl Default for WmConfig {
    fn default() -> Self {
        Self {
            min_size: Size::new(300, 200),
            cascade_origin: Point::new(50, 50),
            cascade_step: 30,
            cascade_wrap: 10,
            z_index_seed: 1,
            focus_on_close: FocusOnClose::Clear,
        }
    }
}

/// Owner of every open window, the active-window id and the z-index counter.
///
/// Operations on an id that is no longer present are silent no-ops; a close
/// timer racing a duplicate close click must never corrupt the collection.
pub struct WindowManager<C, P = ()> {
    catalog: AppCatalog<C, P>,
    config: WmConfig,
    windows: Vec<Window<C>>,
    active: Option<WindowId>,
    next_z: u64,
    next_id: u64,
    events: EventBus,
}

impl<C, P> WindowManager<C, P> {
    pub fn new(catalog: AppCatalog<C, P>, config: WmConfig, events: EventBus) -> Self {
        let next_z = config.z_index_seed;
        Self {
            catalog,
            config,
            windows: Vec::new(),
            active: None,
            next_z,
            next_id: 1,
            events,
        }
    }

    pub fn catalog(&self) -> &AppCatalog<C, P> {
        &self.catalog
    }

    pub fn config(&self) -> &WmConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Instantiate `app_id` in a new window and make it active.
    pub fn open(&mut self, app_id: &str, props: Option<&P>) -> Result<WindowId, ShellError> {
        let app = self
            .catalog
            .find(app_id)
            .ok_or_else(|| ShellError::UnknownApp(app_id.to_string()))?;

        let slot = (self.windows.len() % self.config.cascade_wrap.max(1)) as i32;
        let step = self.config.cascade_step * slot;
        let size = app.initial_size().at_least(self.config.min_size);
        let content = app.instantiate(props);

        let id = WindowId::from_raw(self.next_id);
        self.next_id += 1;
        let z_index = self.next_z;
        self.next_z += 1;

        self.windows.push(Window {
            id,
            app_id: app.id.to_string(),
            title: app.name.to_string(),
            icon: app.icon,
            content,
            minimized: false,
            maximized: false,
            x: self.config.cascade_origin.x + step,
            y: self.config.cascade_origin.y + step,
            width: size.width,
            height: size.height,
            z_index,
        });
        self.active = Some(id);
        tracing::debug!(window = %id, app = app_id, z_index, "opened window");
        self.events.emit(Notification::Open(id));
        Ok(id)
    }

    /// Remove a window, returning its record. Absent ids are ignored.
    pub fn close(&mut self, id: WindowId) -> Option<Window<C>> {
        self.remove(id, true)
    }

    /// Remove a window whose close was already announced, e.g. when its exit
    /// animation ends. Focus hand-off still notifies.
    pub fn finish_close(&mut self, id: WindowId) -> Option<Window<C>> {
        self.remove(id, false)
    }

    fn remove(&mut self, id: WindowId, announce: bool) -> Option<Window<C>> {
        let Some(pos) = self.windows.iter().position(|w| w.id == id) else {
            tracing::trace!(window = %id, "close ignored, window already gone");
            return None;
        };
        let removed = self.windows.remove(pos);
        tracing::debug!(window = %id, "closed window");
        if announce {
            self.events.emit(Notification::Close(id));
        }

        if self.active == Some(id) {
            self.active = None;
            if self.config.focus_on_close == FocusOnClose::Topmost {
                if let Some(next) = self.topmost_visible() {
                    self.active = Some(next);
                    self.events.emit(Notification::FocusChanged(next));
                }
            }
        }
        Some(removed)
    }

    /// Drop every window at once (power off). No per-window notifications.
    pub fn close_all(&mut self) -> Vec<Window<C>> {
        self.active = None;
        std::mem::take(&mut self.windows)
    }

    // ── Focus & stacking ──────────────────────────────────────────────────────

    /// Raise `id` and make it active. Redundant calls do not touch the
    /// counter or emit anything; minimized windows cannot take focus.
    pub fn focus(&mut self, id: WindowId) {
        if self.active == Some(id) {
            return;
        }
        let z_index = self.next_z;
        let Some(win) = self.windows.iter_mut().find(|w| w.id == id) else {
            return;
        };
        if win.minimized {
            tracing::trace!(window = %id, "focus ignored, window minimized");
            return;
        }
        win.z_index = z_index;
        self.next_z += 1;
        self.active = Some(id);
        tracing::debug!(window = %id, z_index, "focused window");
        self.events.emit(Notification::FocusChanged(id));
    }

    /// Clear the active window without touching any z-index.
    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Currently focused window. A minimized window is never reported.
    pub fn active_id(&self) -> Option<WindowId> {
        let id = self.active?;
        self.get(id).filter(|w| !w.minimized).map(|w| w.id)
    }

    // ── Window state ──────────────────────────────────────────────────────────

    pub fn toggle_minimize(&mut self, id: WindowId) {
        let Some(win) = self.find_mut(id) else {
            return;
        };
        let was_minimized = win.minimized;
        win.minimized = !was_minimized;
        self.events.emit(if was_minimized {
            Notification::Restore(id)
        } else {
            Notification::Minimize(id)
        });
    }

    /// Stored geometry is left untouched so un-maximizing is lossless.
    pub fn toggle_maximize(&mut self, id: WindowId) {
        let Some(win) = self.find_mut(id) else {
            return;
        };
        let was_maximized = win.maximized;
        win.maximized = !was_maximized;
        self.events.emit(if was_maximized {
            Notification::Restore(id)
        } else {
            Notification::Maximize(id)
        });
    }

    pub fn update_position(&mut self, id: WindowId, x: i32, y: i32) {
        if let Some(win) = self.find_mut(id) {
            win.x = x;
            win.y = y;
        }
    }

    /// Overwrite the size, floored at the configured minimum.
    pub fn update_size(&mut self, id: WindowId, width: i32, height: i32) {
        let size = Size::new(width, height).at_least(self.config.min_size);
        if let Some(win) = self.find_mut(id) {
            win.width = size.width;
            win.height = size.height;
        }
    }

    /// Mutable access to the opaque content, e.g. to forward a key press.
    pub fn content_mut(&mut self, id: WindowId) -> Option<&mut C> {
        self.find_mut(id).map(|w| &mut w.content)
    }

    pub fn contents_mut(&mut self) -> impl Iterator<Item = (WindowId, &mut C)> {
        self.windows.iter_mut().map(|w| (w.id, &mut w.content))
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn get(&self, id: WindowId) -> Option<&Window<C>> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.get(id).is_some()
    }

    /// Windows in creation order (the taskbar order).
    pub fn windows(&self) -> &[Window<C>] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Windows sorted back to front.
    pub fn paint_order(&self) -> Vec<&Window<C>> {
        let mut ordered: Vec<&Window<C>> = self.windows.iter().collect();
        ordered.sort_by_key(|w| w.z_index);
        ordered
    }

    pub fn topmost_visible(&self) -> Option<WindowId> {
        self.windows
            .iter()
            .filter(|w| !w.minimized)
            .max_by_key(|w| w.z_index)
            .map(|w| w.id)
    }

    /// The z-index the next open or focus will receive.
    pub fn next_z_index(&self) -> u64 {
        self.next_z
    }

    fn find_mut(&mut self, id: WindowId) -> Option<&mut Window<C>> {
        self.windows.iter_mut().find(|w| w.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::AppDefinition;
    use std::cell::Cell;
    use std::collections::HashSet;

    thread_local! {
        static BUILT: Cell<u32> = const { Cell::new(0) };
    }

    fn build(props: Option<&u32>) -> u32 {
        BUILT.with(|b| b.set(b.get() + 1));
        props.copied().unwrap_or(0)
    }

    fn def(id: &'static str, size: Option<Size>) -> AppDefinition<u32, u32> {
        AppDefinition {
            id,
            name: id,
            icon: "*",
            default_size: size,
            description: "",
            factory: build,
        }
    }

    fn manager_with(config: WmConfig) -> WindowManager<u32, u32> {
        let catalog = AppCatalog::new(vec![
            def("notepad", Some(Size::new(500, 400))),
            def("paint", Some(Size::new(700, 500))),
            def("tiny", Some(Size::new(40, 30))),
            def("plain", None),
        ]);
        WindowManager::new(catalog, config, EventBus::new())
    }

    fn manager() -> WindowManager<u32, u32> {
        manager_with(WmConfig::default())
    }

    #[test]
    fn open_assigns_defaults_and_activates() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        let win = wm.get(id).unwrap();
        assert_eq!(win.position(), Point::new(50, 50));
        assert_eq!(win.size(), Size::new(500, 400));
        assert!(!win.is_minimized() && !win.is_maximized());
        assert_eq!(wm.active_id(), Some(id));
        assert_eq!(wm.events().drain(), vec![Notification::Open(id)]);
    }

    #[test]
    fn open_unknown_app_creates_nothing() {
        let mut wm = manager();
        let before = wm.next_z_index();
        let err = wm.open("minesweeper", None).unwrap_err();
        assert_eq!(err, ShellError::UnknownApp("minesweeper".into()));
        assert!(wm.is_empty());
        assert_eq!(wm.next_z_index(), before);
        assert!(wm.events().is_empty());
    }

    #[test]
    fn open_invokes_factory_once_with_props() {
        let mut wm = manager();
        let start = BUILT.with(Cell::get);
        let id = wm.open("paint", Some(&42)).unwrap();
        assert_eq!(BUILT.with(Cell::get), start + 1);
        assert_eq!(*wm.get(id).unwrap().content(), 42);
        wm.toggle_minimize(id);
        wm.toggle_minimize(id);
        wm.toggle_maximize(id);
        assert_eq!(BUILT.with(Cell::get), start + 1);
    }

    #[test]
    fn missing_or_tiny_default_size_is_normalised() {
        let mut wm = manager();
        let plain = wm.open("plain", None).unwrap();
        let tiny = wm.open("tiny", None).unwrap();
        assert_eq!(wm.get(plain).unwrap().size(), Size::new(600, 400));
        assert_eq!(wm.get(tiny).unwrap().size(), Size::new(300, 200));
    }

    #[test]
    fn cascade_steps_then_wraps() {
        let mut wm = manager_with(WmConfig {
            cascade_wrap: 3,
            ..WmConfig::default()
        });
        let ids: Vec<_> = (0..4).map(|_| wm.open("notepad", None).unwrap()).collect();
        let pos: Vec<_> = ids.iter().map(|id| wm.get(*id).unwrap().position()).collect();
        assert_eq!(
            pos,
            vec![
                Point::new(50, 50),
                Point::new(80, 80),
                Point::new(110, 110),
                Point::new(50, 50),
            ]
        );
    }

    #[test]
    fn ids_stay_unique_across_open_and_close() {
        let mut wm = manager();
        let mut seen = HashSet::new();
        let mut live = Vec::new();
        for round in 0..20 {
            let id = wm.open(if round % 2 == 0 { "notepad" } else { "paint" }, None).unwrap();
            assert!(seen.insert(id), "id {id} reused");
            live.push(id);
            if round % 3 == 2 {
                let gone = live.remove(0);
                assert!(wm.close(gone).is_some());
                assert!(wm.get(gone).is_none());
            }
            for id in &live {
                assert!(wm.get(*id).is_some());
            }
            let unique: HashSet<_> = wm.windows().iter().map(|w| w.id()).collect();
            assert_eq!(unique.len(), wm.len());
        }
    }

    #[test]
    fn consecutive_opens_get_increasing_z_in_creation_order() {
        let mut wm = manager();
        let ids: Vec<_> = (0..5).map(|_| wm.open("notepad", None).unwrap()).collect();
        let z: Vec<_> = ids.iter().map(|id| wm.get(*id).unwrap().z_index()).collect();
        assert_eq!(z, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn refocusing_active_window_is_a_no_op() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        wm.events().drain();
        let counter = wm.next_z_index();
        wm.focus(id);
        assert_eq!(wm.next_z_index(), counter);
        assert_eq!(wm.get(id).unwrap().z_index(), 1);
        assert!(wm.events().is_empty());
    }

    #[test]
    fn focusing_inactive_window_raises_it_once() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        let _c = wm.open("notepad", None).unwrap();
        wm.events().drain();
        let counter = wm.next_z_index();

        wm.focus(a);
        assert_eq!(wm.next_z_index(), counter + 1);
        let max = wm.windows().iter().map(|w| w.z_index()).max().unwrap();
        assert_eq!(wm.get(a).unwrap().z_index(), max);
        assert_eq!(wm.active_id(), Some(a));
        assert_eq!(wm.events().drain(), vec![Notification::FocusChanged(a)]);
        assert_eq!(wm.get(b).unwrap().z_index(), 2);
    }

    #[test]
    fn focus_ignores_minimized_and_unknown_windows() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        wm.toggle_minimize(a);
        wm.events().drain();
        let counter = wm.next_z_index();
        wm.focus(a);
        wm.close(a);
        wm.events().drain();
        wm.focus(a);
        assert_eq!(wm.next_z_index(), counter);
        assert_eq!(wm.active_id(), Some(b));
        assert!(wm.events().is_empty());
    }

    #[test]
    fn minimizing_active_window_hides_it_from_active_id() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        let z = wm.get(id).unwrap().z_index();
        wm.toggle_minimize(id);
        assert_eq!(wm.active_id(), None);
        assert_eq!(wm.get(id).unwrap().z_index(), z);
        wm.toggle_minimize(id);
        assert_eq!(wm.active_id(), Some(id));
    }

    #[test]
    fn minimize_and_maximize_notifications_follow_prior_state() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        wm.events().drain();
        wm.toggle_minimize(id);
        wm.toggle_minimize(id);
        wm.toggle_maximize(id);
        wm.toggle_maximize(id);
        assert_eq!(
            wm.events().drain(),
            vec![
                Notification::Minimize(id),
                Notification::Restore(id),
                Notification::Maximize(id),
                Notification::Restore(id),
            ]
        );
    }

    #[test]
    fn maximize_round_trip_restores_geometry() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        wm.update_position(id, -15, 333);
        wm.update_size(id, 512, 288);
        let before = wm.get(id).unwrap().bounds();
        wm.toggle_maximize(id);
        assert!(wm.get(id).unwrap().is_maximized());
        assert_eq!(wm.get(id).unwrap().bounds(), before);
        wm.toggle_maximize(id);
        assert_eq!(wm.get(id).unwrap().bounds(), before);
    }

    #[test]
    fn update_size_floors_at_minimum() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        for (w, h) in [(0, 0), (-500, 150), (299, -1), (i32::MIN, i32::MIN)] {
            wm.update_size(id, w, h);
            let size = wm.get(id).unwrap().size();
            assert!(size.width >= 300 && size.height >= 200);
        }
        wm.update_size(id, -500, 150);
        assert_eq!(wm.get(id).unwrap().size(), Size::new(300, 200));
        wm.update_size(id, 800, 600);
        assert_eq!(wm.get(id).unwrap().size(), Size::new(800, 600));
    }

    #[test]
    fn position_and_size_are_independent() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        wm.update_position(id, 200, 120);
        wm.update_size(id, 640, 480);
        assert_eq!(wm.get(id).unwrap().position(), Point::new(200, 120));
        wm.update_position(id, 210, 125);
        assert_eq!(wm.get(id).unwrap().size(), Size::new(640, 480));
    }

    #[test]
    fn close_unknown_id_changes_nothing() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        wm.close(b);
        wm.events().drain();
        let snapshot: Vec<_> = wm.windows().iter().map(|w| format!("{w:?}")).collect();
        assert!(wm.close(b).is_none());
        assert_eq!(wm.len(), 1);
        let after: Vec<_> = wm.windows().iter().map(|w| format!("{w:?}")).collect();
        assert_eq!(snapshot, after);
        assert!(wm.events().is_empty());
        assert!(wm.contains(a));
    }

    #[test]
    fn closing_active_window_clears_focus_by_default() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        wm.close(b);
        assert_eq!(wm.active_id(), None);
        assert!(wm.contains(a));
    }

    #[test]
    fn closing_active_window_can_focus_topmost_remaining() {
        let mut wm = manager_with(WmConfig {
            focus_on_close: FocusOnClose::Topmost,
            ..WmConfig::default()
        });
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        let c = wm.open("notepad", None).unwrap();
        wm.toggle_minimize(b);
        wm.events().drain();
        wm.close(c);
        assert_eq!(wm.active_id(), Some(a));
        assert_eq!(
            wm.events().drain(),
            vec![Notification::Close(c), Notification::FocusChanged(a)]
        );
    }

    #[test]
    fn finish_close_removes_without_a_second_close_cue() {
        let mut wm = manager_with(WmConfig {
            focus_on_close: FocusOnClose::Topmost,
            ..WmConfig::default()
        });
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        wm.events().drain();
        assert!(wm.finish_close(b).is_some());
        assert!(!wm.contains(b));
        assert_eq!(wm.events().drain(), vec![Notification::FocusChanged(a)]);
        assert!(wm.finish_close(b).is_none());
    }

    #[test]
    fn blur_clears_focus_without_touching_z() {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        let counter = wm.next_z_index();
        wm.blur();
        assert_eq!(wm.active_id(), None);
        assert_eq!(wm.next_z_index(), counter);
        wm.focus(id);
        assert_eq!(wm.active_id(), Some(id));
        assert_eq!(wm.next_z_index(), counter + 1);
    }

    #[test]
    fn paint_order_follows_z_not_creation() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("paint", None).unwrap();
        wm.focus(a);
        let order: Vec<_> = wm.paint_order().iter().map(|w| w.id()).collect();
        assert_eq!(order, vec![b, a]);
        let creation: Vec<_> = wm.windows().iter().map(|w| w.id()).collect();
        assert_eq!(creation, vec![a, b]);
    }

    #[test]
    fn notepad_paint_scenario() {
        let mut wm = manager();
        let notepad = wm.open("notepad", None).unwrap();
        assert_eq!(wm.len(), 1);
        assert_eq!(wm.active_id(), Some(notepad));
        assert_eq!(wm.get(notepad).unwrap().z_index(), 1);

        let paint = wm.open("paint", None).unwrap();
        assert_eq!(wm.len(), 2);
        assert_eq!(wm.active_id(), Some(paint));
        assert!(wm.get(paint).unwrap().z_index() > wm.get(notepad).unwrap().z_index());

        let paint_before = format!("{:?}", wm.get(paint).unwrap());
        wm.focus(notepad);
        let max = wm.windows().iter().map(|w| w.z_index()).max().unwrap();
        assert_eq!(wm.get(notepad).unwrap().z_index(), max);
        assert_eq!(wm.active_id(), Some(notepad));
        assert_eq!(format!("{:?}", wm.get(paint).unwrap()), paint_before);

        wm.toggle_minimize(paint);
        assert!(wm.get(paint).unwrap().is_minimized());
        assert_eq!(wm.active_id(), Some(notepad));

        wm.close(notepad);
        assert_eq!(wm.len(), 1);
        assert_eq!(wm.active_id(), None);
        let remaining = wm.get(paint).unwrap();
        assert!(remaining.is_minimized());
        assert_eq!(remaining.size(), Size::new(700, 500));
    }

    #[test]
    fn close_all_empties_collection_but_keeps_counters() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        wm.open("paint", None).unwrap();
        let counter = wm.next_z_index();
        assert_eq!(wm.close_all().len(), 2);
        assert!(wm.is_empty());
        assert_eq!(wm.active_id(), None);
        let c = wm.open("notepad", None).unwrap();
        assert_ne!(c, a);
        assert_eq!(wm.get(c).unwrap().z_index(), counter);
    }
}
