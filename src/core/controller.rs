use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::events::Notification;
use super::geometry::{Bounds, Point, Size, Viewport};
use super::manager::WindowManager;
use super::presentation::{GeometryAnimator, Presentation, Transition};
use super::window::WindowId;

/// Portion of a window that must stay on screen when drag clamping is on.
const CLAMP_KEEP_VISIBLE: i32 = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub mount_delay: Duration,
    pub close_delay: Duration,
    pub transition: Duration,
    pub clamp_drag_to_viewport: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mount_delay: Duration::from_millis(50),
            close_delay: Duration::from_millis(200),
            transition: Duration::from_millis(300),
            clamp_drag_to_viewport: false,
        }
    }
}

/// Pointer interaction in progress on one window. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    /// `offset` is the pointer position relative to the window's top-left.
    Dragging { offset: Point },
    Resizing { origin: Point, start: Size },
}

/// Per-window state machine turning pointer input into manager calls.
#[derive(Debug)]
pub struct InteractionController {
    window: WindowId,
    gesture: Gesture,
    mount_until: Option<Instant>,
    close_at: Option<Instant>,
    animator: GeometryAnimator,
}

impl InteractionController {
    pub fn new(window: WindowId, now: Instant, config: &ControllerConfig) -> Self {
        Self {
            window,
            gesture: Gesture::Idle,
            mount_until: Some(now + config.mount_delay),
            close_at: None,
            animator: GeometryAnimator::default(),
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_mounting(&self, now: Instant) -> bool {
        self.mount_until.is_some_and(|until| now < until)
    }

    pub fn is_closing(&self) -> bool {
        self.close_at.is_some()
    }

    /// Title-bar press. Always focuses; starts a drag unless maximized.
    pub fn begin_drag<C, P>(&mut self, wm: &mut WindowManager<C, P>, pointer: Point) -> bool {
        if self.is_closing() {
            return false;
        }
        wm.focus(self.window);
        let Some(win) = wm.get(self.window) else {
            return false;
        };
        if win.is_maximized() {
            return false;
        }
        self.gesture = Gesture::Dragging {
            offset: pointer.offset_from(win.position()),
        };
        tracing::trace!(window = %self.window, "drag started");
        true
    }

    /// Resize-handle press. Ignored while maximized.
    pub fn begin_resize<C, P>(&mut self, wm: &WindowManager<C, P>, pointer: Point) -> bool {
        if self.is_closing() {
            return false;
        }
        let Some(win) = wm.get(self.window) else {
            return false;
        };
        if win.is_maximized() {
            return false;
        }
        self.gesture = Gesture::Resizing {
            origin: pointer,
            start: win.size(),
        };
        tracing::trace!(window = %self.window, "resize started");
        true
    }

    pub fn pointer_move<C, P>(
        &mut self,
        wm: &mut WindowManager<C, P>,
        pointer: Point,
        viewport: Viewport,
        config: &ControllerConfig,
    ) {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Dragging { offset } => {
                let mut target = pointer.offset_from(offset);
                if config.clamp_drag_to_viewport {
                    let width = wm.get(self.window).map_or(0, |w| w.size().width);
                    target = clamp_to_viewport(target, width, viewport);
                }
                wm.update_position(self.window, target.x, target.y);
            }
            Gesture::Resizing { origin, start } => {
                let delta = pointer.offset_from(origin);
                wm.update_size(
                    self.window,
                    start.width.saturating_add(delta.x),
                    start.height.saturating_add(delta.y),
                );
            }
        }
    }

    pub fn end_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Title-bar double click toggles maximize, but only from idle.
    pub fn double_click_title<C, P>(&mut self, wm: &mut WindowManager<C, P>) {
        if self.gesture != Gesture::Idle || self.is_closing() {
            return;
        }
        let Some(win) = wm.get(self.window) else {
            return;
        };
        if !win.is_maximized() {
            wm.events().emit(Notification::Click);
        }
        wm.toggle_maximize(self.window);
    }

    /// Start the exit animation. The manager close runs from [`tick`](Self::tick)
    /// once the delay has elapsed. Repeated requests keep the first deadline.
    pub fn request_close(&mut self, now: Instant, config: &ControllerConfig) -> bool {
        self.gesture = Gesture::Idle;
        if self.close_at.is_some() {
            return false;
        }
        self.close_at = Some(now + config.close_delay);
        true
    }

    /// Advance the mount timer. Returns the close deadline once it has passed;
    /// the caller removes the window.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        if self.mount_until.is_some_and(|until| now >= until) {
            self.mount_until = None;
        }
        self.close_at.filter(|&at| now >= at)
    }

    pub fn presentation(
        &self,
        minimized: bool,
        now: Instant,
        config: &ControllerConfig,
    ) -> Presentation {
        Presentation::new(
            self.is_mounting(now),
            self.is_closing(),
            minimized,
            self.gesture != Gesture::Idle,
            config.transition,
        )
    }

    pub fn displayed_bounds(&mut self, target: Bounds, transition: Transition, now: Instant) -> Bounds {
        self.animator.follow(target, transition, now)
    }
}

fn clamp_to_viewport(p: Point, width: i32, viewport: Viewport) -> Point {
    let work = viewport.work_area();
    let min_x = CLAMP_KEEP_VISIBLE - width;
    let max_x = (work.width - CLAMP_KEEP_VISIBLE).max(min_x);
    let max_y = (work.height - CLAMP_KEEP_VISIBLE).max(0);
    Point::new(p.x.clamp(min_x, max_x), p.y.clamp(0, max_y))
}

// ── Registry & pointer capture ────────────────────────────────────────────────

/// All live controllers plus the single pointer capture.
///
/// A capture is installed when a drag or resize begins and is the only route
/// pointer-move and pointer-up events take while it exists, wherever on screen
/// they land. Every exit path (pointer up, close request, window removal)
/// releases it.
#[derive(Debug, Default)]
pub struct Controllers {
    config: ControllerConfig,
    by_window: HashMap<WindowId, InteractionController>,
    capture: Option<WindowId>,
}

impl Controllers {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            by_window: HashMap::new(),
            capture: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Attach controllers to new windows and drop those whose window is gone.
    pub fn sync<C, P>(&mut self, wm: &WindowManager<C, P>, now: Instant) {
        for win in wm.windows() {
            let id = win.id();
            self.by_window
                .entry(id)
                .or_insert_with(|| InteractionController::new(id, now, &self.config));
        }
        let stale: Vec<WindowId> = self
            .by_window
            .keys()
            .copied()
            .filter(|id| !wm.contains(*id))
            .collect();
        for id in stale {
            self.remove(id);
        }
    }

    pub fn get(&self, id: WindowId) -> Option<&InteractionController> {
        self.by_window.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_window.is_empty()
    }

    pub fn captured(&self) -> Option<WindowId> {
        self.capture
    }

    pub fn begin_drag<C, P>(&mut self, id: WindowId, wm: &mut WindowManager<C, P>, pointer: Point) -> bool {
        self.release_capture();
        let started = self
            .by_window
            .get_mut(&id)
            .is_some_and(|ctrl| ctrl.begin_drag(wm, pointer));
        if started {
            self.capture = Some(id);
        }
        started
    }

    pub fn begin_resize<C, P>(&mut self, id: WindowId, wm: &WindowManager<C, P>, pointer: Point) -> bool {
        self.release_capture();
        let started = self
            .by_window
            .get_mut(&id)
            .is_some_and(|ctrl| ctrl.begin_resize(wm, pointer));
        if started {
            self.capture = Some(id);
        }
        started
    }

    /// Route a pointer move to the capturing controller. False when nothing
    /// holds the capture.
    pub fn pointer_move<C, P>(
        &mut self,
        wm: &mut WindowManager<C, P>,
        pointer: Point,
        viewport: Viewport,
    ) -> bool {
        let Some(id) = self.capture else {
            return false;
        };
        match self.by_window.get_mut(&id) {
            Some(ctrl) => {
                ctrl.pointer_move(wm, pointer, viewport, &self.config);
                true
            }
            None => {
                self.capture = None;
                false
            }
        }
    }

    /// Pointer released anywhere. True if it ended a gesture.
    pub fn pointer_up(&mut self) -> bool {
        let had_capture = self.capture.is_some();
        self.release_capture();
        had_capture
    }

    pub fn double_click_title<C, P>(&mut self, id: WindowId, wm: &mut WindowManager<C, P>) {
        if let Some(ctrl) = self.by_window.get_mut(&id) {
            ctrl.double_click_title(wm);
        }
    }

    /// Start the close animation. The close cue sounds now; the record is
    /// removed by [`tick`](Self::tick) when the animation ends.
    pub fn request_close<C, P>(
        &mut self,
        id: WindowId,
        wm: &WindowManager<C, P>,
        now: Instant,
    ) -> bool {
        if self.capture == Some(id) {
            self.release_capture();
        }
        let started = self
            .by_window
            .get_mut(&id)
            .is_some_and(|ctrl| ctrl.request_close(now, &self.config));
        if started {
            wm.events().emit(Notification::Close(id));
        }
        started
    }

    /// Run every controller's timers; returns the windows closed this tick,
    /// in the order their closes were requested.
    pub fn tick<C, P>(&mut self, wm: &mut WindowManager<C, P>, now: Instant) -> Vec<WindowId> {
        let mut due: Vec<(Instant, WindowId)> = self
            .by_window
            .iter_mut()
            .filter_map(|(id, ctrl)| ctrl.tick(now).map(|at| (at, *id)))
            .collect();
        due.sort();
        due.into_iter()
            .map(|(_, id)| {
                wm.finish_close(id);
                self.remove(id);
                id
            })
            .collect()
    }

    pub fn presentation(&self, id: WindowId, minimized: bool, now: Instant) -> Presentation {
        match self.by_window.get(&id) {
            Some(ctrl) => ctrl.presentation(minimized, now, &self.config),
            None => Presentation::new(false, false, minimized, false, self.config.transition),
        }
    }

    pub fn displayed_bounds(
        &mut self,
        id: WindowId,
        target: Bounds,
        transition: Transition,
        now: Instant,
    ) -> Bounds {
        match self.by_window.get_mut(&id) {
            Some(ctrl) => ctrl.displayed_bounds(target, transition, now),
            None => target,
        }
    }

    fn remove(&mut self, id: WindowId) {
        if self.capture == Some(id) {
            self.capture = None;
        }
        self.by_window.remove(&id);
    }

    fn release_capture(&mut self) {
        if let Some(id) = self.capture.take() {
            if let Some(ctrl) = self.by_window.get_mut(&id) {
                ctrl.end_gesture();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{AppCatalog, AppDefinition};
    use crate::core::events::EventBus;
    use crate::core::manager::{FocusOnClose, WmConfig};

    fn unit(_: Option<&()>) {}

    fn manager() -> WindowManager<()> {
        let catalog = AppCatalog::new(vec![AppDefinition {
            id: "notepad",
            name: "Notepad",
            icon: "N",
            default_size: Some(Size::new(500, 400)),
            description: "",
            factory: unit,
        }]);
        WindowManager::new(catalog, WmConfig::default(), EventBus::new())
    }

    fn viewport() -> Viewport {
        Viewport::new(1200, 800, 20)
    }

    fn setup() -> (WindowManager<()>, Controllers, WindowId, Instant) {
        let mut wm = manager();
        let id = wm.open("notepad", None).unwrap();
        let now = Instant::now();
        let mut ctrls = Controllers::new(ControllerConfig::default());
        ctrls.sync(&wm, now);
        (wm, ctrls, id, now)
    }

    #[test]
    fn drag_moves_window_by_pointer_delta() {
        let (mut wm, mut ctrls, id, _) = setup();
        assert!(ctrls.begin_drag(id, &mut wm, Point::new(60, 55)));
        assert_eq!(ctrls.captured(), Some(id));
        assert!(matches!(
            ctrls.get(id).unwrap().gesture(),
            Gesture::Dragging { offset } if offset == Point::new(10, 5)
        ));
        ctrls.pointer_move(&mut wm, Point::new(160, 255), viewport());
        assert_eq!(wm.get(id).unwrap().position(), Point::new(150, 250));
        ctrls.pointer_move(&mut wm, Point::new(-400, 2000), viewport());
        assert_eq!(wm.get(id).unwrap().position(), Point::new(-410, 1995));
        assert!(ctrls.pointer_up());
        assert_eq!(ctrls.get(id).unwrap().gesture(), Gesture::Idle);
        assert!(!ctrls.pointer_move(&mut wm, Point::new(0, 0), viewport()));
        assert_eq!(wm.get(id).unwrap().position(), Point::new(-410, 1995));
    }

    #[test]
    fn drag_focuses_even_when_maximized() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("notepad", None).unwrap();
        let mut ctrls = Controllers::new(ControllerConfig::default());
        ctrls.sync(&wm, Instant::now());
        wm.toggle_maximize(a);
        assert!(!ctrls.begin_drag(a, &mut wm, Point::new(60, 60)));
        assert_eq!(wm.active_id(), Some(a));
        assert!(wm.get(a).unwrap().z_index() > wm.get(b).unwrap().z_index());
        assert_eq!(ctrls.captured(), None);
    }

    #[test]
    fn clamped_drag_keeps_title_reachable() {
        let (mut wm, _, id, now) = setup();
        let config = ControllerConfig {
            clamp_drag_to_viewport: true,
            ..ControllerConfig::default()
        };
        let mut ctrls = Controllers::new(config);
        ctrls.sync(&wm, now);
        ctrls.begin_drag(id, &mut wm, Point::new(50, 50));
        ctrls.pointer_move(&mut wm, Point::new(-5000, -5000), viewport());
        assert_eq!(wm.get(id).unwrap().position(), Point::new(40 - 500, 0));
        ctrls.pointer_move(&mut wm, Point::new(5000, 5000), viewport());
        assert_eq!(wm.get(id).unwrap().position(), Point::new(1160, 740));
    }

    #[test]
    fn resize_adds_delta_and_floors_at_minimum() {
        let (mut wm, mut ctrls, id, _) = setup();
        assert!(ctrls.begin_resize(id, &wm, Point::new(550, 450)));
        ctrls.pointer_move(&mut wm, Point::new(600, 470), viewport());
        assert_eq!(wm.get(id).unwrap().size(), Size::new(550, 420));
        ctrls.pointer_move(&mut wm, Point::new(0, 0), viewport());
        assert_eq!(wm.get(id).unwrap().size(), Size::new(300, 200));
        assert_eq!(wm.get(id).unwrap().position(), Point::new(50, 50));
        ctrls.pointer_up();
        assert_eq!(ctrls.captured(), None);
    }

    #[test]
    fn resize_is_refused_while_maximized() {
        let (mut wm, mut ctrls, id, _) = setup();
        wm.toggle_maximize(id);
        assert!(!ctrls.begin_resize(id, &wm, Point::new(550, 450)));
        assert_eq!(ctrls.get(id).unwrap().gesture(), Gesture::Idle);
    }

    #[test]
    fn starting_a_new_gesture_releases_the_old_capture() {
        let mut wm = manager();
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("notepad", None).unwrap();
        let mut ctrls = Controllers::new(ControllerConfig::default());
        ctrls.sync(&wm, Instant::now());
        ctrls.begin_drag(a, &mut wm, Point::new(60, 60));
        ctrls.begin_resize(b, &wm, Point::new(600, 500));
        assert_eq!(ctrls.captured(), Some(b));
        assert_eq!(ctrls.get(a).unwrap().gesture(), Gesture::Idle);
    }

    #[test]
    fn double_click_toggles_maximize_only_when_idle() {
        let (mut wm, mut ctrls, id, _) = setup();
        wm.events().drain();
        ctrls.double_click_title(id, &mut wm);
        assert!(wm.get(id).unwrap().is_maximized());
        assert_eq!(
            wm.events().drain(),
            vec![Notification::Click, Notification::Maximize(id)]
        );
        ctrls.double_click_title(id, &mut wm);
        assert!(!wm.get(id).unwrap().is_maximized());
        assert_eq!(wm.events().drain(), vec![Notification::Restore(id)]);

        ctrls.begin_drag(id, &mut wm, Point::new(60, 60));
        ctrls.double_click_title(id, &mut wm);
        assert!(!wm.get(id).unwrap().is_maximized());
    }

    #[test]
    fn close_waits_for_exit_animation() {
        let (mut wm, mut ctrls, id, now) = setup();
        ctrls.begin_drag(id, &mut wm, Point::new(60, 60));
        wm.events().drain();
        assert!(ctrls.request_close(id, &wm, now));
        assert_eq!(wm.events().drain(), vec![Notification::Close(id)]);
        assert_eq!(ctrls.captured(), None);
        assert_eq!(ctrls.get(id).unwrap().gesture(), Gesture::Idle);
        assert!(ctrls.get(id).unwrap().is_closing());

        assert!(ctrls.tick(&mut wm, now + Duration::from_millis(199)).is_empty());
        assert!(wm.contains(id));
        assert_eq!(ctrls.tick(&mut wm, now + Duration::from_millis(200)), vec![id]);
        assert!(!wm.contains(id));
        assert!(ctrls.get(id).is_none());
        assert!(wm.events().drain().is_empty());
    }

    #[test]
    fn closes_due_in_one_frame_apply_in_request_order() {
        let catalog = AppCatalog::new(vec![AppDefinition {
            id: "notepad",
            name: "Notepad",
            icon: "N",
            default_size: None,
            description: "",
            factory: unit,
        }]);
        let config = WmConfig {
            focus_on_close: FocusOnClose::Topmost,
            ..WmConfig::default()
        };
        let mut wm: WindowManager<()> = WindowManager::new(catalog, config, EventBus::new());
        let a = wm.open("notepad", None).unwrap();
        let b = wm.open("notepad", None).unwrap();
        let c = wm.open("notepad", None).unwrap();
        let now = Instant::now();
        let mut ctrls = Controllers::new(ControllerConfig::default());
        ctrls.sync(&wm, now);
        wm.events().drain();

        ctrls.request_close(c, &wm, now);
        ctrls.request_close(a, &wm, now + Duration::from_millis(5));
        ctrls.request_close(b, &wm, now + Duration::from_millis(10));
        assert_eq!(
            wm.events().drain(),
            vec![
                Notification::Close(c),
                Notification::Close(a),
                Notification::Close(b)
            ]
        );

        let closed = ctrls.tick(&mut wm, now + Duration::from_secs(1));
        assert_eq!(closed, vec![c, a, b]);
        assert_eq!(wm.events().drain(), vec![Notification::FocusChanged(b)]);
        assert!(wm.is_empty());
    }

    #[test]
    fn duplicate_close_is_idempotent() {
        let (mut wm, mut ctrls, id, now) = setup();
        wm.events().drain();
        assert!(ctrls.request_close(id, &wm, now));
        assert!(!ctrls.request_close(id, &wm, now + Duration::from_millis(150)));
        ctrls.tick(&mut wm, now + Duration::from_millis(200));
        assert_eq!(wm.events().drain(), vec![Notification::Close(id)]);
        assert!(!ctrls.request_close(id, &wm, now + Duration::from_millis(250)));
        assert!(wm.close(id).is_none());
        assert!(wm.is_empty());
    }

    #[test]
    fn closing_window_ignores_new_gestures() {
        let (mut wm, mut ctrls, id, now) = setup();
        ctrls.request_close(id, &wm, now);
        assert!(!ctrls.begin_drag(id, &mut wm, Point::new(60, 60)));
        assert!(!ctrls.begin_resize(id, &wm, Point::new(60, 60)));
        ctrls.double_click_title(id, &mut wm);
        assert!(!wm.get(id).unwrap().is_maximized());
    }

    #[test]
    fn mount_flag_clears_after_delay() {
        let (mut wm, mut ctrls, id, now) = setup();
        assert!(ctrls.get(id).unwrap().is_mounting(now));
        assert!(ctrls.presentation(id, false, now).opacity < 1.0);
        ctrls.tick(&mut wm, now + Duration::from_millis(50));
        assert!(!ctrls.get(id).unwrap().is_mounting(now));
        assert!(ctrls.presentation(id, false, now).is_settled());
    }

    #[test]
    fn removing_window_mid_drag_drops_capture() {
        let (mut wm, mut ctrls, id, now) = setup();
        ctrls.begin_drag(id, &mut wm, Point::new(60, 60));
        wm.close(id);
        ctrls.sync(&wm, now);
        assert_eq!(ctrls.captured(), None);
        assert!(ctrls.is_empty());
        assert!(!ctrls.pointer_move(&mut wm, Point::new(90, 90), viewport()));
    }

    #[test]
    fn gesture_switches_presentation_to_immediate() {
        let (mut wm, mut ctrls, id, now) = setup();
        ctrls.begin_drag(id, &mut wm, Point::new(60, 60));
        assert_eq!(
            ctrls.presentation(id, false, now).transition,
            Transition::Immediate
        );
        ctrls.pointer_up();
        assert!(matches!(
            ctrls.presentation(id, false, now).transition,
            Transition::Animated(_)
        ));
    }
}
