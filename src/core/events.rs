use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::window::WindowId;

/// Discrete UX events consumed by the sound collaborator. Each user action
/// produces at most one of each, in the order the operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Open(WindowId),
    Close(WindowId),
    FocusChanged(WindowId),
    Minimize(WindowId),
    Restore(WindowId),
    Maximize(WindowId),
    Click,
    /// Every window was dropped at once.
    PowerOff,
}

impl Notification {
    pub fn name(self) -> &'static str {
        match self {
            Notification::Open(_) => "open",
            Notification::Close(_) => "close",
            Notification::FocusChanged(_) => "focus-changed",
            Notification::Minimize(_) => "minimize",
            Notification::Restore(_) => "restore",
            Notification::Maximize(_) => "maximize",
            Notification::Click => "click",
            Notification::PowerOff => "power-off",
        }
    }

    pub fn window(self) -> Option<WindowId> {
        match self {
            Notification::Open(id)
            | Notification::Close(id)
            | Notification::FocusChanged(id)
            | Notification::Minimize(id)
            | Notification::Restore(id)
            | Notification::Maximize(id) => Some(id),
            Notification::Click | Notification::PowerOff => None,
        }
    }
}

/// Single-threaded FIFO shared by the manager, the controllers and the
/// chrome. The desktop loop drains it after each dispatched input event.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    queue: Rc<RefCell<VecDeque<Notification>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Notification) {
        tracing::trace!(event = event.name(), "notify");
        self.queue.borrow_mut().push_back(event);
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_queue_in_order() {
        let bus = EventBus::new();
        let other = bus.clone();
        let id = WindowId::from_raw(3);
        bus.emit(Notification::Open(id));
        other.emit(Notification::Click);
        assert_eq!(
            bus.drain(),
            vec![Notification::Open(id), Notification::Click]
        );
        assert!(other.is_empty());
    }

    #[test]
    fn names_match_event_contract() {
        let id = WindowId::from_raw(1);
        assert_eq!(Notification::FocusChanged(id).name(), "focus-changed");
        assert_eq!(Notification::Click.window(), None);
        assert_eq!(Notification::PowerOff.name(), "power-off");
        assert_eq!(Notification::Restore(id).window(), Some(id));
    }
}
