//! Taskbar, start menu, desktop icons and the desktop context menu.
//!
//! Everything here goes through the [`WindowManager`] operations; the chrome
//! never touches a window record directly.

use crate::apps::{AppHandle, ShellManager, ShellProps, SETTINGS_APP};
use crate::core::{AppDefinition, EventBus, Notification, WindowId};
use crate::error::ShellError;

/// One taskbar button, in window creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: WindowId,
    pub title: String,
    pub icon: &'static str,
    pub active: bool,
    pub minimized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    Refresh,
    NewFolder,
    Personalize,
}

pub const CONTEXT_MENU: [(&str, ContextAction); 3] = [
    ("Refresh", ContextAction::Refresh),
    ("New Folder", ContextAction::NewFolder),
    ("Personalize", ContextAction::Personalize),
];

/// Where the context menu was opened, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuAnchor {
    pub col: u16,
    pub row: u16,
}

#[derive(Debug)]
pub struct Chrome {
    props: ShellProps,
    events: EventBus,
    start_open: bool,
    context_menu: Option<MenuAnchor>,
    selected_icon: Option<&'static str>,
    powered_off: bool,
}

impl Chrome {
    pub fn new(props: ShellProps, events: EventBus) -> Self {
        Self {
            props,
            events,
            start_open: false,
            context_menu: None,
            selected_icon: None,
            powered_off: false,
        }
    }

    pub fn props(&self) -> &ShellProps {
        &self.props
    }

    pub fn is_start_open(&self) -> bool {
        self.start_open
    }

    pub fn context_menu(&self) -> Option<MenuAnchor> {
        self.context_menu
    }

    pub fn selected_icon(&self) -> Option<&'static str> {
        self.selected_icon
    }

    pub fn is_powered_off(&self) -> bool {
        self.powered_off
    }

    // ── Taskbar ───────────────────────────────────────────────────────────────

    pub fn taskbar_entries(&self, wm: &ShellManager) -> Vec<TaskEntry> {
        let active = wm.active_id();
        wm.windows()
            .iter()
            .map(|w| TaskEntry {
                id: w.id(),
                title: w.title().to_string(),
                icon: w.icon(),
                active: active == Some(w.id()),
                minimized: w.is_minimized(),
            })
            .collect()
    }

    /// Minimized windows are restored; anything else is brought to front.
    pub fn activate_taskbar_entry(&mut self, wm: &mut ShellManager, id: WindowId) {
        self.context_menu = None;
        match wm.get(id) {
            Some(w) if w.is_minimized() => wm.toggle_minimize(id),
            Some(_) => wm.focus(id),
            None => {}
        }
    }

    // ── Start menu ────────────────────────────────────────────────────────────

    pub fn toggle_start_menu(&mut self) {
        self.start_open = !self.start_open;
        self.context_menu = None;
        self.events.emit(Notification::Click);
    }

    /// Open an application and dismiss any menu that led there.
    pub fn launch(&mut self, wm: &mut ShellManager, app_id: &str) -> Result<WindowId, ShellError> {
        self.start_open = false;
        self.context_menu = None;
        wm.open(app_id, Some(&self.props))
    }

    /// Close every window and ask the desktop loop to stop.
    pub fn power_off(&mut self, wm: &mut ShellManager) {
        self.start_open = false;
        self.context_menu = None;
        let closed = wm.close_all();
        tracing::info!(windows = closed.len(), "powering off");
        self.events.emit(Notification::PowerOff);
        self.powered_off = true;
    }

    // ── Desktop ───────────────────────────────────────────────────────────────

    /// Icons shown on the desktop: every app except settings.
    pub fn desktop_icons<'a>(
        &self,
        wm: &'a ShellManager,
    ) -> Vec<&'a AppDefinition<AppHandle, ShellProps>> {
        wm.catalog().iter().filter(|a| a.id != SETTINGS_APP).collect()
    }

    /// Single click selects, double click opens.
    pub fn click_icon(
        &mut self,
        wm: &mut ShellManager,
        app_id: &'static str,
        double: bool,
    ) -> Option<WindowId> {
        self.context_menu = None;
        if double {
            self.selected_icon = None;
            match self.launch(wm, app_id) {
                Ok(id) => return Some(id),
                Err(err) => tracing::warn!("{err}"),
            }
        } else {
            self.selected_icon = Some(app_id);
            self.events.emit(Notification::Click);
        }
        None
    }

    /// Any click that lands outside the menus closes them; closing the
    /// start menu this way clicks.
    pub fn dismiss_menus(&mut self) {
        if self.start_open {
            self.events.emit(Notification::Click);
        }
        self.start_open = false;
        self.context_menu = None;
    }

    /// Click on bare wallpaper: close menus and drop focus.
    pub fn click_background(&mut self, wm: &mut ShellManager) {
        self.dismiss_menus();
        self.selected_icon = None;
        wm.blur();
    }

    pub fn open_context_menu(&mut self, at: MenuAnchor) {
        self.start_open = false;
        self.context_menu = Some(at);
    }

    pub fn choose_context_action(&mut self, wm: &mut ShellManager, action: ContextAction) {
        self.context_menu = None;
        if action == ContextAction::Personalize {
            if let Err(err) = self.launch(wm, SETTINGS_APP) {
                tracing::warn!("{err}");
            }
        }
        self.events.emit(Notification::Click);
    }

    /// Esc: dismiss whatever menu is up. True if something closed.
    pub fn close_menus(&mut self) -> bool {
        let was_open = self.start_open || self.context_menu.is_some();
        self.start_open = false;
        self.context_menu = None;
        was_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::catalog;
    use crate::core::WmConfig;

    fn setup() -> (ShellManager, Chrome, EventBus) {
        let events = EventBus::new();
        let wm = ShellManager::new(catalog(), WmConfig::default(), events.clone());
        let chrome = Chrome::new(ShellProps::new(0), events.clone());
        (wm, chrome, events)
    }

    #[test]
    fn taskbar_lists_windows_in_creation_order() {
        let (mut wm, mut chrome, _) = setup();
        let a = chrome.launch(&mut wm, "notepad").unwrap();
        let b = chrome.launch(&mut wm, "paint").unwrap();
        wm.focus(a);
        wm.toggle_minimize(b);
        let entries = chrome.taskbar_entries(&wm);
        assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), [a, b]);
        assert!(entries[0].active && !entries[0].minimized);
        assert!(!entries[1].active && entries[1].minimized);
    }

    #[test]
    fn taskbar_click_restores_or_focuses() {
        let (mut wm, mut chrome, _) = setup();
        let a = chrome.launch(&mut wm, "notepad").unwrap();
        let b = chrome.launch(&mut wm, "paint").unwrap();
        wm.toggle_minimize(b);
        chrome.activate_taskbar_entry(&mut wm, b);
        assert!(!wm.get(b).unwrap().is_minimized());

        chrome.activate_taskbar_entry(&mut wm, a);
        assert_eq!(wm.active_id(), Some(a));
        assert!(wm.get(a).unwrap().z_index() > wm.get(b).unwrap().z_index());
    }

    #[test]
    fn launching_closes_start_menu() {
        let (mut wm, mut chrome, events) = setup();
        chrome.toggle_start_menu();
        assert!(chrome.is_start_open());
        assert_eq!(events.drain(), [Notification::Click]);
        let id = chrome.launch(&mut wm, "terminal").unwrap();
        assert!(!chrome.is_start_open());
        assert_eq!(events.drain(), [Notification::Open(id)]);
    }

    #[test]
    fn unknown_app_creates_nothing() {
        let (mut wm, mut chrome, _) = setup();
        assert_eq!(
            chrome.launch(&mut wm, "calculator"),
            Err(ShellError::UnknownApp("calculator".into()))
        );
        assert!(wm.is_empty());
    }

    #[test]
    fn background_click_clears_focus_and_menus() {
        let (mut wm, mut chrome, events) = setup();
        chrome.launch(&mut wm, "notepad").unwrap();
        chrome.toggle_start_menu();
        events.drain();
        chrome.click_background(&mut wm);
        assert!(!chrome.is_start_open());
        assert_eq!(wm.active_id(), None);
        assert_eq!(events.drain().first(), Some(&Notification::Click));
    }

    #[test]
    fn icons_skip_settings_and_double_click_opens() {
        let (mut wm, mut chrome, events) = setup();
        let ids: Vec<&str> = chrome.desktop_icons(&wm).iter().map(|a| a.id).collect();
        assert!(!ids.contains(&SETTINGS_APP));
        assert_eq!(ids.len(), wm.catalog().len() - 1);

        assert_eq!(chrome.click_icon(&mut wm, "explorer", false), None);
        assert_eq!(chrome.selected_icon(), Some("explorer"));
        assert_eq!(events.drain(), [Notification::Click]);
        let id = chrome.click_icon(&mut wm, "explorer", true);
        assert!(id.is_some());
        assert_eq!(wm.len(), 1);
    }

    #[test]
    fn personalize_opens_settings() {
        let (mut wm, mut chrome, _) = setup();
        chrome.open_context_menu(MenuAnchor { col: 5, row: 5 });
        assert!(chrome.context_menu().is_some());
        chrome.choose_context_action(&mut wm, ContextAction::Personalize);
        assert!(chrome.context_menu().is_none());
        assert_eq!(wm.windows()[0].app_id(), SETTINGS_APP);
    }

    #[test]
    fn power_off_closes_everything() {
        let (mut wm, mut chrome, events) = setup();
        chrome.launch(&mut wm, "notepad").unwrap();
        chrome.launch(&mut wm, "game").unwrap();
        events.drain();
        chrome.power_off(&mut wm);
        assert!(wm.is_empty());
        assert!(chrome.is_powered_off());
        assert_eq!(events.drain(), [Notification::PowerOff]);
    }
}
