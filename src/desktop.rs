use anyhow::Result;
use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};

use crate::apps::{catalog, clip, AppRequest, ShellManager, ShellProps};
use crate::chrome::{Chrome, MenuAnchor, TaskEntry, CONTEXT_MENU};
use crate::config::{
    get_settings, persist_settings, update_settings, wallpaper_index, CellSettings, Settings,
    WALLPAPERS,
};
use crate::core::{
    compose, hit_test, Bounds, Controllers, EventBus, Notification, Point, Presentation,
    SceneWindow, Viewport, WindowId,
};
use crate::sound;
use crate::ui::{
    dim_style, fade, normal_style, point_in_rect, sel_style, title_style, write_text,
    write_text_in_area, Term,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopExit {
    Quit,
    PowerOff,
}

const FRAME_POLL: Duration = Duration::from_millis(16);
const TITLE_MIN_BUTTON: &str = "[-]";
const TITLE_MAX_BUTTON: &str = "[+]";
const TITLE_RESTORE_BUTTON: &str = "[R]";
const TITLE_CLOSE_BUTTON: &str = "[X]";
const TITLE_BUTTONS_W: i32 = 9;
const TASK_START_BUTTON: &str = "[Start]";
const TASK_START_SEPARATOR: &str = " | ";
const TASK_CLOCK_W: u16 = 7;
const RESIZE_GRIP: &str = "◢";
const START_MENU_W: u16 = 26;
const CONTEXT_MENU_W: u16 = 16;
const ICON_W: u16 = 12;
const ICON_SPACING: u16 = 3;

// ── Pixel / cell projection ───────────────────────────────────────────────────

/// Maps the manager's logical pixels onto terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Projection {
    px_per_col: i32,
    px_per_row: i32,
}

impl Projection {
    fn new(cells: CellSettings) -> Self {
        Self {
            px_per_col: cells.px_per_col.max(1),
            px_per_row: cells.px_per_row.max(1),
        }
    }

    /// The taskbar is the bottom row.
    fn viewport(self, screen: Rect) -> Viewport {
        Viewport::new(
            i32::from(screen.width) * self.px_per_col,
            i32::from(screen.height) * self.px_per_row,
            self.px_per_row,
        )
    }

    fn to_cells(self, b: Bounds) -> WinRect {
        WinRect {
            x: b.x.div_euclid(self.px_per_col),
            y: b.y.div_euclid(self.px_per_row),
            w: ((b.width + self.px_per_col / 2) / self.px_per_col).max(1),
            h: ((b.height + self.px_per_row / 2) / self.px_per_row).max(1),
        }
    }

    /// Centre of the cell, in pixels.
    fn pointer(self, col: u16, row: u16) -> Point {
        Point::new(
            i32::from(col) * self.px_per_col + self.px_per_col / 2,
            i32::from(row) * self.px_per_row + self.px_per_row / 2,
        )
    }
}

/// A window rectangle in cells. May hang off any screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WinRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl WinRect {
    fn right(self) -> i32 {
        self.x + self.w
    }

    fn bottom(self) -> i32 {
        self.y + self.h
    }

    fn contains(self, col: u16, row: u16) -> bool {
        let (c, r) = (i32::from(col), i32::from(row));
        c >= self.x && c < self.right() && r >= self.y && r < self.bottom()
    }

    fn inner(self) -> WinRect {
        WinRect {
            x: self.x + 1,
            y: self.y + 1,
            w: self.w - 2,
            h: self.h - 2,
        }
    }

    /// The part of the rectangle inside `area`, if any.
    fn clip(self, area: Rect) -> Option<Rect> {
        let x0 = self.x.max(i32::from(area.x));
        let y0 = self.y.max(i32::from(area.y));
        let x1 = self.right().min(i32::from(area.right()));
        let y1 = self.bottom().min(i32::from(area.bottom()));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect {
            x: x0 as u16,
            y: y0 as u16,
            width: (x1 - x0) as u16,
            height: (y1 - y0) as u16,
        })
    }

    /// Border sides that are on screen.
    fn visible_borders(self, area: Rect) -> Borders {
        let mut borders = Borders::NONE;
        if self.y >= i32::from(area.y) {
            borders |= Borders::TOP;
        }
        if self.x >= i32::from(area.x) {
            borders |= Borders::LEFT;
        }
        if self.right() <= i32::from(area.right()) {
            borders |= Borders::RIGHT;
        }
        if self.bottom() <= i32::from(area.bottom()) {
            borders |= Borders::BOTTOM;
        }
        borders
    }

    /// Shrink about the centre and shift down for the transient states.
    fn presented(self, p: &Presentation, proj: Projection) -> WinRect {
        let scale = p.scale.clamp(0.0, 1.0);
        let w = ((self.w as f32) * scale).round().max(1.0) as i32;
        let h = ((self.h as f32) * scale).round().max(1.0) as i32;
        let drop = (p.offset_y + proj.px_per_row / 2).div_euclid(proj.px_per_row);
        WinRect {
            x: self.x + (self.w - w) / 2,
            y: self.y + (self.h - h) / 2 + drop,
            w,
            h,
        }
    }
}

// ── Hit testing ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowHit {
    Title,
    Minimize,
    Maximize,
    Close,
    Resize,
    Content,
    Border,
}

/// Which part of a window frame `(col, row)` lands on.
fn classify(rect: WinRect, maximized: bool, col: u16, row: u16) -> WindowHit {
    let (c, r) = (i32::from(col), i32::from(row));
    let right = rect.right();
    if r == rect.y {
        if rect.w >= TITLE_BUTTONS_W + 2 {
            if c >= right - 4 && c < right - 1 {
                return WindowHit::Close;
            }
            if c >= right - 7 && c < right - 4 {
                return WindowHit::Maximize;
            }
            if c >= right - 10 && c < right - 7 {
                return WindowHit::Minimize;
            }
        }
        return WindowHit::Title;
    }
    if !maximized && c == right - 1 && r == rect.bottom() - 1 {
        return WindowHit::Resize;
    }
    if c > rect.x && c < right - 1 && r < rect.bottom() - 1 {
        return WindowHit::Content;
    }
    WindowHit::Border
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickTarget {
    Title(WindowId),
    Icon(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct LastClick {
    target: ClickTarget,
    at: Instant,
}

fn is_double_click(
    last: &mut Option<LastClick>,
    target: ClickTarget,
    now: Instant,
    window: Duration,
) -> bool {
    if let Some(prev) = *last {
        if prev.target == target && now.saturating_duration_since(prev.at) <= window {
            *last = None;
            return true;
        }
    }
    *last = Some(LastClick { target, at: now });
    false
}

fn menu_row(rect: Rect, row: u16, len: usize) -> Option<usize> {
    if row <= rect.y || row + 1 >= rect.bottom() {
        return None;
    }
    let idx = usize::from(row - rect.y - 1);
    (idx < len).then_some(idx)
}

// ── Layout ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TaskButton {
    id: WindowId,
    rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartItem {
    App(&'static str),
    PowerOff,
}

fn full_rect(width: u16, height: u16) -> Rect {
    Rect {
        x: 0,
        y: 0,
        width,
        height,
    }
}

fn taskbar_area(size: Rect) -> Rect {
    Rect {
        x: size.x,
        y: size.y + size.height.saturating_sub(1),
        width: size.width,
        height: if size.height > 1 { 1 } else { 0 },
    }
}

fn desktop_area(size: Rect) -> Rect {
    Rect {
        x: size.x,
        y: size.y,
        width: size.width,
        height: size.height.saturating_sub(1),
    }
}

fn start_button_rect(task: Rect) -> Rect {
    Rect {
        x: task.x,
        y: task.y,
        width: (TASK_START_BUTTON.len() as u16).min(task.width),
        height: task.height.min(1),
    }
}

fn task_button_text(entry: &TaskEntry) -> String {
    let label: String = entry.title.chars().take(16).collect();
    if entry.minimized {
        format!("({label})")
    } else {
        format!("[{label}]")
    }
}

/// Buttons that fit between the start button and the clock.
fn taskbar_layout(entries: &[TaskEntry], task: Rect) -> Vec<TaskButton> {
    if task.height == 0 || task.width == 0 {
        return Vec::new();
    }
    let start_w = start_button_rect(task).width;
    let sep_w = TASK_START_SEPARATOR.len() as u16;
    let end = task.right().saturating_sub(TASK_CLOCK_W);
    let mut x = task.x.saturating_add(start_w).saturating_add(sep_w);

    let mut buttons = Vec::new();
    for entry in entries {
        let width = task_button_text(entry).chars().count() as u16;
        if x.saturating_add(width) > end {
            break;
        }
        buttons.push(TaskButton {
            id: entry.id,
            rect: Rect {
                x,
                y: task.y,
                width,
                height: 1,
            },
        });
        x = x.saturating_add(width).saturating_add(1);
    }
    buttons
}

fn start_items(wm: &ShellManager) -> Vec<StartItem> {
    wm.catalog()
        .iter()
        .map(|app| StartItem::App(app.id))
        .chain(std::iter::once(StartItem::PowerOff))
        .collect()
}

fn start_item_label(wm: &ShellManager, item: StartItem) -> String {
    match item {
        StartItem::App(id) => match wm.catalog().find(id) {
            Some(app) => format!(" {} {}", app.icon, app.name),
            None => format!(" {id}"),
        },
        StartItem::PowerOff => " [!] Power Off".to_string(),
    }
}

/// Anchored to the bottom-left corner, just above the taskbar.
fn start_menu_rect(size: Rect, count: usize) -> Rect {
    let desk = desktop_area(size);
    let height = (count as u16).saturating_add(2).min(desk.height);
    Rect {
        x: desk.x,
        y: desk.bottom().saturating_sub(height),
        width: START_MENU_W.min(desk.width),
        height,
    }
}

/// Opens at the click, pushed back inside the desktop when it would spill.
fn context_menu_rect(at: MenuAnchor, desk: Rect) -> Rect {
    let width = CONTEXT_MENU_W.min(desk.width);
    let height = (CONTEXT_MENU.len() as u16 + 2).min(desk.height);
    Rect {
        x: at.col.min(desk.right().saturating_sub(width)).max(desk.x),
        y: at.row.min(desk.bottom().saturating_sub(height)).max(desk.y),
        width,
        height,
    }
}

/// Icons run down the left edge; ones that do not fit are not shown.
fn icon_rect(desk: Rect, idx: usize) -> Option<Rect> {
    let offset = u16::try_from(idx).ok()?.checked_mul(ICON_SPACING)?;
    let rect = Rect {
        x: desk.x.saturating_add(2),
        y: desk.y.saturating_add(1).checked_add(offset)?,
        width: ICON_W,
        height: 2,
    };
    (rect.bottom() <= desk.bottom() && rect.right() <= desk.right()).then_some(rect)
}

// ── State ─────────────────────────────────────────────────────────────────────

struct DesktopState {
    wm: ShellManager,
    controllers: Controllers,
    chrome: Chrome,
    events: EventBus,
    projection: Projection,
    double_click: Duration,
    last_click: Option<LastClick>,
    /// Window whose content took the last press; drags go there.
    content_press: Option<WindowId>,
    start_selected: usize,
    cursor: (u16, u16),
    scene: Vec<SceneWindow>,
    screen: Rect,
    wallpaper: usize,
}

impl DesktopState {
    fn new(settings: &Settings) -> Self {
        let events = EventBus::new();
        let wallpaper = wallpaper_index(&settings.wallpaper);
        let wm = ShellManager::new(catalog(), settings.wm_config(), events.clone());
        Self {
            wm,
            controllers: Controllers::new(settings.controller_config()),
            chrome: Chrome::new(ShellProps::new(wallpaper), events.clone()),
            events,
            projection: Projection::new(settings.cells),
            double_click: settings.double_click_window(),
            last_click: None,
            content_press: None,
            start_selected: 0,
            cursor: (0, 0),
            scene: Vec::new(),
            screen: Rect::default(),
            wallpaper,
        }
    }

    fn viewport(&self) -> Viewport {
        self.projection.viewport(self.screen)
    }

    /// Per-frame housekeeping: controller timers, app ticks, persisted
    /// wallpaper, queued notifications.
    fn step(&mut self, now: Instant) {
        self.controllers.sync(&self.wm, now);
        for id in self.controllers.tick(&mut self.wm, now) {
            tracing::debug!(window = %id, "close animation finished");
        }
        for (_, content) in self.wm.contents_mut() {
            content.tick(now);
        }
        if self.content_press.is_some_and(|id| !self.wm.contains(id)) {
            self.content_press = None;
        }
        self.sync_wallpaper();
        self.flush_events();
    }

    fn sync_wallpaper(&mut self) {
        let current = self.chrome.props().wallpaper();
        if current == self.wallpaper {
            return;
        }
        self.wallpaper = current;
        if let Some((name, _, _)) = WALLPAPERS.get(current) {
            tracing::info!(wallpaper = name, "wallpaper changed");
            update_settings(|s| s.wallpaper = (*name).to_string());
            persist_settings();
        }
    }

    fn flush_events(&mut self) {
        let events = self.events.drain();
        for ev in &events {
            tracing::trace!(event = ev.name(), window = ?ev.window(), "notification");
        }
        sound::play_notifications(&events);
    }

    fn refresh_scene(&mut self, now: Instant) {
        let viewport = self.viewport();
        self.scene = compose(&self.wm, &mut self.controllers, viewport, now);
    }

    fn scene_window(&self, id: WindowId) -> Option<SceneWindow> {
        self.scene.iter().find(|w| w.id == id).copied()
    }

    /// On-screen content area of a window, in cells.
    fn content_rect(&self, id: WindowId) -> Option<Rect> {
        let sw = self.scene_window(id)?;
        self.projection
            .to_cells(sw.bounds)
            .inner()
            .clip(desktop_area(self.screen))
    }

    fn is_closing(&self, id: WindowId) -> bool {
        self.controllers.get(id).is_some_and(|c| c.is_closing())
    }

    fn toggle_start_menu(&mut self) {
        self.chrome.toggle_start_menu();
        self.start_selected = 0;
    }

    fn launch(&mut self, app_id: &str) {
        if let Err(err) = self.chrome.launch(&mut self.wm, app_id) {
            tracing::warn!("{err}");
        }
    }

    fn run_start_item(&mut self, item: StartItem) {
        match item {
            StartItem::App(id) => self.launch(id),
            StartItem::PowerOff => self.chrome.power_off(&mut self.wm),
        }
    }

    fn apply_request(&mut self, request: AppRequest) {
        match request {
            AppRequest::None => {}
            AppRequest::Launch(app_id) => self.launch(app_id),
        }
    }

    fn close_window(&mut self, id: WindowId, now: Instant) {
        if self.controllers.request_close(id, &self.wm, now) {
            tracing::debug!(window = %id, "close requested");
        }
    }

    // ── Pointer presses ──────────────────────────────────────────────────────

    fn press(&mut self, col: u16, row: u16, now: Instant) {
        let desk = desktop_area(self.screen);
        let task = taskbar_area(self.screen);

        if let Some(anchor) = self.chrome.context_menu() {
            let rect = context_menu_rect(anchor, desk);
            if point_in_rect(col, row, rect) {
                if let Some(idx) = menu_row(rect, row, CONTEXT_MENU.len()) {
                    self.chrome.choose_context_action(&mut self.wm, CONTEXT_MENU[idx].1);
                }
                return;
            }
        }

        if self.chrome.is_start_open() {
            let items = start_items(&self.wm);
            let rect = start_menu_rect(self.screen, items.len());
            if point_in_rect(col, row, rect) {
                if let Some(idx) = menu_row(rect, row, items.len()) {
                    self.start_selected = idx;
                    self.run_start_item(items[idx]);
                }
                return;
            }
        }

        if point_in_rect(col, row, task) {
            if point_in_rect(col, row, start_button_rect(task)) {
                self.toggle_start_menu();
                return;
            }
            self.chrome.dismiss_menus();
            let entries = self.chrome.taskbar_entries(&self.wm);
            if let Some(btn) = taskbar_layout(&entries, task)
                .into_iter()
                .find(|b| point_in_rect(col, row, b.rect))
            {
                self.chrome.activate_taskbar_entry(&mut self.wm, btn.id);
            }
            return;
        }

        let pointer = self.projection.pointer(col, row);
        if let Some(id) = hit_test(&self.scene, pointer) {
            self.chrome.dismiss_menus();
            self.press_window(id, col, row, pointer, now);
            return;
        }

        let icons: Vec<&'static str> = self
            .chrome
            .desktop_icons(&self.wm)
            .iter()
            .map(|app| app.id)
            .collect();
        let hit_icon = icons.iter().enumerate().find_map(|(i, id)| {
            icon_rect(desk, i)
                .filter(|r| point_in_rect(col, row, *r))
                .map(|_| *id)
        });
        if let Some(app_id) = hit_icon {
            self.chrome.dismiss_menus();
            let double = is_double_click(
                &mut self.last_click,
                ClickTarget::Icon(app_id),
                now,
                self.double_click,
            );
            self.chrome.click_icon(&mut self.wm, app_id, double);
            return;
        }

        self.chrome.click_background(&mut self.wm);
    }

    fn press_window(&mut self, id: WindowId, col: u16, row: u16, pointer: Point, now: Instant) {
        let Some(sw) = self.scene_window(id) else {
            return;
        };
        let rect = self.projection.to_cells(sw.bounds);
        let hit = if rect.contains(col, row) {
            classify(rect, sw.maximized, col, row)
        } else {
            WindowHit::Border
        };
        tracing::trace!(window = %id, ?hit, "window press");

        match hit {
            // The grip resizes without raising the window.
            WindowHit::Resize => {
                self.controllers.begin_resize(id, &self.wm, pointer);
            }
            WindowHit::Title => {
                let double = is_double_click(
                    &mut self.last_click,
                    ClickTarget::Title(id),
                    now,
                    self.double_click,
                );
                if double {
                    self.wm.focus(id);
                    self.controllers.double_click_title(id, &mut self.wm);
                } else {
                    // Focuses even when a maximized window refuses the drag.
                    self.controllers.begin_drag(id, &mut self.wm, pointer);
                }
            }
            WindowHit::Minimize => {
                self.wm.focus(id);
                self.events.emit(Notification::Click);
                self.wm.toggle_minimize(id);
            }
            WindowHit::Maximize => {
                self.wm.focus(id);
                self.events.emit(Notification::Click);
                self.wm.toggle_maximize(id);
            }
            WindowHit::Close => {
                self.wm.focus(id);
                self.close_window(id, now);
            }
            WindowHit::Content => {
                self.wm.focus(id);
                self.content_press = Some(id);
                let Some(area) = self.content_rect(id) else {
                    return;
                };
                if !point_in_rect(col, row, area) {
                    return;
                }
                let request = match self.wm.content_mut(id) {
                    Some(content) => content.handle_click(col - area.x, row - area.y),
                    None => AppRequest::None,
                };
                self.apply_request(request);
            }
            WindowHit::Border => self.wm.focus(id),
        }
    }
}

// ── Event loop ────────────────────────────────────────────────────────────────

pub fn desktop_mode(terminal: &mut Term) -> Result<DesktopExit> {
    let _ = terminal.hide_cursor();
    execute!(terminal.backend_mut(), EnableMouseCapture)?;
    let result = run_desktop_loop(terminal);
    let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
    let _ = terminal.show_cursor();
    result
}

fn run_desktop_loop(terminal: &mut Term) -> Result<DesktopExit> {
    let mut state = DesktopState::new(&get_settings());
    tracing::info!(apps = state.wm.catalog().len(), "desktop started");

    loop {
        state.step(Instant::now());
        if state.chrome.is_powered_off() {
            return Ok(DesktopExit::PowerOff);
        }
        draw_desktop(terminal, &mut state)?;

        if event::poll(FRAME_POLL)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
                        continue;
                    }
                    if let Some(exit) = handle_key(&mut state, key) {
                        return Ok(exit);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut state, mouse, Instant::now()),
                Event::Resize(width, height) => state.screen = full_rect(width, height),
                _ => {}
            }
        }
    }
}

fn handle_key(state: &mut DesktopState, key: KeyEvent) -> Option<DesktopExit> {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(DesktopExit::Quit);
    }
    match key.code {
        KeyCode::F(10) => {
            state.toggle_start_menu();
            return None;
        }
        KeyCode::F(4) => {
            if let Some(id) = state.wm.active_id() {
                state.close_window(id, Instant::now());
            }
            return None;
        }
        KeyCode::Esc if state.chrome.close_menus() => return None,
        _ => {}
    }

    if state.chrome.is_start_open() {
        let items = start_items(&state.wm);
        match key.code {
            KeyCode::Up => state.start_selected = state.start_selected.saturating_sub(1),
            KeyCode::Down => {
                state.start_selected = (state.start_selected + 1).min(items.len() - 1)
            }
            KeyCode::Enter => {
                if let Some(item) = items.get(state.start_selected).copied() {
                    state.run_start_item(item);
                }
            }
            _ => {}
        }
        return None;
    }

    let id = state.wm.active_id()?;
    if state.is_closing(id) {
        return None;
    }
    let request = match state.wm.content_mut(id) {
        Some(content) => content.handle_key(key),
        None => AppRequest::None,
    };
    state.apply_request(request);
    None
}

fn handle_mouse(state: &mut DesktopState, mouse: MouseEvent, now: Instant) {
    let (col, row) = (mouse.column, mouse.row);
    state.cursor = (col, row);

    match mouse.kind {
        MouseEventKind::Drag(MouseButton::Left) => {
            let pointer = state.projection.pointer(col, row);
            let viewport = state.viewport();
            if state.controllers.pointer_move(&mut state.wm, pointer, viewport) {
                return;
            }
            let Some(id) = state.content_press else {
                return;
            };
            let Some(area) = state.content_rect(id) else {
                return;
            };
            if point_in_rect(col, row, area) {
                if let Some(content) = state.wm.content_mut(id) {
                    content.handle_drag(col - area.x, row - area.y);
                }
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            state.controllers.pointer_up();
            state.content_press = None;
        }
        MouseEventKind::Down(MouseButton::Left) => state.press(col, row, now),
        MouseEventKind::Down(MouseButton::Right) => {
            let desk = desktop_area(state.screen);
            let pointer = state.projection.pointer(col, row);
            if point_in_rect(col, row, desk) && hit_test(&state.scene, pointer).is_none() {
                state.chrome.open_context_menu(MenuAnchor { col, row });
            }
        }
        _ => {}
    }
}

// ── Drawing ───────────────────────────────────────────────────────────────────

fn draw_desktop(terminal: &mut Term, state: &mut DesktopState) -> Result<()> {
    let ts = terminal.size()?;
    state.screen = full_rect(ts.width, ts.height);
    state.refresh_scene(Instant::now());
    terminal.draw(|f| draw_frame(f, state))?;
    Ok(())
}

fn draw_frame(f: &mut Frame, state: &DesktopState) {
    let size = f.area();
    let desk = desktop_area(size);
    let task = taskbar_area(size);

    f.render_widget(Clear, size);
    draw_wallpaper(f, desk, state.chrome.props().wallpaper());
    draw_icons(f, state, desk);

    for sw in state.scene.iter().filter(|w| w.visible) {
        draw_window(f, state, sw, desk);
    }

    draw_taskbar(f, state, task);
    if state.chrome.is_start_open() {
        draw_start_menu(f, state, size);
    }
    if let Some(anchor) = state.chrome.context_menu() {
        draw_context_menu(f, anchor, desk);
    }
    draw_cursor(f, state.cursor.0, state.cursor.1, size);
}

fn draw_wallpaper(f: &mut Frame, area: Rect, wallpaper: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let (_, glyph, color) = WALLPAPERS.get(wallpaper).copied().unwrap_or(WALLPAPERS[0]);
    let style = Style::default().fg(color).add_modifier(Modifier::DIM);
    let fill = glyph.to_string().repeat(area.width as usize);
    let lines: Vec<Line> = (0..area.height)
        .map(|_| Line::from(Span::styled(fill.clone(), style)))
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_icons(f: &mut Frame, state: &DesktopState, desk: Rect) {
    for (i, app) in state.chrome.desktop_icons(&state.wm).iter().enumerate() {
        let Some(rect) = icon_rect(desk, i) else {
            break;
        };
        let selected = state.chrome.selected_icon() == Some(app.id);
        let (icon_style, label_style) = if selected {
            (sel_style(), sel_style())
        } else {
            (title_style(), normal_style())
        };
        let lines = vec![
            Line::from(Span::styled(format!(" {} ", app.icon), icon_style)),
            Line::from(Span::styled(clip(app.name, ICON_W as usize), label_style)),
        ];
        f.render_widget(Paragraph::new(lines), rect);
    }
}

fn draw_window(f: &mut Frame, state: &DesktopState, sw: &SceneWindow, desk: Rect) {
    let Some(win) = state.wm.get(sw.id) else {
        return;
    };
    let rect = state
        .projection
        .to_cells(sw.bounds)
        .presented(&sw.presentation, state.projection);
    let Some(area) = rect.clip(desk) else {
        return;
    };

    // Opaque over anything behind it.
    f.render_widget(Clear, area);
    let border_style = if sw.active { title_style() } else { dim_style() };
    f.render_widget(
        Block::default()
            .borders(rect.visible_borders(desk))
            .style(border_style),
        area,
    );

    if rect.w > 2 && rect.y >= i32::from(desk.y) {
        let title_color = if sw.active { sel_style() } else { dim_style() };
        let mut chars = vec![' '; (rect.w - 2) as usize];
        write_text(&mut chars, 0, &format!(" {} {} ", win.icon(), win.title()));
        let max_button = if sw.maximized {
            TITLE_RESTORE_BUTTON
        } else {
            TITLE_MAX_BUTTON
        };
        let buttons = format!("{TITLE_MIN_BUTTON}{max_button}{TITLE_CLOSE_BUTTON}");
        if chars.len() >= buttons.len() {
            let button_x = chars.len() - buttons.len();
            write_text(&mut chars, button_x, &buttons);
        }
        let title_row = WinRect {
            x: rect.x + 1,
            y: rect.y,
            w: rect.w - 2,
            h: 1,
        };
        if let Some(visible) = title_row.clip(desk) {
            let skip = (i32::from(visible.x) - title_row.x) as usize;
            let line: String = chars
                .into_iter()
                .skip(skip)
                .take(visible.width as usize)
                .collect();
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(line, title_color))),
                visible,
            );
        }
    }

    if let Some(inner) = rect.inner().clip(desk) {
        win.content().render(f, inner, sw.active);
    }

    if !sw.maximized {
        let grip = WinRect {
            x: rect.right() - 1,
            y: rect.bottom() - 1,
            w: 1,
            h: 1,
        };
        if let Some(cell) = grip.clip(desk) {
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(RESIZE_GRIP, border_style))),
                cell,
            );
        }
    }

    fade(f.buffer_mut(), area, sw.presentation.opacity);
}

fn draw_taskbar(f: &mut Frame, state: &DesktopState, area: Rect) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let width = area.width as usize;
    let mut row = vec![' '; width];
    let start = start_button_rect(area);
    write_text_in_area(&mut row, area, area.x, TASK_START_BUTTON);
    write_text_in_area(
        &mut row,
        area,
        area.x.saturating_add(start.width),
        TASK_START_SEPARATOR,
    );

    let entries = state.chrome.taskbar_entries(&state.wm);
    let layout = taskbar_layout(&entries, area);
    for btn in &layout {
        if let Some(entry) = entries.iter().find(|e| e.id == btn.id) {
            write_text_in_area(&mut row, area, btn.rect.x, &task_button_text(entry));
        }
    }

    let clock = Local::now().format("%H:%M").to_string();
    if width > clock.len() + 1 {
        write_text(&mut row, width - clock.len() - 1, &clock);
    }

    let line: String = row.into_iter().collect();
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(line, sel_style()))),
        area,
    );

    // Pressed-in look for the open start menu and the active window.
    if state.chrome.is_start_open() {
        f.buffer_mut().set_style(start, normal_style());
    }
    for btn in &layout {
        if entries.iter().any(|e| e.id == btn.id && e.active) {
            f.buffer_mut().set_style(btn.rect, normal_style());
        }
    }
}

fn draw_menu_box(f: &mut Frame, rect: Rect, title: &str, lines: Vec<Line>) {
    if rect.width < 4 || rect.height < 3 {
        return;
    }
    f.render_widget(Clear, rect);
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(title_style()),
        rect,
    );
    f.render_widget(
        Paragraph::new(lines),
        Rect {
            x: rect.x + 1,
            y: rect.y + 1,
            width: rect.width - 2,
            height: rect.height - 2,
        },
    );
}

fn draw_start_menu(f: &mut Frame, state: &DesktopState, size: Rect) {
    let items = start_items(&state.wm);
    let rect = start_menu_rect(size, items.len());
    let inner_w = rect.width.saturating_sub(2) as usize;
    let lines = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let label = clip(&start_item_label(&state.wm, *item), inner_w);
            let style = if i == state.start_selected {
                sel_style()
            } else {
                normal_style()
            };
            Line::from(Span::styled(format!("{label:<inner_w$}"), style))
        })
        .collect();
    draw_menu_box(f, rect, " deskshell ", lines);
}

fn draw_context_menu(f: &mut Frame, anchor: MenuAnchor, desk: Rect) {
    let rect = context_menu_rect(anchor, desk);
    let inner_w = rect.width.saturating_sub(2) as usize;
    let lines = CONTEXT_MENU
        .iter()
        .map(|(label, _)| {
            Line::from(Span::styled(
                clip(&format!(" {label:<inner_w$}"), inner_w),
                normal_style(),
            ))
        })
        .collect();
    draw_menu_box(f, rect, "", lines);
}

fn draw_cursor(f: &mut Frame, x: u16, y: u16, size: Rect) {
    if x >= size.width || y >= size.height {
        return;
    }
    f.render_widget(
        Paragraph::new(Line::from(Span::styled("+", sel_style()))),
        Rect {
            x,
            y,
            width: 1,
            height: 1,
        },
    );
}
