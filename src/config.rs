use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use crate::core::{ControllerConfig, FocusOnClose, Point, Size, WmConfig};

// ── Paths ─────────────────────────────────────────────────────────────────────

static CONFIG_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Directory holding `settings.json` and the log: next to the binary, or the
/// user config dir when the executable path is unknown.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .or_else(|| dirs::config_dir().map(|d| d.join("deskshell")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Use `path` instead of the default settings file. Only the first call wins.
pub fn set_settings_path(path: PathBuf) {
    let _ = CONFIG_OVERRIDE.set(path);
}

pub fn settings_file() -> PathBuf {
    CONFIG_OVERRIDE
        .get()
        .cloned()
        .unwrap_or_else(|| base_dir().join("settings.json"))
}

pub fn log_file() -> PathBuf {
    settings_file()
        .parent()
        .map(|dir| dir.join("deskshell.log"))
        .unwrap_or_else(|| PathBuf::from("deskshell.log"))
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable config: {err}");
            T::default()
        }
    }
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    pub min_width: i32,
    pub min_height: i32,
    pub cascade_origin_x: i32,
    pub cascade_origin_y: i32,
    pub cascade_step: i32,
    pub cascade_wrap: usize,
    pub z_index_seed: u64,
    pub focus_on_close: FocusOnClose,
    pub clamp_drag_to_viewport: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        let wm = WmConfig::default();
        Self {
            min_width: wm.min_size.width,
            min_height: wm.min_size.height,
            cascade_origin_x: wm.cascade_origin.x,
            cascade_origin_y: wm.cascade_origin.y,
            cascade_step: wm.cascade_step,
            cascade_wrap: wm.cascade_wrap,
            z_index_seed: wm.z_index_seed,
            focus_on_close: wm.focus_on_close,
            clamp_drag_to_viewport: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingSettings {
    pub mount_delay_ms: u64,
    pub close_delay_ms: u64,
    pub transition_ms: u64,
    pub double_click_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            mount_delay_ms: 50,
            close_delay_ms: 200,
            transition_ms: 300,
            double_click_ms: 450,
        }
    }
}

/// How many logical pixels one terminal cell stands for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CellSettings {
    pub px_per_col: i32,
    pub px_per_row: i32,
}

impl Default for CellSettings {
    fn default() -> Self {
        Self {
            px_per_col: 10,
            px_per_row: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub sound: bool,
    pub theme: String,
    pub wallpaper: String,
    pub window: WindowSettings,
    pub timing: TimingSettings,
    pub cells: CellSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            theme: "Blue (Default)".into(),
            wallpaper: WALLPAPERS[0].0.into(),
            window: WindowSettings::default(),
            timing: TimingSettings::default(),
            cells: CellSettings::default(),
        }
    }
}

impl Settings {
    pub fn wm_config(&self) -> WmConfig {
        let w = &self.window;
        WmConfig {
            min_size: Size::new(w.min_width.max(1), w.min_height.max(1)),
            cascade_origin: Point::new(w.cascade_origin_x, w.cascade_origin_y),
            cascade_step: w.cascade_step,
            cascade_wrap: w.cascade_wrap.max(1),
            z_index_seed: w.z_index_seed,
            focus_on_close: w.focus_on_close,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            mount_delay: Duration::from_millis(self.timing.mount_delay_ms),
            close_delay: Duration::from_millis(self.timing.close_delay_ms),
            transition: Duration::from_millis(self.timing.transition_ms),
            clamp_drag_to_viewport: self.window.clamp_drag_to_viewport,
        }
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.timing.double_click_ms)
    }
}

pub fn load_settings() -> Settings {
    load_json(&settings_file())
}

pub fn save_settings(d: &Settings) {
    if let Err(err) = save_json(&settings_file(), d) {
        tracing::warn!("could not save settings: {err:#}");
    }
}

// ── Global mutable state ──────────────────────────────────────────────────────

static APP_SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();

fn settings_lock() -> &'static RwLock<Settings> {
    APP_SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

pub fn get_settings() -> Settings {
    settings_lock()
        .read()
        .map(|g| g.clone())
        .unwrap_or_default()
}

pub fn reload_settings() {
    let s = load_settings();
    if let Ok(mut guard) = settings_lock().write() {
        *guard = s;
    }
}

pub fn update_settings<F: FnOnce(&mut Settings)>(f: F) {
    if let Ok(mut guard) = settings_lock().write() {
        f(&mut guard);
    }
}

pub fn persist_settings() {
    let s = get_settings();
    save_settings(&s);
}

// ── Themes & wallpapers ───────────────────────────────────────────────────────

use ratatui::style::Color;

pub const THEMES: &[(&str, Color)] = &[
    ("Blue (Default)", Color::LightBlue),
    ("White", Color::White),
    ("Green", Color::Green),
    ("Amber", Color::Yellow),
    ("Purple", Color::Magenta),
    ("Cyan", Color::Cyan),
];

pub fn theme_color(name: &str) -> Color {
    THEMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
        .unwrap_or(Color::LightBlue)
}

pub fn current_theme_color() -> Color {
    theme_color(&get_settings().theme)
}

/// Desktop backgrounds: name, fill glyph and colour.
pub const WALLPAPERS: &[(&str, char, Color)] = &[
    ("Default", '░', Color::Blue),
    ("Mountain", '▲', Color::Gray),
    ("Cyberpunk", '╬', Color::Magenta),
    ("Ocean", '~', Color::Cyan),
    ("Starry Night", '·', Color::Yellow),
    ("Fluid", '≈', Color::LightBlue),
];

pub fn wallpaper_index(name: &str) -> usize {
    WALLPAPERS
        .iter()
        .position(|(n, _, _)| *n == name)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"sound": false, "window": {"min_width": 320}}"#).unwrap();
        assert!(!s.sound);
        assert_eq!(s.window.min_width, 320);
        assert_eq!(s.window.min_height, 200);
        assert_eq!(s.timing, TimingSettings::default());
    }

    #[test]
    fn focus_policy_is_snake_case() {
        let s: Settings =
            serde_json::from_str(r#"{"window": {"focus_on_close": "topmost"}}"#).unwrap();
        assert_eq!(s.wm_config().focus_on_close, FocusOnClose::Topmost);
    }

    #[test]
    fn derived_configs_match_defaults() {
        let s = Settings::default();
        assert_eq!(s.wm_config(), WmConfig::default());
        assert_eq!(s.controller_config(), ControllerConfig::default());
        assert_eq!(s.double_click_window(), Duration::from_millis(450));
    }

    #[test]
    fn degenerate_window_settings_are_sanitised() {
        let mut s = Settings::default();
        s.window.min_width = -5;
        s.window.cascade_wrap = 0;
        let wm = s.wm_config();
        assert_eq!(wm.min_size.width, 1);
        assert_eq!(wm.cascade_wrap, 1);
    }

    #[test]
    fn unknown_names_fall_back() {
        assert_eq!(wallpaper_index("Nope"), 0);
        assert_eq!(wallpaper_index("Ocean"), 3);
        assert_eq!(theme_color("Nope"), Color::LightBlue);
    }
}
