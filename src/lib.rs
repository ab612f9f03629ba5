//! A terminal desktop with overlapping, draggable, resizable windows.
//!
//! [`core`] holds the window manager and the per-window interaction
//! controllers and knows nothing about terminals. [`desktop`] projects it
//! onto a ratatui frame and feeds it crossterm mouse and key events.

pub mod apps;
pub mod chrome;
pub mod config;
pub mod core;
pub mod desktop;
pub mod error;
pub mod logging;
pub mod sound;
pub mod ui;
