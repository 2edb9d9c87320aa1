//! Application lifecycle and platform integration.
//!
//! - `tray`: tray icon and native menu built from the manager's menu model
//! - `icon`: themed tray glyph
//! - `shell`: `ShellHost` over Tauri and its plugins
//! - `settings_window`: the settings UI window
//! - `events`: app-level window event handlers

pub mod events;
pub mod icon;
pub mod settings_window;
pub mod shell;
pub mod tray;

pub use shell::TauriShell;
