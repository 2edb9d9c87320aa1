//! Desktop shell seam: tray, shortcuts, settings window, clipboard.

use crate::config::{SettingId, TrayTheme};
use crate::error::WebTrayResult;

use super::menu::MenuModel;

/// OS light/dark preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTheme {
    Light,
    Dark,
}

/// Tray glyph color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Light,
    Dark,
}

/// `tray_theme` names the glyph. With `system`, a dark desktop gets the light
/// glyph and vice versa; without an OS answer each platform has its own pick.
pub fn resolve_glyph(setting: TrayTheme, system: Option<SystemTheme>) -> Glyph {
    match (setting, system) {
        (TrayTheme::Light, _) => Glyph::Light,
        (TrayTheme::Dark, _) => Glyph::Dark,
        (TrayTheme::System, Some(SystemTheme::Dark)) => Glyph::Light,
        (TrayTheme::System, Some(SystemTheme::Light)) => Glyph::Dark,
        (TrayTheme::System, None) => platform_glyph(),
    }
}

fn platform_glyph() -> Glyph {
    if cfg!(target_os = "macos") {
        Glyph::Dark
    } else {
        Glyph::Light
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrayView {
    pub glyph: Glyph,
    /// The current page's window is visible.
    pub active: bool,
    pub tooltip: String,
    pub menu: MenuModel,
}

/// Global shortcut targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    Toggle,
    Next,
    Previous,
}

impl ShortcutAction {
    pub fn for_setting(id: SettingId) -> Option<Self> {
        match id {
            SettingId::ShortcutToggle => Some(ShortcutAction::Toggle),
            SettingId::ShortcutNext => Some(ShortcutAction::Next),
            SettingId::ShortcutPrevious => Some(ShortcutAction::Previous),
            _ => None,
        }
    }
}

/// Work handed to the main thread.
pub type MainTask = Box<dyn FnOnce() + Send>;

pub trait ShellHost: Send + Sync {
    /// Run `task` on the main (UI) thread; inline when already on it.
    fn run_on_main(&self, task: MainTask) -> WebTrayResult<()>;

    fn update_tray(&self, view: &TrayView) -> WebTrayResult<()>;
    fn system_theme(&self) -> Option<SystemTheme>;
    fn clipboard_text(&self) -> Option<String>;

    /// Accelerator syntax is whatever the platform layer accepts.
    fn register_shortcut(&self, accelerator: &str, action: ShortcutAction) -> WebTrayResult<()>;
    fn unregister_shortcuts(&self) -> WebTrayResult<()>;

    fn open_settings(&self) -> WebTrayResult<()>;
    /// Close the settings window without asking again.
    fn close_settings(&self) -> WebTrayResult<()>;

    fn open_external(&self, url: &str) -> WebTrayResult<()>;
    fn quit(&self);
}
