//! Tauri implementation of the desktop shell.

use parking_lot::Mutex;
use std::collections::HashMap;
use tauri::{AppHandle, Manager, Theme};
use tauri_plugin_clipboard_manager::ClipboardExt;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut};
use tauri_plugin_opener::OpenerExt;

use super::{settings_window, tray};
use crate::error::{WebTrayError, WebTrayResult};
use crate::manager::shell::{MainTask, ShellHost, ShortcutAction, SystemTheme, TrayView};

pub struct TauriShell {
    app: AppHandle,
    /// Registered shortcut id -> action
    shortcuts: Mutex<HashMap<u32, ShortcutAction>>,
}

impl TauriShell {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            shortcuts: Mutex::new(HashMap::new()),
        }
    }

    /// Action bound to a shortcut that just fired.
    pub fn action_for(&self, shortcut: &Shortcut) -> Option<ShortcutAction> {
        self.shortcuts.lock().get(&shortcut.id()).copied()
    }
}

impl ShellHost for TauriShell {
    fn run_on_main(&self, task: MainTask) -> WebTrayResult<()> {
        self.app.run_on_main_thread(task)?;
        Ok(())
    }

    fn update_tray(&self, view: &TrayView) -> WebTrayResult<()> {
        tray::apply_view(&self.app, view)?;
        Ok(())
    }

    fn system_theme(&self) -> Option<SystemTheme> {
        // Any window reports the OS preference.
        let window = self.app.webview_windows().into_values().next()?;
        match window.theme().ok()? {
            Theme::Dark => Some(SystemTheme::Dark),
            Theme::Light => Some(SystemTheme::Light),
            _ => None,
        }
    }

    fn clipboard_text(&self) -> Option<String> {
        self.app.clipboard().read_text().ok()
    }

    fn register_shortcut(&self, accelerator: &str, action: ShortcutAction) -> WebTrayResult<()> {
        let shortcut: Shortcut = accelerator
            .parse()
            .map_err(|e| WebTrayError::ShortcutError {
                accelerator: accelerator.to_string(),
                reason: format!("{}", e),
            })?;
        let id = shortcut.id();
        self.app
            .global_shortcut()
            .register(shortcut)
            .map_err(|e| WebTrayError::ShortcutError {
                accelerator: accelerator.to_string(),
                reason: e.to_string(),
            })?;
        self.shortcuts.lock().insert(id, action);
        Ok(())
    }

    fn unregister_shortcuts(&self) -> WebTrayResult<()> {
        self.shortcuts.lock().clear();
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|e| WebTrayError::Other(format!("Failed to unregister shortcuts: {}", e)))
    }

    fn open_settings(&self) -> WebTrayResult<()> {
        settings_window::show(&self.app)
    }

    fn close_settings(&self) -> WebTrayResult<()> {
        if let Some(window) = self.app.get_webview_window(settings_window::SETTINGS_WINDOW_LABEL) {
            window.destroy()?;
        }
        Ok(())
    }

    fn open_external(&self, url: &str) -> WebTrayResult<()> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| WebTrayError::Other(format!("Failed to open {}: {}", url, e)))
    }

    fn quit(&self) {
        log::info!("[MANAGER] Quitting");
        self.app.exit(0);
    }
}
