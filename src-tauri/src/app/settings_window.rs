//! Settings window.

use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};

use crate::error::WebTrayResult;

pub(crate) const SETTINGS_WINDOW_LABEL: &str = "settings";

/// Show the settings window, creating it if it doesn't exist.
pub fn show(app: &AppHandle) -> WebTrayResult<()> {
    if let Some(window) = app.get_webview_window(SETTINGS_WINDOW_LABEL) {
        window.show()?;
        window.set_focus()?;
        return Ok(());
    }

    let url = WebviewUrl::App("settings.html".into());
    WebviewWindowBuilder::new(app, SETTINGS_WINDOW_LABEL, url)
        .title("WebTray Settings")
        .inner_size(640.0, 620.0)
        .min_inner_size(480.0, 400.0)
        .resizable(true)
        .maximizable(true)
        .decorations(true)
        .always_on_top(false)
        .skip_taskbar(false)
        .center()
        .visible(true)
        .focused(true)
        .build()?;

    log::info!("[MANAGER] Opened settings window");
    Ok(())
}
