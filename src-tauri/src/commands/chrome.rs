//! Commands sent by the bridge script inside page windows: drag and
//! maximize gestures, hide, the find bar and popups.

use std::sync::Arc;
use tauri::{command, State, WebviewWindow};

use crate::error::{WebTrayError, WebTrayResult};
use crate::window::native::WindowId;
use crate::window::PageWindow;
use crate::AppServices;

/// The managed window (page or popup) that sent a command.
fn calling_window(services: &AppServices, window: &WebviewWindow) -> WebTrayResult<Arc<PageWindow>> {
    let id = WindowId::from(window.label());
    services
        .manager
        .find_window(&id)
        .ok_or(WebTrayError::WindowNotFound { id: id.0 })
}

#[command]
pub fn window_start_drag(window: WebviewWindow) -> WebTrayResult<()> {
    window.start_dragging()?;
    Ok(())
}

#[command]
pub fn window_toggle_maximize(window: WebviewWindow, services: State<'_, AppServices>) -> WebTrayResult<bool> {
    let maximized = calling_window(&services, &window)?.toggle_maximize()?;
    services.manager.refresh_tray();
    Ok(maximized)
}

#[command]
pub fn window_hide(window: WebviewWindow, services: State<'_, AppServices>) -> WebTrayResult<()> {
    calling_window(&services, &window)?.hide()
}

#[command]
pub fn findbar_open(window: WebviewWindow, services: State<'_, AppServices>) -> WebTrayResult<()> {
    calling_window(&services, &window)?.open_findbar()
}

#[command]
pub fn findbar_search(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    text: String,
    forward: bool,
) -> WebTrayResult<()> {
    calling_window(&services, &window)?.find(&text, forward)
}

#[command]
pub fn findbar_close(window: WebviewWindow, services: State<'_, AppServices>) -> WebTrayResult<()> {
    calling_window(&services, &window)?.close_findbar()
}

/// `window.open` from a page: child window or system browser per the popup policy.
#[command]
pub async fn open_popup(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    url: String,
) -> WebTrayResult<()> {
    let opener = WindowId::from(window.label());
    services
        .manager
        .on_main(move |manager| manager.open_popup(&opener, &url))
        .await
}
