//! Window event handlers.

use tauri::{Manager, Window, WindowEvent};

use super::settings_window::SETTINGS_WINDOW_LABEL;
use crate::AppServices;

/// Handle window events for the application.
///
/// This is called from the Tauri builder's `on_window_event` hook. Page and
/// modal windows wire their own events; only app-level windows land here.
pub fn handle_window_event(window: &Window, event: &WindowEvent) {
    match event {
        // Fix Windows resize lag by adding small delay
        // See: https://github.com/tauri-apps/tauri/issues/6322#issuecomment-2495685888
        #[cfg(target_os = "windows")]
        WindowEvent::Resized(_) => {
            std::thread::sleep(std::time::Duration::from_millis(1));
        },

        // Settings changes that need confirmation run when the settings
        // window closes; hold the close until they are done.
        WindowEvent::CloseRequested { api, .. } if window.label() == SETTINGS_WINDOW_LABEL => {
            let Some(services) = window.app_handle().try_state::<AppServices>() else {
                return;
            };
            if services.manager.settings_close_requested() {
                api.prevent_close();
                let _ = window.hide();
            }
        },

        _ => {},
    }
}
