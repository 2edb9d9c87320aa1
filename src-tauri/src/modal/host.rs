//! Native side of modals.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use super::{modal_label, DialogOptions, ModalHandle, ModalRequest, ModalResponse};
use crate::error::{WebTrayError, WebTrayResult};
use crate::window::native::WindowId;

/// Horizontal padding around the text column, in logical pixels.
const MODAL_PADDING: f64 = 48.0;
/// Height used until the renderer reports its content height.
const INITIAL_HEIGHT: f64 = 120.0;

/// Opens, positions and closes modal windows.
pub trait ModalHost: Send + Sync {
    /// Create the (hidden) modal window.
    fn open(&self, handle: ModalHandle, parent: Option<&WindowId>, request: &ModalRequest) -> WebTrayResult<()>;
    /// Size to the reported content height and show.
    fn reveal(&self, handle: ModalHandle, parent: Option<&WindowId>, height: f64) -> WebTrayResult<()>;
    fn focus(&self, handle: ModalHandle);
    /// Follow the parent: `Some` shows or hides, `None` re-centers.
    fn follow_parent(&self, handle: ModalHandle, parent: &WindowId, visible: Option<bool>);
    fn close(&self, handle: ModalHandle);
}

pub struct TauriModalHost {
    app: AppHandle,
    widths: Mutex<HashMap<ModalHandle, f64>>,
    revealed: Mutex<HashSet<ModalHandle>>,
}

impl TauriModalHost {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            widths: Mutex::new(HashMap::new()),
            revealed: Mutex::new(HashSet::new()),
        }
    }

    fn modal(&self, handle: ModalHandle) -> Option<WebviewWindow> {
        self.app.get_webview_window(&modal_label(handle))
    }

    fn parent(&self, parent: Option<&WindowId>) -> Option<WebviewWindow> {
        self.app.get_webview_window(parent?.as_str())
    }

    /// Center horizontally over the parent, a third of the way down.
    fn position(&self, modal: &WebviewWindow, parent: Option<&WebviewWindow>) -> WebTrayResult<()> {
        let Some(parent) = parent else {
            return Ok(modal.center()?);
        };
        let origin = parent.outer_position()?;
        let size = parent.outer_size()?;
        let own = modal.outer_size()?;
        let x = origin.x + (size.width as i32 - own.width as i32) / 2;
        let y = origin.y + (size.height as i32 - own.height as i32) / 3;
        modal.set_position(tauri::Position::Physical(tauri::PhysicalPosition { x, y }))?;
        Ok(())
    }
}

impl ModalHost for TauriModalHost {
    fn open(&self, handle: ModalHandle, parent: Option<&WindowId>, request: &ModalRequest) -> WebTrayResult<()> {
        let page = match request {
            ModalRequest::Dialog(_) => "modal.html",
            ModalRequest::ScreenPicker(_) => "picker.html",
        };
        let title = match request {
            ModalRequest::Dialog(options) => options.title.clone(),
            ModalRequest::ScreenPicker(options) => format!("Share your screen with {}", options.origin),
        };
        let width = request.text_width() as f64 + MODAL_PADDING;

        let mut builder = WebviewWindowBuilder::new(
            &self.app,
            modal_label(handle),
            WebviewUrl::App(page.into()),
        )
        .title(title)
        .inner_size(width, INITIAL_HEIGHT)
        .resizable(false)
        .maximizable(false)
        .minimizable(false)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .visible_on_all_workspaces(true)
        .visible(false)
        .focused(true);

        if let Some(parent_window) = self.parent(parent) {
            builder = builder.parent(&parent_window)?;
        }

        let window = builder
            .build()
            .map_err(|e| WebTrayError::ModalError(format!("Failed to create modal: {}", e)))?;

        // Closing the modal window itself counts as dismissal.
        let app = self.app.clone();
        window.on_window_event(move |event| {
            if let tauri::WindowEvent::Destroyed = event {
                if let Some(services) = app.try_state::<crate::AppServices>() {
                    services.modals.resolve(handle, ModalResponse::Dismissed);
                }
            }
        });

        self.widths.lock().insert(handle, width);
        log::debug!("[MODAL] Opened modal {} ({})", handle, page);
        Ok(())
    }

    fn reveal(&self, handle: ModalHandle, parent: Option<&WindowId>, height: f64) -> WebTrayResult<()> {
        let Some(modal) = self.modal(handle) else {
            return Err(WebTrayError::ModalError(format!("modal {} is gone", handle)));
        };
        let width = self
            .widths
            .lock()
            .get(&handle)
            .copied()
            .unwrap_or(DialogOptions::DEFAULT_TEXT_WIDTH as f64 + MODAL_PADDING);
        modal.set_size(tauri::Size::Logical(tauri::LogicalSize {
            width,
            height: height.max(40.0),
        }))?;
        let parent = self.parent(parent);
        self.position(&modal, parent.as_ref())?;

        // Parent hidden while the renderer was measuring: stay hidden.
        if parent.map_or(true, |p| p.is_visible().unwrap_or(false)) {
            modal.show()?;
            modal.set_focus()?;
        }
        self.revealed.lock().insert(handle);
        Ok(())
    }

    fn focus(&self, handle: ModalHandle) {
        if let Some(modal) = self.modal(handle) {
            let _ = modal.show();
            let _ = modal.set_focus();
        }
    }

    fn follow_parent(&self, handle: ModalHandle, parent: &WindowId, visible: Option<bool>) {
        if !self.revealed.lock().contains(&handle) {
            return;
        }
        let Some(modal) = self.modal(handle) else {
            return;
        };
        let result = match visible {
            Some(true) => modal.show().map_err(WebTrayError::from),
            Some(false) => modal.hide().map_err(WebTrayError::from),
            None => self.position(&modal, self.parent(Some(parent)).as_ref()),
        };
        if let Err(e) = result {
            log::debug!("[MODAL] Failed to follow parent {}: {}", parent, e);
        }
    }

    fn close(&self, handle: ModalHandle) {
        self.widths.lock().remove(&handle);
        self.revealed.lock().remove(&handle);
        if let Some(modal) = self.modal(handle) {
            if let Err(e) = modal.destroy() {
                log::warn!("[MODAL] Failed to destroy modal {}: {}", handle, e);
            }
        }
    }
}
