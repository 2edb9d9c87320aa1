//! `NativeWindow` backed by a Tauri `WebviewWindow`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use super::native::{EventSink, LoadTarget, NativeWindow, WindowEvent, WindowFactory, WindowId, WindowSpec};
use crate::error::{WebTrayError, WebTrayResult};
use crate::page::bounds::Rect;

/// Script injected into every page window and popup.
pub const PAGE_BRIDGE_SCRIPT: &str = include_str!("page_bridge.js");

/// Session partitions with this prefix keep their data on disk.
const PERSIST_PREFIX: &str = "persist:";

pub struct TauriWindowFactory {
    app: AppHandle,
    counter: AtomicU64,
}

impl TauriWindowFactory {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            counter: AtomicU64::new(0),
        }
    }

    fn next_label(&self, spec: &WindowSpec) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let page: String = spec
            .page_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        match spec.opener {
            Some(_) => format!("popup-{}-{}", page, n),
            None => format!("page-{}-{}", page, n),
        }
    }

    /// Storage location for a session partition. `None` means the default
    /// profile; in-memory partitions are handled with incognito mode.
    fn session_directory(&self, session: &str) -> WebTrayResult<Option<PathBuf>> {
        let Some(name) = session.strip_prefix(PERSIST_PREFIX) else {
            return Ok(None);
        };
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let base = self
            .app
            .path()
            .app_data_dir()
            .map_err(|e| WebTrayError::WindowError(format!("No app data dir: {}", e)))?;
        Ok(Some(base.join("sessions").join(safe)))
    }
}

fn webview_url(target: &LoadTarget) -> WebTrayResult<WebviewUrl> {
    Ok(WebviewUrl::External(target_url(target)?))
}

fn target_url(target: &LoadTarget) -> WebTrayResult<url::Url> {
    match target {
        LoadTarget::Url(raw) => url::Url::parse(raw)
            .map_err(|e| WebTrayError::WindowError(format!("Invalid URL '{}': {}", raw, e))),
        LoadTarget::File(path) => url::Url::from_file_path(path)
            .map_err(|_| WebTrayError::WindowError(format!("Invalid file path {}", path.display()))),
    }
}

impl WindowFactory for TauriWindowFactory {
    fn create(&self, spec: &WindowSpec, sink: EventSink) -> WebTrayResult<Arc<dyn NativeWindow>> {
        let label = self.next_label(spec);
        let nav_sink = Arc::clone(&sink);

        let mut builder = WebviewWindowBuilder::new(&self.app, &label, webview_url(&spec.target)?)
            .title(&spec.title)
            .decorations(spec.show_frame)
            .always_on_top(true)
            .minimizable(false)
            .skip_taskbar(true)
            .visible_on_all_workspaces(true)
            .visible(false)
            .resizable(true)
            .initialization_script(PAGE_BRIDGE_SCRIPT)
            .on_navigation(move |url| {
                nav_sink(WindowEvent::Navigated(url.to_string()));
                true
            });

        if let Some(bounds) = spec.bounds {
            builder = builder
                .inner_size(bounds.width as f64, bounds.height as f64)
                .position(bounds.x as f64, bounds.y as f64);
        }

        match self.session_directory(&spec.session)? {
            Some(dir) => builder = builder.data_directory(dir),
            None if spec.session != crate::store::schema::DEFAULT_SESSION => {
                builder = builder.incognito(true)
            },
            None => {},
        }

        let window = builder
            .build()
            .map_err(|e| WebTrayError::WindowError(format!("Failed to create {}: {}", label, e)))?;

        // Builder sizes are logical; re-apply in physical pixels.
        if let Some(bounds) = spec.bounds {
            set_physical_bounds(&window, bounds)?;
        }

        let native = Arc::new(TauriWindow {
            id: WindowId(label),
            window,
            sink,
            destroyed: Arc::new(AtomicBool::new(false)),
        });
        native.wire_events(spec.allow_fullscreen);
        Ok(native)
    }

    fn primary_work_area(&self) -> Option<Rect> {
        let monitor = self.app.primary_monitor().ok().flatten()?;
        let area = monitor.work_area();
        Some(Rect {
            x: area.position.x,
            y: area.position.y,
            width: area.size.width,
            height: area.size.height,
        })
    }
}

pub struct TauriWindow {
    id: WindowId,
    window: WebviewWindow,
    sink: EventSink,
    destroyed: Arc<AtomicBool>,
}

impl TauriWindow {
    fn wire_events(&self, allow_fullscreen: bool) {
        let sink = Arc::clone(&self.sink);
        let destroyed = Arc::clone(&self.destroyed);
        let window = self.window.clone();
        self.window.on_window_event(move |event| match event {
            tauri::WindowEvent::Focused(true) => sink(WindowEvent::Focused),
            tauri::WindowEvent::Focused(false) => sink(WindowEvent::Blurred),
            tauri::WindowEvent::Moved(_) => sink(WindowEvent::Moved),
            tauri::WindowEvent::Resized(_) => {
                if !allow_fullscreen && window.is_fullscreen().unwrap_or(false) {
                    let _ = window.set_fullscreen(false);
                }
                sink(WindowEvent::Resized)
            },
            tauri::WindowEvent::Destroyed => {
                destroyed.store(true, Ordering::SeqCst);
                sink(WindowEvent::Closed)
            },
            _ => {},
        });
    }

    fn eval(&self, script: &str) -> WebTrayResult<()> {
        self.window
            .eval(script)
            .map_err(|e| WebTrayError::WindowError(format!("Script failed in {}: {}", self.id, e)))
    }
}

impl NativeWindow for TauriWindow {
    fn id(&self) -> WindowId {
        self.id.clone()
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
            || self.window.app_handle().get_webview_window(self.id.as_str()).is_none()
    }

    fn is_visible(&self) -> bool {
        self.window.is_visible().unwrap_or(false)
    }

    fn is_maximized(&self) -> bool {
        self.window.is_maximized().unwrap_or(false)
    }

    fn url(&self) -> Option<String> {
        self.window.url().ok().map(|url| url.to_string())
    }

    fn show(&self) -> WebTrayResult<()> {
        self.window.show()?;
        (self.sink)(WindowEvent::Shown);
        Ok(())
    }

    fn hide(&self) -> WebTrayResult<()> {
        self.window.hide()?;
        (self.sink)(WindowEvent::Hidden);
        Ok(())
    }

    fn focus(&self) -> WebTrayResult<()> {
        Ok(self.window.set_focus()?)
    }

    fn set_maximized(&self, maximized: bool) -> WebTrayResult<()> {
        if maximized {
            self.window.maximize()?;
        } else {
            self.window.unmaximize()?;
        }
        Ok(())
    }

    fn set_opacity(&self, opacity: f64) -> WebTrayResult<()> {
        apply_opacity(&self.window, opacity)
    }

    fn set_muted(&self, muted: bool) -> WebTrayResult<()> {
        self.eval(&format!("window.__webtray && window.__webtray.setMuted({})", muted))
    }

    fn bounds(&self) -> Option<Rect> {
        let position = self.window.outer_position().ok()?;
        let size = self.window.outer_size().ok()?;
        Some(Rect {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    fn set_bounds(&self, bounds: Rect) -> WebTrayResult<()> {
        set_physical_bounds(&self.window, bounds)
    }

    fn load(&self, target: &LoadTarget) -> WebTrayResult<()> {
        Ok(self.window.navigate(target_url(target)?)?)
    }

    fn find(&self, text: &str, forward: bool) -> WebTrayResult<()> {
        let text = serde_json::to_string(text)?;
        self.eval(&format!("window.__webtray && window.__webtray.find({}, {})", text, forward))
    }

    fn set_findbar_visible(&self, visible: bool) -> WebTrayResult<()> {
        self.eval(&format!("window.__webtray && window.__webtray.findbar({})", visible))
    }

    fn close(&self) -> WebTrayResult<()> {
        Ok(self.window.close()?)
    }

    fn destroy(&self) -> WebTrayResult<()> {
        self.window.destroy()?;
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Physical Coordinate Helpers
// ============================================================================
// Stored bounds are physical pixels; the builder's sizes are logical and
// would drift on scaled displays.

pub(crate) fn set_physical_bounds(window: &WebviewWindow, bounds: Rect) -> WebTrayResult<()> {
    window.set_position(tauri::Position::Physical(tauri::PhysicalPosition {
        x: bounds.x,
        y: bounds.y,
    }))?;
    window.set_size(tauri::Size::Physical(tauri::PhysicalSize {
        width: bounds.width,
        height: bounds.height,
    }))?;
    Ok(())
}

// ============================================================================
// Opacity
// ============================================================================

#[cfg(target_os = "windows")]
fn apply_opacity(window: &WebviewWindow, opacity: f64) -> WebTrayResult<()> {
    use windows::Win32::Foundation::{COLORREF, HWND};
    use windows::Win32::UI::WindowsAndMessaging::{
        GetWindowLongW, SetLayeredWindowAttributes, SetWindowLongW, GWL_EXSTYLE, LWA_ALPHA,
        WS_EX_LAYERED,
    };

    let hwnd = window
        .hwnd()
        .map_err(|e| WebTrayError::WindowError(format!("Failed to get HWND: {}", e)))?;
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;

    unsafe {
        let hwnd = HWND(hwnd.0);
        let style = GetWindowLongW(hwnd, GWL_EXSTYLE);
        if style & WS_EX_LAYERED.0 as i32 == 0 {
            SetWindowLongW(hwnd, GWL_EXSTYLE, style | WS_EX_LAYERED.0 as i32);
        }
        SetLayeredWindowAttributes(hwnd, COLORREF(0), alpha, LWA_ALPHA)
            .map_err(|e| WebTrayError::WindowError(format!("Failed to set opacity: {:?}", e)))?;
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn apply_opacity(_window: &WebviewWindow, _opacity: f64) -> WebTrayResult<()> {
    // No portable per-window alpha; pages stay opaque elsewhere.
    Ok(())
}
