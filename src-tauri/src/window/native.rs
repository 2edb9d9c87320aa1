//! Platform seam for native windows.
//!
//! `PageWindow` never talks to Tauri directly; it drives a `NativeWindow`
//! created by a `WindowFactory`. The Tauri implementation lives in
//! `tauri_window.rs`, tests use the recording mock in `mock.rs`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::WebTrayResult;
use crate::page::bounds::Rect;

/// Native window identity (the Tauri window label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(label: &str) -> Self {
        WindowId(label.to_string())
    }
}

/// What a window was last asked to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    Url(String),
    File(PathBuf),
}

impl LoadTarget {
    /// `file://` URLs are treated as files, anything else as a URL.
    pub fn from_location(location: &str) -> Self {
        match url::Url::parse(location) {
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map(LoadTarget::File)
                .unwrap_or_else(|_| LoadTarget::Url(location.to_string())),
            _ => LoadTarget::Url(location.to_string()),
        }
    }
}

/// Everything a factory needs to build a page window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    /// Page id the window belongs to. Preserved across clones.
    pub page_id: String,
    pub title: String,
    pub target: LoadTarget,
    pub session: String,
    pub show_frame: bool,
    pub allow_fullscreen: bool,
    pub bounds: Option<Rect>,
    /// Set for popups: the window that opened this one.
    pub opener: Option<WindowId>,
}

/// Fields a clone may override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowOptionsOverride {
    pub title: Option<String>,
    pub session: Option<String>,
    pub show_frame: Option<bool>,
    pub allow_fullscreen: Option<bool>,
}

impl WindowSpec {
    pub fn with_override(mut self, options: &WindowOptionsOverride) -> Self {
        if let Some(title) = &options.title {
            self.title = title.clone();
        }
        if let Some(session) = &options.session {
            self.session = session.clone();
        }
        if let Some(show_frame) = options.show_frame {
            self.show_frame = show_frame;
        }
        if let Some(allow_fullscreen) = options.allow_fullscreen {
            self.allow_fullscreen = allow_fullscreen;
        }
        self
    }
}

/// Lifecycle and content events raised by a window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Focused,
    Blurred,
    Moved,
    Resized,
    Shown,
    Hidden,
    Navigated(String),
    /// A clone took over; the window is about to be torn down silently.
    Replaced,
    Closed,
}

/// Discriminant used to key listener registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    Focused,
    Blurred,
    Moved,
    Resized,
    Shown,
    Hidden,
    Navigated,
    Replaced,
    Closed,
}

impl WindowEvent {
    pub fn kind(&self) -> WindowEventKind {
        match self {
            WindowEvent::Focused => WindowEventKind::Focused,
            WindowEvent::Blurred => WindowEventKind::Blurred,
            WindowEvent::Moved => WindowEventKind::Moved,
            WindowEvent::Resized => WindowEventKind::Resized,
            WindowEvent::Shown => WindowEventKind::Shown,
            WindowEvent::Hidden => WindowEventKind::Hidden,
            WindowEvent::Navigated(_) => WindowEventKind::Navigated,
            WindowEvent::Replaced => WindowEventKind::Replaced,
            WindowEvent::Closed => WindowEventKind::Closed,
        }
    }
}

/// Callback the native layer uses to report events.
pub type EventSink = Arc<dyn Fn(WindowEvent) + Send + Sync>;

/// Operations on one native window.
///
/// Mutating calls may fail when the underlying window is already gone;
/// callers log and carry on.
pub trait NativeWindow: Send + Sync {
    fn id(&self) -> WindowId;
    fn is_destroyed(&self) -> bool;
    fn is_visible(&self) -> bool;
    fn is_maximized(&self) -> bool;
    /// Top-level document URL as the platform reports it.
    fn url(&self) -> Option<String>;

    fn show(&self) -> WebTrayResult<()>;
    fn hide(&self) -> WebTrayResult<()>;
    fn focus(&self) -> WebTrayResult<()>;
    fn set_maximized(&self, maximized: bool) -> WebTrayResult<()>;
    fn set_opacity(&self, opacity: f64) -> WebTrayResult<()>;
    fn set_muted(&self, muted: bool) -> WebTrayResult<()>;

    fn bounds(&self) -> Option<Rect>;
    fn set_bounds(&self, bounds: Rect) -> WebTrayResult<()>;

    fn load(&self, target: &LoadTarget) -> WebTrayResult<()>;
    fn find(&self, text: &str, forward: bool) -> WebTrayResult<()>;
    fn set_findbar_visible(&self, visible: bool) -> WebTrayResult<()>;

    /// Graceful close. The window may still be alive afterwards.
    fn close(&self) -> WebTrayResult<()>;
    fn destroy(&self) -> WebTrayResult<()>;
}

/// Creates native windows and answers display queries.
pub trait WindowFactory: Send + Sync {
    fn create(&self, spec: &WindowSpec, sink: EventSink) -> WebTrayResult<Arc<dyn NativeWindow>>;

    /// Work area of the primary display.
    fn primary_work_area(&self) -> Option<Rect>;
}
