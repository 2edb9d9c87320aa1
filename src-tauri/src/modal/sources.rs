//! Screen-share sources offered by the picker.

use serde::Serialize;
use xcap::{Monitor, Window};

use crate::error::{WebTrayError, WebTrayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Screen,
    Window,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSource {
    /// `screen:<index>` or `window:<native id>`.
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    /// Whether system audio can be shared along with this source.
    pub supports_audio: bool,
}

pub trait SourceProvider: Send + Sync {
    fn sources(&self) -> WebTrayResult<Vec<ScreenSource>>;
}

/// Enumerates monitors and visible top-level windows with xcap.
#[derive(Default)]
pub struct XcapSourceProvider;

impl SourceProvider for XcapSourceProvider {
    fn sources(&self) -> WebTrayResult<Vec<ScreenSource>> {
        let monitors = Monitor::all()
            .map_err(|e| WebTrayError::Other(format!("Failed to get monitors: {}", e)))?;
        let mut sources: Vec<ScreenSource> = monitors
            .iter()
            .enumerate()
            .map(|(idx, monitor)| ScreenSource {
                id: format!("screen:{}", idx),
                name: monitor
                    .name()
                    .unwrap_or_else(|_| format!("Screen {}", idx + 1)),
                kind: SourceKind::Screen,
                // Loopback capture exists only on Windows.
                supports_audio: cfg!(target_os = "windows"),
            })
            .collect();

        match Window::all() {
            Ok(windows) => sources.extend(windows.iter().filter(|w| is_shareable(w)).map(|w| {
                ScreenSource {
                    id: format!("window:{}", w.id().unwrap_or(0)),
                    name: w.title().unwrap_or_default(),
                    kind: SourceKind::Window,
                    supports_audio: false,
                }
            })),
            Err(e) => log::warn!("[MODAL] Window enumeration failed: {}", e),
        }
        Ok(sources)
    }
}

/// Skip minimized, untitled, tiny and shell windows.
fn is_shareable(w: &Window) -> bool {
    if w.is_minimized().unwrap_or(true) {
        return false;
    }
    let title = w.title().unwrap_or_default();
    if title.is_empty() || w.width().unwrap_or(0) < 50 || w.height().unwrap_or(0) < 50 {
        return false;
    }

    let app = w.app_name().unwrap_or_default().to_lowercase();
    let title = title.to_lowercase();
    if (app == "explorer.exe" || app == "explorer") && (title == "program manager" || title == "start") {
        return false;
    }
    ![
        "textinputhost",
        "searchhost",
        "shellexperiencehost",
        "lockapp",
        "webtray",
    ]
    .iter()
    .any(|shell| app.contains(shell))
}
