//! Modal subsystem: transient child windows that resolve a user decision.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs        (ModalService: pending modals, show/confirm/alert/pick)
//!   |
//!   +-- host.rs    (ModalHost trait, Tauri implementation)
//!   +-- sources.rs (screen-share sources via xcap)
//! ```
//!
//! A modal is opened hidden; the renderer fetches its request with
//! `modal_request`, measures itself and reports its height, and only then is
//! the window revealed. The user's answer arrives through `modal_respond`
//! and resolves the future returned by `show`. Modals follow their parent's
//! visibility and position, and resolve as dismissed when the parent closes.

pub mod host;
pub mod sources;

pub use host::{ModalHost, TauriModalHost};
pub use sources::{ScreenSource, SourceKind, SourceProvider, XcapSourceProvider};

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::{WebTrayError, WebTrayResult};
use crate::window::native::{WindowEvent, WindowId};

pub type ModalHandle = u64;

const MODAL_LABEL_PREFIX: &str = "modal-";

/// Window label for a modal handle.
pub fn modal_label(handle: ModalHandle) -> String {
    format!("{}{}", MODAL_LABEL_PREFIX, handle)
}

/// Inverse of [`modal_label`].
pub fn parse_modal_label(label: &str) -> Option<ModalHandle> {
    label.strip_prefix(MODAL_LABEL_PREFIX)?.parse().ok()
}

/// Message box options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogOptions {
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub buttons: Vec<String>,
    pub default_id: usize,
    pub cancel_id: usize,
    /// Text column width in logical pixels.
    pub text_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkbox_label: Option<String>,
}

impl DialogOptions {
    pub const DEFAULT_TEXT_WIDTH: u32 = 360;

    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            detail: None,
            buttons: vec!["OK".to_string()],
            default_id: 0,
            cancel_id: 0,
            text_width: Self::DEFAULT_TEXT_WIDTH,
            checkbox_label: None,
        }
    }

    pub fn buttons<I, S>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_id(mut self, id: usize) -> Self {
        self.default_id = id;
        self
    }

    pub fn cancel_id(mut self, id: usize) -> Self {
        self.cancel_id = id;
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn validate(&self) -> WebTrayResult<()> {
        if self.buttons.is_empty() {
            return Err(WebTrayError::ModalError("dialog needs at least one button".into()));
        }
        if self.default_id >= self.buttons.len() || self.cancel_id >= self.buttons.len() {
            return Err(WebTrayError::ModalError(format!(
                "default/cancel id out of range for {} buttons",
                self.buttons.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPickerOptions {
    pub origin: String,
    pub offer_audio: bool,
    pub sources: Vec<ScreenSource>,
}

/// What the renderer of a modal window should display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ModalRequest {
    Dialog(DialogOptions),
    ScreenPicker(ScreenPickerOptions),
}

impl ModalRequest {
    pub fn text_width(&self) -> u32 {
        match self {
            ModalRequest::Dialog(options) => options.text_width,
            ModalRequest::ScreenPicker(_) => 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalResponse {
    Dialog {
        response: usize,
        checkbox_checked: bool,
    },
    Source {
        source_id: String,
        share_audio: bool,
    },
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogResult {
    pub response: usize,
    pub checkbox_checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSelection {
    pub source_id: String,
    pub share_audio: bool,
}

struct PendingModal {
    tx: oneshot::Sender<ModalResponse>,
    key: Option<String>,
    parent: Option<WindowId>,
    request: ModalRequest,
}

pub struct ModalService {
    host: Arc<dyn ModalHost>,
    next_handle: AtomicU64,
    pending: Mutex<HashMap<ModalHandle, PendingModal>>,
}

impl ModalService {
    pub fn new(host: Arc<dyn ModalHost>) -> Self {
        Self {
            host,
            next_handle: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    // ========================================================================
    // Opening
    // ========================================================================

    /// Show a message box and wait for the answer. Dismissal maps to `cancel_id`.
    pub async fn show(
        &self,
        parent: Option<WindowId>,
        options: DialogOptions,
    ) -> WebTrayResult<DialogResult> {
        let cancel_id = options.cancel_id;
        options.validate()?;
        let response = self.open(None, parent, ModalRequest::Dialog(options)).await?;
        Ok(dialog_result(response, cancel_id))
    }

    /// Like [`show`](Self::show), but if a modal with the same key is already
    /// open it is focused and `None` is returned instead of stacking another.
    pub async fn show_keyed(
        &self,
        key: &str,
        parent: Option<WindowId>,
        options: DialogOptions,
    ) -> WebTrayResult<Option<DialogResult>> {
        let cancel_id = options.cancel_id;
        options.validate()?;
        let response = self
            .open_keyed(Some(key.to_string()), parent, ModalRequest::Dialog(options))
            .await?;
        Ok(response.map(|r| dialog_result(r, cancel_id)))
    }

    /// Two-button question. The first button is the affirmative one.
    pub async fn confirm(
        &self,
        key: Option<&str>,
        parent: Option<WindowId>,
        options: DialogOptions,
    ) -> WebTrayResult<Option<bool>> {
        if options.buttons.len() != 2 {
            return Err(WebTrayError::ModalError(format!(
                "confirm needs exactly two buttons, got {}",
                options.buttons.len()
            )));
        }
        let result = match key {
            Some(key) => self.show_keyed(key, parent, options).await?,
            None => Some(self.show(parent, options).await?),
        };
        Ok(result.map(|r| r.response == 0))
    }

    /// Single-button notice.
    pub async fn alert(
        &self,
        key: Option<&str>,
        parent: Option<WindowId>,
        options: DialogOptions,
    ) -> WebTrayResult<()> {
        if options.buttons.len() != 1 {
            return Err(WebTrayError::ModalError(format!(
                "alert needs exactly one button, got {}",
                options.buttons.len()
            )));
        }
        match key {
            Some(key) => {
                self.show_keyed(key, parent, options).await?;
            },
            None => {
                self.show(parent, options).await?;
            },
        }
        Ok(())
    }

    /// Ask the user to pick a screen-share source. `None` means cancelled.
    pub async fn pick_screen_source(
        &self,
        parent: Option<WindowId>,
        options: ScreenPickerOptions,
    ) -> WebTrayResult<Option<ScreenSelection>> {
        let response = self
            .open(None, parent, ModalRequest::ScreenPicker(options))
            .await?;
        Ok(match response {
            ModalResponse::Source {
                source_id,
                share_audio,
            } if !source_id.is_empty() => Some(ScreenSelection {
                source_id,
                share_audio,
            }),
            _ => None,
        })
    }

    async fn open(
        &self,
        key: Option<String>,
        parent: Option<WindowId>,
        request: ModalRequest,
    ) -> WebTrayResult<ModalResponse> {
        Ok(self
            .open_keyed(key, parent, request)
            .await?
            .unwrap_or(ModalResponse::Dismissed))
    }

    async fn open_keyed(
        &self,
        key: Option<String>,
        parent: Option<WindowId>,
        request: ModalRequest,
    ) -> WebTrayResult<Option<ModalResponse>> {
        let (tx, rx) = oneshot::channel();
        let handle = {
            let mut pending = self.pending.lock();
            let existing = key.as_ref().and_then(|key| {
                pending
                    .iter()
                    .find(|(_, p)| p.key.as_ref() == Some(key))
                    .map(|(handle, _)| *handle)
            });
            if let Some(existing) = existing {
                drop(pending);
                log::debug!("[MODAL] {:?} already open, focusing", key);
                self.host.focus(existing);
                return Ok(None);
            }
            let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
            pending.insert(
                handle,
                PendingModal {
                    tx,
                    key,
                    parent: parent.clone(),
                    request: request.clone(),
                },
            );
            handle
        };

        if let Err(e) = self.host.open(handle, parent.as_ref(), &request) {
            self.pending.lock().remove(&handle);
            return Err(e);
        }

        // A dropped sender (service torn down) counts as dismissal.
        Ok(Some(rx.await.unwrap_or(ModalResponse::Dismissed)))
    }

    // ========================================================================
    // Renderer side
    // ========================================================================

    pub fn request_for(&self, handle: ModalHandle) -> Option<ModalRequest> {
        self.pending.lock().get(&handle).map(|p| p.request.clone())
    }

    /// The renderer measured its content; size and reveal the window.
    pub fn report_height(&self, handle: ModalHandle, height: f64) -> WebTrayResult<()> {
        let parent = {
            let pending = self.pending.lock();
            let Some(modal) = pending.get(&handle) else {
                return Err(WebTrayError::ModalError(format!("unknown modal {}", handle)));
            };
            modal.parent.clone()
        };
        self.host.reveal(handle, parent.as_ref(), height)
    }

    /// Deliver the user's answer. Returns false if the modal is already gone.
    pub fn resolve(&self, handle: ModalHandle, response: ModalResponse) -> bool {
        let Some(modal) = self.pending.lock().remove(&handle) else {
            return false;
        };
        self.host.close(handle);
        let _ = modal.tx.send(response);
        true
    }

    pub fn is_open(&self, handle: ModalHandle) -> bool {
        self.pending.lock().contains_key(&handle)
    }

    pub fn open_count(&self) -> usize {
        self.pending.lock().len()
    }

    // ========================================================================
    // Parent cascading
    // ========================================================================

    /// Keep modals in step with their parent window.
    pub fn parent_event(&self, parent: &WindowId, event: &WindowEvent) {
        let children: Vec<ModalHandle> = self
            .pending
            .lock()
            .iter()
            .filter(|(_, p)| p.parent.as_ref() == Some(parent))
            .map(|(handle, _)| *handle)
            .collect();

        for handle in children {
            match event {
                WindowEvent::Closed | WindowEvent::Replaced => {
                    log::debug!("[MODAL] Parent {} closed, dismissing modal {}", parent, handle);
                    self.resolve(handle, ModalResponse::Dismissed);
                },
                WindowEvent::Shown => self.host.follow_parent(handle, parent, Some(true)),
                WindowEvent::Hidden => self.host.follow_parent(handle, parent, Some(false)),
                WindowEvent::Moved | WindowEvent::Resized => {
                    self.host.follow_parent(handle, parent, None)
                },
                _ => {},
            }
        }
    }
}

fn dialog_result(response: ModalResponse, cancel_id: usize) -> DialogResult {
    match response {
        ModalResponse::Dialog {
            response,
            checkbox_checked,
        } => DialogResult {
            response,
            checkbox_checked,
        },
        _ => DialogResult {
            response: cancel_id,
            checkbox_checked: false,
        },
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_modal_label_round_trip() {
        assert_eq!(parse_modal_label(&modal_label(42)), Some(42));
        assert_eq!(parse_modal_label("page-1"), None);
    }

    #[tokio::test]
    async fn test_show_resolves_with_user_answer() {
        let (service, host) = auto_answering(|_| ModalResponse::Dialog {
            response: 1,
            checkbox_checked: true,
        });
        let options = DialogOptions::new("Title", "Body").buttons(["A", "B"]).cancel_id(1);
        let result = service.show(None, options).await.unwrap();

        assert_eq!(result.response, 1);
        assert!(result.checkbox_checked);
        assert_eq!(service.open_count(), 0);
        assert!(host.calls().iter().any(|c| matches!(c, HostCall::Close(_))));
    }

    #[tokio::test]
    async fn test_dismissal_maps_to_cancel_id() {
        let (service, _host) = auto_answering(|_| ModalResponse::Dismissed);
        let options = DialogOptions::new("T", "M")
            .buttons(["Allow", "Deny", "Later"])
            .cancel_id(2);
        let result = service.show(None, options).await.unwrap();
        assert_eq!(result.response, 2);
    }

    #[tokio::test]
    async fn test_confirm_requires_two_buttons() {
        let (service, _host) = auto_answering(|_| ModalResponse::Dismissed);
        let err = service
            .confirm(None, None, DialogOptions::new("T", "M"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebTrayError::ModalError(_)));
    }

    #[tokio::test]
    async fn test_alert_requires_one_button() {
        let (service, _host) = auto_answering(|_| ModalResponse::Dismissed);
        let options = DialogOptions::new("T", "M").buttons(["A", "B"]);
        assert!(service.alert(None, None, options).await.is_err());
    }

    #[tokio::test]
    async fn test_keyed_modal_focuses_instead_of_stacking() {
        let (host, mut opened) = ScriptedHost::new();
        let service = Arc::new(ModalService::new(host.clone()));

        let first = {
            let service = service.clone();
            tokio::spawn(async move {
                let options = DialogOptions::new("T", "M").buttons(["Yes", "No"]);
                service.confirm(Some("recreate"), None, options).await
            })
        };
        let (handle, _) = opened.recv().await.unwrap();

        let options = DialogOptions::new("T", "M").buttons(["Yes", "No"]);
        let second = service.confirm(Some("recreate"), None, options).await.unwrap();
        assert_eq!(second, None);
        assert!(host.calls().contains(&HostCall::Focus(handle)));

        service.resolve(
            handle,
            ModalResponse::Dialog {
                response: 0,
                checkbox_checked: false,
            },
        );
        assert_eq!(first.await.unwrap().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_parent_close_dismisses_children() {
        let (host, mut opened) = ScriptedHost::new();
        let service = Arc::new(ModalService::new(host.clone()));
        let parent = WindowId::from("page-a-1");

        let pending = {
            let service = service.clone();
            let parent = parent.clone();
            tokio::spawn(async move {
                let options = DialogOptions::new("T", "M").buttons(["Yes", "No"]).cancel_id(1);
                service.confirm(None, Some(parent), options).await
            })
        };
        let (handle, _) = opened.recv().await.unwrap();

        service.parent_event(&parent, &WindowEvent::Hidden);
        assert!(host.calls().contains(&HostCall::Follow(handle, Some(false))));

        service.parent_event(&parent, &WindowEvent::Closed);
        assert_eq!(pending.await.unwrap().unwrap(), Some(false));
        assert!(!service.is_open(handle));
    }

    #[tokio::test]
    async fn test_report_height_reveals() {
        let (host, mut opened) = ScriptedHost::new();
        let service = Arc::new(ModalService::new(host.clone()));
        let task = {
            let service = service.clone();
            tokio::spawn(async move { service.show(None, DialogOptions::new("T", "M")).await })
        };
        let (handle, request) = opened.recv().await.unwrap();
        assert_eq!(service.request_for(handle), Some(request));

        service.report_height(handle, 180.0).unwrap();
        assert!(host.calls().contains(&HostCall::Reveal(handle, 180.0)));

        service.resolve(
            handle,
            ModalResponse::Dialog {
                response: 0,
                checkbox_checked: false,
            },
        );
        assert_eq!(task.await.unwrap().unwrap().response, 0);
        assert!(service.report_height(handle, 10.0).is_err());
    }
}
