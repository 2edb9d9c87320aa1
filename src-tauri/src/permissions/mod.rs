//! Permission arbitration for every browsing session.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs        (PermissionManager: request, check, display media)
//!   |
//!   +-- capability.rs (capability keys and prompt labels)
//!   +-- queue.rs      (FIFO task queue serializing request pipelines)
//!   +-- session.rs    (deny-all gate for new sessions)
//!   +-- tests.rs
//! ```
//!
//! Durable decisions live in the store under `(session, origin, capability)`.
//! "Allow once" is kept per window in memory and cleared on the window's next
//! navigation; durably it is stored as `ask`.
//!
//! Checks are advisory: anything but an explicit deny passes. Requests are
//! the real gate: unknown or `ask` state prompts the user.
//!
//! Origins are taken from the URL the window itself reports, never from
//! what the page passes along with a request.

pub mod capability;
pub mod queue;
pub mod session;

pub use session::{SessionGate, SessionRegistry, SessionTrackingFactory};

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use crate::error::{WebTrayError, WebTrayResult};
use crate::modal::{DialogOptions, ModalService, ScreenPickerOptions, SourceProvider};
use crate::store::schema::PermissionStatus;
use crate::store::Store;
use crate::window::WindowId;
use capability::{MediaKind, DISPLAY_CAPTURE, LOOPBACK_AUDIO};
use queue::TaskQueue;

/// Prompt buttons, in order.
const PROMPT_BUTTONS: [&str; 4] = ["Allow", "Allow once", "Deny", "Ask later"];
const ALLOW: usize = 0;
const ALLOW_ONCE: usize = 1;
const DENY: usize = 2;
const ASK_LATER: usize = 3;

/// Answers "which page owns this window" for the permission manager.
pub trait PageDirectory: Send + Sync {
    fn session_for_window(&self, id: &WindowId) -> Option<String>;
    fn is_window_alive(&self, id: &WindowId) -> bool;
    /// URL currently loaded in the window's top frame.
    fn url_for_window(&self, id: &WindowId) -> Option<String>;
}

/// OS-level media access (camera/microphone privacy settings).
pub trait SystemPermissions: Send + Sync {
    fn media_access(&self, kind: MediaKind) -> BoxFuture<'static, bool>;
}

/// Platforms without a separate OS consent step.
///
/// macOS has one (AVCaptureDevice authorization); the webview triggers the
/// system prompt itself when the stream is opened, so it is treated as
/// granted here as well.
#[derive(Default)]
pub struct DefaultSystemPermissions;

impl SystemPermissions for DefaultSystemPermissions {
    fn media_access(&self, _kind: MediaKind) -> BoxFuture<'static, bool> {
        Box::pin(async { true })
    }
}

/// A request coming from a page. The requesting origin is resolved from
/// `window`.
#[derive(Debug, Clone)]
pub struct PermissionRequest {
    pub window: WindowId,
    pub permission: String,
    pub media_types: Vec<String>,
}

/// A synchronous capability check. Origin fields are tried most specific first.
#[derive(Debug, Clone, Default)]
pub struct PermissionCheck {
    pub window: Option<WindowId>,
    pub permission: String,
    pub media_type: Option<String>,
    pub security_origin: Option<String>,
    pub requesting_url: Option<String>,
    pub embedding_origin: Option<String>,
    pub frame_url: Option<String>,
}

impl PermissionCheck {
    fn origin_source(&self) -> Option<&str> {
        [
            &self.security_origin,
            &self.requesting_url,
            &self.embedding_origin,
            &self.frame_url,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .find(|value| !value.trim().is_empty())
    }
}

/// What a granted screen share may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMediaGrant {
    pub source_id: String,
    pub audio: Option<String>,
}

/// Origin used as the grant key: scheme://host[:port], or the path of a file.
pub fn origin_of(raw: &str) -> WebTrayResult<String> {
    let url = url::Url::parse(raw).map_err(|e| WebTrayError::OriginError(format!("{}: {}", raw, e)))?;
    if url.scheme() == "file" {
        return url
            .to_file_path()
            .map(|path| path.display().to_string())
            .map_err(|_| WebTrayError::OriginError(format!("{}: not a local path", raw)));
    }
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(WebTrayError::OriginError(format!("{}: opaque origin", raw)));
    }
    Ok(origin.ascii_serialization())
}

pub type ChangeNotifier = Arc<dyn Fn() + Send + Sync>;

pub struct PermissionManager {
    store: Arc<Store>,
    modals: Arc<ModalService>,
    sources: Arc<dyn SourceProvider>,
    system: Arc<dyn SystemPermissions>,
    sessions: Arc<SessionRegistry>,
    directory: RwLock<Option<Weak<dyn PageDirectory>>>,
    /// window -> {(origin, capability)} granted until the next navigation
    temporary: Mutex<HashMap<WindowId, HashSet<(String, String)>>>,
    queue: TaskQueue,
    on_change: RwLock<Option<ChangeNotifier>>,
}

impl PermissionManager {
    pub fn new(
        store: Arc<Store>,
        modals: Arc<ModalService>,
        sources: Arc<dyn SourceProvider>,
        system: Arc<dyn SystemPermissions>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            modals,
            sources,
            system,
            sessions: Arc::new(SessionRegistry::default()),
            directory: RwLock::new(None),
            temporary: Mutex::new(HashMap::new()),
            queue: TaskQueue::new("permissions"),
            on_change: RwLock::new(None),
        })
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.sessions)
    }

    /// Attach to the page directory and start managing sessions.
    pub fn install(&self, directory: Weak<dyn PageDirectory>) {
        *self.directory.write() = Some(directory);
        self.sessions.install();
        log::info!("[PERMISSIONS] Handlers installed");
    }

    /// Called after every prompt resolution that may have changed grants.
    pub fn on_change(&self, notifier: ChangeNotifier) {
        *self.on_change.write() = Some(notifier);
    }

    fn notify_changed(&self) {
        if let Some(notify) = self.on_change.read().clone() {
            notify();
        }
    }

    fn directory(&self) -> Option<Arc<dyn PageDirectory>> {
        self.directory.read().as_ref()?.upgrade()
    }

    /// Session of a window, if the window belongs to a managed session.
    fn managed_session(&self, directory: &dyn PageDirectory, window: &WindowId) -> Option<String> {
        let Some(session) = directory.session_for_window(window) else {
            log::warn!("[PERMISSIONS] No page owns window {}", window);
            return None;
        };
        match self.sessions.gate(&session) {
            SessionGate::Managed => Some(session),
            SessionGate::DenyAll => {
                log::warn!("[PERMISSIONS] Session '{}' is not managed yet, denying", session);
                None
            },
        }
    }

    // ========================================================================
    // Temporary grants
    // ========================================================================

    fn has_temporary(&self, window: &WindowId, origin: &str, capability: &str) -> bool {
        self.temporary
            .lock()
            .get(window)
            .is_some_and(|grants| grants.contains(&(origin.to_string(), capability.to_string())))
    }

    fn add_temporary(&self, window: &WindowId, origin: &str, capabilities: &[String]) {
        let mut temporary = self.temporary.lock();
        let grants = temporary.entry(window.clone()).or_default();
        for capability in capabilities {
            grants.insert((origin.to_string(), capability.clone()));
        }
    }

    /// Drop "allow once" grants of a window (navigation, close or replacement).
    pub fn clear_temporary(&self, window: &WindowId) {
        if self.temporary.lock().remove(window).is_some() {
            log::debug!("[PERMISSIONS] Cleared temporary grants of {}", window);
        }
    }

    #[cfg(test)]
    pub(crate) fn has_temporary_grants(&self, window: &WindowId) -> bool {
        self.temporary.lock().contains_key(window)
    }

    /// Origin of the window's loaded document. Fails closed.
    fn window_origin(&self, directory: &dyn PageDirectory, window: &WindowId) -> Option<String> {
        let Some(url) = directory.url_for_window(window) else {
            log::warn!("[PERMISSIONS] Window {} reports no URL, denying", window);
            return None;
        };
        origin_of(&url)
            .map_err(|e| log::warn!("[PERMISSIONS] Denying request from {}: {}", window, e))
            .ok()
    }

    // ========================================================================
    // Check
    // ========================================================================

    /// Synchronous, never prompts. Only an explicit deny fails.
    pub fn check(&self, check: &PermissionCheck) -> bool {
        let Some(directory) = self.directory() else {
            return false;
        };
        let Some(window) = check.window.as_ref() else {
            return false;
        };
        let Some(session) = self.managed_session(directory.as_ref(), window) else {
            return false;
        };
        let Some(source) = check.origin_source() else {
            log::warn!("[PERMISSIONS] Check for {} has no origin", check.permission);
            return false;
        };
        let origin = match origin_of(source) {
            Ok(origin) => origin,
            Err(e) => {
                log::warn!("[PERMISSIONS] {}", e);
                return false;
            },
        };

        let subtypes: Vec<&str> = check.media_type.as_deref().into_iter().collect();
        capability::capability_keys(&check.permission, &subtypes)
            .iter()
            .all(|cap| {
                self.has_temporary(window, &origin, cap)
                    || self.store.permission(&session, &origin, cap) != Some(PermissionStatus::Deny)
            })
    }

    // ========================================================================
    // Request
    // ========================================================================

    /// Decide a request, prompting if needed. Requests are serialized.
    pub async fn request(self: &Arc<Self>, request: PermissionRequest) -> bool {
        let this = Arc::clone(self);
        match self.queue.run(async move { this.run_request(request).await }).await {
            Ok(granted) => granted,
            Err(e) => {
                log::error!("[PERMISSIONS] Request pipeline failed: {}", e);
                false
            },
        }
    }

    async fn run_request(&self, request: PermissionRequest) -> bool {
        let Some(directory) = self.directory() else {
            return false;
        };
        let Some(session) = self.managed_session(directory.as_ref(), &request.window) else {
            return false;
        };
        let Some(origin) = self.window_origin(directory.as_ref(), &request.window) else {
            return false;
        };

        let mut pending = Vec::new();
        for cap in capability::capability_keys(&request.permission, &request.media_types) {
            if self.has_temporary(&request.window, &origin, &cap) {
                continue;
            }
            match self.store.permission(&session, &origin, &cap) {
                Some(PermissionStatus::Deny) => {
                    log::info!("[PERMISSIONS] {} denied for {} ({})", cap, origin, session);
                    return false;
                },
                Some(PermissionStatus::Allow) => {},
                Some(PermissionStatus::Ask) | None => {
                    if let Some(kind) = capability::media_kind(&cap) {
                        if !self.system.media_access(kind).await {
                            log::info!("[PERMISSIONS] OS denied {:?} access", kind);
                            return false;
                        }
                    }
                    pending.push(cap);
                },
            }
        }
        if pending.is_empty() {
            return true;
        }

        let labels: Vec<String> = pending.iter().map(|cap| capability::label(cap)).collect();
        let options = DialogOptions::new(
            "Permission request",
            format!("{} wants to use:", origin),
        )
        .detail(labels.join("\n"))
        .buttons(PROMPT_BUTTONS)
        .default_id(ASK_LATER)
        .cancel_id(ASK_LATER);

        let answer = self.modals.show(Some(request.window.clone()), options).await;
        if !directory.is_window_alive(&request.window) {
            log::info!("[PERMISSIONS] Window {} went away during the prompt", request.window);
            return false;
        }
        let choice = match answer {
            Ok(result) => result.response,
            Err(e) => {
                log::error!("[PERMISSIONS] Prompt failed: {}", e);
                return false;
            },
        };

        let (status, granted) = match choice {
            ALLOW => (Some(PermissionStatus::Allow), true),
            ALLOW_ONCE => (Some(PermissionStatus::Ask), true),
            DENY => (Some(PermissionStatus::Deny), false),
            _ => (None, false),
        };
        if let Some(status) = status {
            for cap in &pending {
                if let Err(e) = self.store.set_permission(&session, &origin, cap, status) {
                    log::error!("[PERMISSIONS] Failed to persist {}: {}", cap, e);
                }
            }
        }
        if choice == ALLOW_ONCE {
            self.add_temporary(&request.window, &origin, &pending);
        }
        log::info!(
            "[PERMISSIONS] {} for {} -> {}",
            pending.join(", "),
            origin,
            PROMPT_BUTTONS.get(choice).copied().unwrap_or("dismissed")
        );
        self.notify_changed();
        granted
    }

    // ========================================================================
    // Display media
    // ========================================================================

    /// Let the user pick a screen or window to share. `None` denies.
    pub async fn request_display_media(
        self: &Arc<Self>,
        window: WindowId,
        audio_requested: bool,
    ) -> Option<DisplayMediaGrant> {
        let this = Arc::clone(self);
        let task = async move { this.run_display_media(window, audio_requested).await };
        match self.queue.run(task).await {
            Ok(grant) => grant,
            Err(e) => {
                log::error!("[PERMISSIONS] Display media pipeline failed: {}", e);
                None
            },
        }
    }

    async fn run_display_media(
        &self,
        window: WindowId,
        audio_requested: bool,
    ) -> Option<DisplayMediaGrant> {
        let directory = self.directory()?;
        let session = self.managed_session(directory.as_ref(), &window)?;
        let origin = self.window_origin(directory.as_ref(), &window)?;
        if self.store.permission(&session, &origin, DISPLAY_CAPTURE) == Some(PermissionStatus::Deny) {
            return None;
        }

        let sources = self
            .sources
            .sources()
            .map_err(|e| log::error!("[PERMISSIONS] Cannot list share sources: {}", e))
            .ok()?;
        let options = ScreenPickerOptions {
            origin,
            offer_audio: audio_requested,
            sources: sources.clone(),
        };
        let selection = self
            .modals
            .pick_screen_source(Some(window.clone()), options)
            .await
            .map_err(|e| log::error!("[PERMISSIONS] Screen picker failed: {}", e))
            .ok()??;
        if !directory.is_window_alive(&window) {
            return None;
        }

        let source = sources.iter().find(|s| s.id == selection.source_id)?;
        let audio = (audio_requested && selection.share_audio && source.supports_audio)
            .then(|| LOOPBACK_AUDIO.to_string());
        Some(DisplayMediaGrant {
            source_id: source.id.clone(),
            audio,
        })
    }
}
