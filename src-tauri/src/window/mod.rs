//! Page windows.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs (PageWindow: chrome policy, clone, reset, toggles, popups)
//!   |
//!   +-- native.rs       (NativeWindow / WindowFactory seam)
//!   +-- tauri_window.rs (WebviewWindow implementation)
//!   +-- listeners.rs    (internal vs user listener registries, lifecycle)
//!   +-- debounce.rs     (trailing-edge debounce for bounds persistence)
//!   +-- popup.rs        (popup policy)
//! ```
//!
//! A `PageWindow` is never mutated into a different native window. Options
//! that cannot change on a live window (frame, fullscreen, session) are
//! applied by cloning into a fresh native window and force-closing the old
//! one.

pub mod debounce;
pub mod listeners;
#[cfg(test)]
pub mod mock;
pub mod native;
pub mod popup;
pub mod tauri_window;

pub use listeners::{EventHub, Listener, ListenerRegistry, WindowState};
pub use native::{
    EventSink, LoadTarget, NativeWindow, WindowEvent, WindowEventKind, WindowFactory, WindowId,
    WindowOptionsOverride, WindowSpec,
};
pub use popup::PopupAction;
pub use tauri_window::TauriWindowFactory;

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::config::Settings;
use crate::error::WebTrayResult;
use crate::modal::ModalService;
use crate::page::bounds::{Rect, StoredBounds};
use crate::store::Store;
use debounce::{Debouncer, BOUNDS_QUIET_PERIOD};

/// Services every page window needs.
pub struct WindowContext {
    pub factory: Arc<dyn WindowFactory>,
    pub store: Arc<Store>,
    pub modals: Arc<ModalService>,
    /// The shared-bounds reset applies once per process.
    shared_reset_consumed: AtomicBool,
}

impl WindowContext {
    pub fn new(
        factory: Arc<dyn WindowFactory>,
        store: Arc<Store>,
        modals: Arc<ModalService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            factory,
            store,
            modals,
            shared_reset_consumed: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> Settings {
        Settings::load(&self.store)
    }

    pub fn shared_reset_consumed(&self) -> bool {
        self.shared_reset_consumed.load(Ordering::SeqCst)
    }

    pub fn consume_shared_reset(&self) {
        self.shared_reset_consumed.store(true, Ordering::SeqCst);
    }
}

/// Whether a window is a page's main window or a popup it opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    Page,
    Popup,
}

pub struct PageWindow {
    ctx: Arc<WindowContext>,
    spec: WindowSpec,
    role: WindowRole,
    native: Arc<dyn NativeWindow>,
    hub: Arc<EventHub>,
    loaded: Mutex<LoadTarget>,
    muted: AtomicBool,
    focused: AtomicBool,
    findbar_open: AtomicBool,
    popups: Mutex<Vec<Arc<PageWindow>>>,
    bounds_writer: Debouncer,
}

impl PageWindow {
    /// Create the native window for `spec` and install internal listeners.
    ///
    /// `user_listeners` carries caller listeners over from a window being
    /// cloned.
    pub fn open(
        ctx: &Arc<WindowContext>,
        spec: WindowSpec,
        role: WindowRole,
        user_listeners: Option<ListenerRegistry>,
    ) -> WebTrayResult<Arc<Self>> {
        let hub = EventHub::new();
        let sink: EventSink = {
            let hub = Arc::clone(&hub);
            Arc::new(move |event| hub.dispatch(event))
        };
        let native = ctx.factory.create(&spec, sink)?;
        hub.attach(native.id());
        if let Some(registry) = user_listeners {
            hub.replace_user_listeners(registry);
        }
        log::info!(
            "[WINDOW] Created {} for page {} (session {})",
            native.id(),
            spec.page_id,
            spec.session
        );

        let window = Arc::new_cyclic(|weak: &Weak<PageWindow>| {
            let writer = weak.clone();
            Self {
                ctx: Arc::clone(ctx),
                loaded: Mutex::new(spec.target.clone()),
                spec,
                role,
                native,
                hub,
                muted: AtomicBool::new(false),
                focused: AtomicBool::new(false),
                findbar_open: AtomicBool::new(false),
                popups: Mutex::new(Vec::new()),
                bounds_writer: Debouncer::new(BOUNDS_QUIET_PERIOD, move || {
                    if let Some(window) = writer.upgrade() {
                        window.persist_bounds();
                    }
                }),
            }
        });
        window.install_internal_listeners();
        Ok(window)
    }

    fn install_internal_listeners(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let on_focus: Listener = {
            let weak = weak.clone();
            Arc::new(move |event, _| {
                if let Some(window) = weak.upgrade() {
                    window
                        .focused
                        .store(*event == WindowEvent::Focused, Ordering::SeqCst);
                    window.apply_opacity();
                }
            })
        };
        self.hub.add_internal(WindowEventKind::Focused, on_focus.clone());
        self.hub.add_internal(WindowEventKind::Blurred, on_focus);

        if self.role == WindowRole::Page {
            let on_geometry: Listener = {
                let weak = weak.clone();
                Arc::new(move |_, _| {
                    if let Some(window) = weak.upgrade() {
                        window.bounds_writer.call();
                    }
                })
            };
            self.hub.add_internal(WindowEventKind::Moved, on_geometry.clone());
            self.hub.add_internal(WindowEventKind::Resized, on_geometry);
        }

        let modals = Arc::clone(&self.ctx.modals);
        let cascade: Listener = Arc::new(move |event, id| modals.parent_event(id, event));
        for kind in [
            WindowEventKind::Shown,
            WindowEventKind::Hidden,
            WindowEventKind::Moved,
            WindowEventKind::Resized,
            WindowEventKind::Replaced,
            WindowEventKind::Closed,
        ] {
            self.hub.add_internal(kind, cascade.clone());
        }

        let on_closed: Listener = Arc::new(move |_, _| {
            if let Some(window) = weak.upgrade() {
                window.close_popups();
            }
        });
        self.hub.add_internal(WindowEventKind::Closed, on_closed);
    }

    // ========================================================================
    // Identity and state
    // ========================================================================

    pub fn id(&self) -> WindowId {
        self.native.id()
    }

    pub fn page_id(&self) -> &str {
        &self.spec.page_id
    }

    pub fn session(&self) -> &str {
        &self.spec.session
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    pub fn role(&self) -> WindowRole {
        self.role
    }

    pub fn state(&self) -> WindowState {
        self.hub.state()
    }

    pub fn is_alive(&self) -> bool {
        self.hub.state().is_live() && !self.native.is_destroyed()
    }

    pub fn is_visible(&self) -> bool {
        self.is_alive() && self.native.is_visible()
    }

    /// Visibility as last reported by the window's own show/hide events.
    /// Does not query the platform.
    pub fn is_shown(&self) -> bool {
        self.hub.state() == WindowState::Visible && self.is_alive()
    }

    pub fn is_maximized(&self) -> bool {
        self.is_alive() && self.native.is_maximized()
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn is_findbar_open(&self) -> bool {
        self.findbar_open.load(Ordering::SeqCst)
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.native.bounds()
    }

    pub fn loaded_target(&self) -> LoadTarget {
        self.loaded.lock().clone()
    }

    /// Where the page actually is now, in-page navigation included.
    pub fn current_url(&self) -> Option<String> {
        if !self.is_alive() {
            return None;
        }
        self.native.url()
    }

    /// Register a caller listener. These survive [`clone_with`](Self::clone_with).
    pub fn on(&self, kind: WindowEventKind, listener: Listener) {
        self.hub.add_user(kind, listener);
    }

    /// Feed an event from the native layer.
    pub fn dispatch(&self, event: WindowEvent) {
        self.hub.dispatch(event);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    pub fn load_url(&self, url: &str) -> WebTrayResult<()> {
        self.load(LoadTarget::Url(url.to_string()))
    }

    pub fn load_file(&self, path: PathBuf) -> WebTrayResult<()> {
        self.load(LoadTarget::File(path))
    }

    fn load(&self, target: LoadTarget) -> WebTrayResult<()> {
        self.native.load(&target)?;
        *self.loaded.lock() = target;
        Ok(())
    }

    /// Reload whatever was last loaded, discarding in-page navigation.
    pub fn reset(&self) -> WebTrayResult<()> {
        let target = self.loaded_target();
        log::debug!("[WINDOW] Resetting {} to {:?}", self.id(), target);
        self.native.load(&target)
    }

    // ========================================================================
    // Visibility, mute, maximize, bounds
    // ========================================================================

    pub fn show(&self) -> WebTrayResult<()> {
        self.native.show()?;
        self.native.focus()
    }

    pub fn hide(&self) -> WebTrayResult<()> {
        self.native.hide()
    }

    pub fn focus(&self) -> WebTrayResult<()> {
        self.native.focus()
    }

    pub fn toggle_visibility(&self) -> WebTrayResult<bool> {
        if self.native.is_visible() {
            self.hide()?;
            Ok(false)
        } else {
            self.show()?;
            Ok(true)
        }
    }

    pub fn set_muted(&self, muted: bool) -> WebTrayResult<()> {
        self.native.set_muted(muted)?;
        self.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    pub fn toggle_mute(&self) -> WebTrayResult<bool> {
        let muted = !self.is_muted();
        self.set_muted(muted)?;
        Ok(muted)
    }

    pub fn toggle_maximize(&self) -> WebTrayResult<bool> {
        let maximized = !self.native.is_maximized();
        self.native.set_maximized(maximized)?;
        self.apply_opacity();
        Ok(maximized)
    }

    pub fn set_bounds(&self, bounds: Rect) -> WebTrayResult<()> {
        self.native.set_bounds(bounds)
    }

    /// Set opacity from the current focus state and settings.
    pub fn apply_opacity(&self) {
        if !self.is_alive() {
            return;
        }
        let settings = self.ctx.settings();
        let keep = settings.keep_opacity_when_maximized && self.native.is_maximized();
        let opacity = if self.focused.load(Ordering::SeqCst) || keep {
            settings.focus_opacity
        } else {
            settings.blur_opacity
        };
        if let Err(e) = self.native.set_opacity(opacity) {
            log::warn!("[WINDOW] Failed to set opacity on {}: {}", self.id(), e);
        }
    }

    /// Debounced target. The window may be gone by the time this runs.
    fn persist_bounds(&self) {
        if !self.is_alive() || self.native.is_maximized() {
            return;
        }
        let Some(rect) = self.native.bounds() else {
            return;
        };
        let bounds = StoredBounds::from(rect);
        let result = if self.ctx.settings().shared_bounds {
            self.ctx.store.set_shared_bounds(&bounds)
        } else {
            self.ctx.store.set_bounds(self.page_id(), &bounds)
        };
        match result {
            Ok(()) => log::debug!("[WINDOW] Saved bounds for page {}: {:?}", self.page_id(), rect),
            Err(e) => log::error!("[WINDOW] Failed to save bounds for {}: {}", self.page_id(), e),
        }
    }

    // ========================================================================
    // Find in page
    // ========================================================================

    pub fn open_findbar(&self) -> WebTrayResult<()> {
        self.native.set_findbar_visible(true)?;
        self.findbar_open.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn close_findbar(&self) -> WebTrayResult<()> {
        self.native.set_findbar_visible(false)?;
        self.findbar_open.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn find(&self, text: &str, forward: bool) -> WebTrayResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.native.find(text, forward)
    }

    // ========================================================================
    // Cloning and teardown
    // ========================================================================

    /// Build a new native window with the same page id, bounds, loaded
    /// target, mute state and user listeners. The old window is untouched.
    pub fn clone_with(&self, options: &WindowOptionsOverride) -> WebTrayResult<Arc<PageWindow>> {
        let mut spec = self.spec.clone().with_override(options);
        spec.target = self.loaded_target();
        spec.bounds = self.native.bounds().or(self.spec.bounds);

        let clone = PageWindow::open(&self.ctx, spec, self.role, Some(self.hub.user_listeners()))?;
        if self.is_muted() {
            clone.set_muted(true)?;
        }
        Ok(clone)
    }

    /// Silence every listener so teardown does not reach callers.
    pub fn detach_listeners(&self) {
        self.hub.clear();
    }

    /// Tear down a window a clone has taken over. Listeners hear `Replaced`
    /// and nothing after it; `Closed` is never delivered.
    pub fn retire(&self) {
        self.hub.dispatch(WindowEvent::Replaced);
        self.detach_listeners();
        self.force_close();
    }

    /// Close, and if the window survives that, report it closed and destroy it.
    pub fn force_close(&self) {
        self.hub.begin_close();
        self.close_popups();
        if let Err(e) = self.native.close() {
            log::warn!("[WINDOW] Close failed for {}: {}", self.id(), e);
        }
        if !self.native.is_destroyed() {
            self.hub.dispatch(WindowEvent::Closed);
            if let Err(e) = self.native.destroy() {
                log::warn!("[WINDOW] Destroy failed for {}: {}", self.id(), e);
            }
        }
    }

    // ========================================================================
    // Popups
    // ========================================================================

    /// Handle a page's request to open `url` in a new window.
    ///
    /// `OpenChild` has already been carried out when returned; `OpenExternal`
    /// is left to the caller. Children share this window's user listeners.
    pub fn open_popup(&self, url: &str) -> WebTrayResult<PopupAction> {
        let action = popup::decide(self.ctx.settings().popup_policy, url);
        if let PopupAction::OpenChild(url) = &action {
            let spec = WindowSpec {
                page_id: self.spec.page_id.clone(),
                title: url.clone(),
                target: LoadTarget::Url(url.clone()),
                session: self.spec.session.clone(),
                show_frame: self.spec.show_frame,
                allow_fullscreen: self.spec.allow_fullscreen,
                bounds: None,
                opener: Some(self.id()),
            };
            let child = PageWindow::open(
                &self.ctx,
                spec,
                WindowRole::Popup,
                Some(self.hub.user_listeners()),
            )?;
            child.show()?;
            self.popups.lock().push(child);
        }
        Ok(action)
    }

    /// Find this window or one of its popups, at any depth.
    pub fn find_window(self: &Arc<Self>, id: &WindowId) -> Option<Arc<PageWindow>> {
        if &self.id() == id {
            return Some(Arc::clone(self));
        }
        self.live_popups()
            .iter()
            .find_map(|popup| popup.find_window(id))
    }

    pub fn live_popups(&self) -> Vec<Arc<PageWindow>> {
        let mut popups = self.popups.lock();
        popups.retain(|popup| popup.is_alive());
        popups.clone()
    }

    fn close_popups(&self) {
        let popups: Vec<_> = self.popups.lock().drain(..).collect();
        for popup in popups {
            popup.force_close();
        }
    }
}

#[cfg(test)]
mod tests;
