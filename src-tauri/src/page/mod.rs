//! Pages: user-configured destinations, independent of any live window.

pub mod bounds;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{WebTrayError, WebTrayResult};
use crate::store::schema::DEFAULT_SESSION;
use crate::store::StoredPage;
use crate::window::{
    LoadTarget, PageWindow, WindowContext, WindowOptionsOverride, WindowRole, WindowSpec,
};
use bounds::{resolve_bounds, BoundsRequest, FALLBACK_WORK_AREA};

/// Id of the synthetic page that opens a URL found on the clipboard.
pub const CLIPBOARD_PAGE_ID: &str = "clipboard";
pub const CLIPBOARD_PAGE_LABEL: &str = "Clipboard URL";

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

pub struct Page {
    ctx: Arc<WindowContext>,
    /// Distinguishes Page objects with the same id. Survives `copy_from`.
    instance: u64,
    pub id: String,
    pub label: String,
    pub url: String,
    pub session: String,
    pub persist: bool,
    bounds_applied: bool,
    window: Option<Arc<PageWindow>>,
}

impl Page {
    pub fn new(ctx: &Arc<WindowContext>, id: String, label: String, url: String) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            id,
            label,
            url,
            session: DEFAULT_SESSION.to_string(),
            persist: false,
            bounds_applied: false,
            window: None,
        }
    }

    /// Build from a stored record. Records must have been given an id by the store.
    pub fn from_stored(ctx: &Arc<WindowContext>, stored: &StoredPage) -> Self {
        let mut page = Self::new(
            ctx,
            stored.id.clone().unwrap_or_default(),
            stored.label.clone(),
            stored.url.clone(),
        );
        page.session = if stored.session.trim().is_empty() {
            DEFAULT_SESSION.to_string()
        } else {
            stored.session.clone()
        };
        page.persist = stored.persist;
        page
    }

    /// The non-persisted page for a URL taken from the clipboard.
    pub fn clipboard(ctx: &Arc<WindowContext>, url: &str) -> Self {
        Self::new(
            ctx,
            CLIPBOARD_PAGE_ID.to_string(),
            CLIPBOARD_PAGE_LABEL.to_string(),
            url.to_string(),
        )
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn is_clipboard(&self) -> bool {
        self.id == CLIPBOARD_PAGE_ID
    }

    pub fn can_open_window(&self) -> bool {
        !self.label.trim().is_empty() && !self.url.trim().is_empty() && self.url.contains("://")
    }

    pub fn bounds_applied(&self) -> bool {
        self.bounds_applied
    }

    /// The live window, if any. A window closed behind our back is dropped.
    pub fn window(&self) -> Option<&Arc<PageWindow>> {
        self.window.as_ref().filter(|w| w.is_alive())
    }

    pub fn has_window(&self) -> bool {
        self.window().is_some()
    }

    /// Tracked visibility; see [`PageWindow::is_shown`].
    pub fn is_window_visible(&self) -> bool {
        self.window().is_some_and(|w| w.is_shown())
    }

    // ========================================================================
    // Window lifecycle
    // ========================================================================

    pub fn create_window(&mut self) -> WebTrayResult<Arc<PageWindow>> {
        if self.has_window() {
            return Err(WebTrayError::WindowExists {
                page_id: self.id.clone(),
            });
        }
        if !self.can_open_window() {
            return Err(WebTrayError::PageNotOpenable {
                page_id: self.id.clone(),
            });
        }

        let settings = self.ctx.settings();
        let spec = WindowSpec {
            page_id: self.id.clone(),
            title: self.label.clone(),
            target: LoadTarget::from_location(&self.url),
            session: self.session.clone(),
            show_frame: settings.show_frame,
            allow_fullscreen: settings.allow_fullscreen,
            bounds: None,
            opener: None,
        };
        let window = PageWindow::open(&self.ctx, spec, WindowRole::Page, None)?;
        self.window = Some(Arc::clone(&window));
        Ok(window)
    }

    /// Swap the live window for a clone. With `force_options_refresh`, the
    /// clone takes its chrome options from the current settings.
    pub fn recreate_window(&mut self, force_options_refresh: bool) -> WebTrayResult<()> {
        let Some(old) = self.window().cloned() else {
            return Ok(());
        };

        let mut options = WindowOptionsOverride {
            title: Some(self.label.clone()),
            session: Some(self.session.clone()),
            ..Default::default()
        };
        if force_options_refresh {
            let settings = self.ctx.settings();
            options.show_frame = Some(settings.show_frame);
            options.allow_fullscreen = Some(settings.allow_fullscreen);
        }

        let was_visible = old.is_visible();
        let replacement = old.clone_with(&options)?;
        self.window = Some(Arc::clone(&replacement));

        old.retire();
        log::info!(
            "[PAGE] Recreated window for {}: {} -> {}",
            self.id,
            old.id(),
            replacement.id()
        );

        if was_visible {
            replacement.show()?;
        }
        Ok(())
    }

    /// Hide if the page persists across switches, otherwise close.
    pub fn suspend_window(&mut self) {
        if self.persist {
            if let Some(window) = self.window() {
                if let Err(e) = window.hide() {
                    log::warn!("[PAGE] Failed to hide {}: {}", self.id, e);
                }
            }
        } else {
            self.close_window();
        }
    }

    pub fn close_window(&mut self) {
        if let Some(window) = self.window.take() {
            window.force_close();
        }
    }

    /// Compute bounds per the reset policy and apply them to the live window.
    pub fn update_window_bounds(&mut self) -> WebTrayResult<()> {
        let Some(window) = self.window().cloned() else {
            return Ok(());
        };
        let settings = self.ctx.settings();
        let store = &self.ctx.store;
        let stored = if settings.shared_bounds {
            store.shared_bounds()
        } else {
            store.bounds(&self.id)
        };

        let resolved = resolve_bounds(&BoundsRequest {
            settings: &settings,
            stored,
            applied_this_session: self.bounds_applied,
            shared_reset_consumed: self.ctx.shared_reset_consumed(),
            work_area: self
                .ctx
                .factory
                .primary_work_area()
                .unwrap_or(FALLBACK_WORK_AREA),
        });
        if resolved.consumed_shared_reset {
            self.ctx.consume_shared_reset();
        }

        window.set_bounds(resolved.rect)?;
        self.bounds_applied = true;
        Ok(())
    }

    // ========================================================================
    // Configuration updates
    // ========================================================================

    /// Returns whether the URL changed. A live window reloads in place.
    pub fn change_url(&mut self, url: &str) -> WebTrayResult<bool> {
        if url.is_empty() || url == self.url {
            return Ok(false);
        }
        self.url = url.to_string();
        if let Some(window) = self.window() {
            window.load_url(url)?;
        }
        Ok(true)
    }

    /// Take the mutable fields of a freshly loaded page, keeping this
    /// object's identity and window.
    pub fn copy_from(&mut self, other: Page) -> WebTrayResult<()> {
        self.label = other.label;
        self.persist = other.persist;
        self.bounds_applied = other.bounds_applied;

        if other.session != self.session {
            // A live session cannot be swapped; the window must be rebuilt.
            let url_changed = other.url != self.url;
            self.session = other.session;
            self.url = other.url;
            self.recreate_window(false)?;
            if url_changed {
                if let Some(window) = self.window() {
                    window.load_url(&self.url)?;
                }
            }
        } else {
            self.change_url(&other.url)?;
        }
        Ok(())
    }

    pub fn to_stored(&self) -> StoredPage {
        StoredPage {
            id: Some(self.id.clone()),
            label: self.label.clone(),
            url: self.url.clone(),
            session: self.session.clone(),
            persist: self.persist,
        }
    }
}
