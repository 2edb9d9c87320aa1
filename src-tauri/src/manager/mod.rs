//! Page/window manager.
//!
//! ## Architecture
//!
//! ```text
//! handle.rs (ManagerHandle: event loop, settings, shortcuts, tray)
//!   |
//!   +-- PageManager (this file: pages, current page, reconciliation)
//!   +-- menu.rs     (context menu model)
//!   +-- settings.rs (setting id -> live effect)
//!   +-- shell.rs    (ShellHost seam: tray, shortcuts, settings window)
//! ```
//!
//! `PageManager` is plain synchronous state. It sits behind a mutex inside
//! [`ManagerHandle`], which is never held across an await. Operations run on
//! the main thread; window events reach the handle through a channel, never
//! by calling back into the manager while it is locked.

pub mod handle;
pub mod menu;
pub mod settings;
pub mod shell;

pub use handle::ManagerHandle;
pub use menu::{MenuAction, MenuModel, WindowAction};
pub use shell::{ShellHost, ShortcutAction, SystemTheme};

use std::sync::Arc;

use crate::error::{WebTrayError, WebTrayResult};
use crate::page::{Page, CLIPBOARD_PAGE_ID};
use crate::store::StoredPage;
use crate::window::{Listener, PageWindow, WindowContext, WindowEventKind, WindowId};
use menu::{CurrentWindow, PageStatus};

/// Events forwarded from every page window to the manager.
const FORWARDED_EVENTS: [WindowEventKind; 5] = [
    WindowEventKind::Shown,
    WindowEventKind::Hidden,
    WindowEventKind::Navigated,
    WindowEventKind::Replaced,
    WindowEventKind::Closed,
];

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub added: usize,
    pub removed: usize,
    /// No page can open a window; the user has to configure one.
    pub needs_setup: bool,
}

pub struct PageManager {
    ctx: Arc<WindowContext>,
    pages: Vec<Page>,
    clipboard: Option<Page>,
    current: Option<String>,
    forward: Listener,
}

impl PageManager {
    /// `forward` is attached to every window the manager creates.
    pub fn new(ctx: Arc<WindowContext>, forward: Listener) -> Self {
        Self {
            ctx,
            pages: Vec::new(),
            clipboard: None,
            current: None,
            forward,
        }
    }

    pub fn context(&self) -> &Arc<WindowContext> {
        &self.ctx
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.all_pages().find(|page| page.id == id)
    }

    fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        if id == CLIPBOARD_PAGE_ID {
            return self.clipboard.as_mut();
        }
        self.pages.iter_mut().find(|page| page.id == id)
    }

    fn all_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().chain(self.clipboard.iter())
    }

    fn all_pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.pages.iter_mut().chain(self.clipboard.iter_mut())
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current.as_deref().and_then(|id| self.page(id))
    }

    pub fn current_window(&self) -> Option<Arc<PageWindow>> {
        self.current_page()?.window().cloned()
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Bring the page list in line with freshly loaded configuration.
    ///
    /// Pages that survive keep their object (and window); their fields are
    /// overwritten from the new record. Every page is processed even if one
    /// fails; the first failure is returned.
    pub fn update_pages(&mut self, records: &[StoredPage]) -> WebTrayResult<Reconciled> {
        let mut previous = std::mem::take(&mut self.pages);
        let mut next = Vec::with_capacity(records.len());
        let mut outcome = Reconciled::default();
        let mut first_error = None;

        for record in records {
            let fresh = Page::from_stored(&self.ctx, record);
            match previous.iter().position(|page| page.id == fresh.id) {
                Some(index) => {
                    let mut page = previous.remove(index);
                    if let Err(e) = page.copy_from(fresh) {
                        log::error!("[MANAGER] Failed to update page {}: {}", page.id, e);
                        first_error.get_or_insert(e);
                    }
                    next.push(page);
                },
                None => {
                    log::info!("[MANAGER] Added page {} ({})", fresh.id, fresh.label);
                    outcome.added += 1;
                    next.push(fresh);
                },
            }
        }

        for mut removed in previous {
            log::info!("[MANAGER] Removed page {} ({})", removed.id, removed.label);
            removed.close_window();
            if let Err(e) = self.ctx.store.delete_bounds(&removed.id) {
                first_error.get_or_insert(e);
            }
            if self.current.as_deref() == Some(removed.id.as_str()) {
                self.current = None;
            }
            outcome.removed += 1;
        }
        self.pages = next;

        if !self.pages.iter().any(Page::can_open_window) {
            self.current = None;
            outcome.needs_setup = true;
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Make `id` the current page.
    ///
    /// Selecting the current page toggles its window instead. The previous
    /// page is suspended only after the new window is on screen.
    pub fn select_page(&mut self, id: &str) -> WebTrayResult<()> {
        let forward = Arc::clone(&self.forward);
        let is_current = self.current.as_deref() == Some(id);
        let page = self
            .page_mut(id)
            .ok_or_else(|| WebTrayError::PageNotFound { id: id.to_string() })?;

        if is_current {
            if let Some(window) = page.window() {
                let visible = window.toggle_visibility()?;
                log::debug!("[MANAGER] Toggled page {} (visible: {})", id, visible);
                return Ok(());
            }
        }

        let window = match page.window().cloned() {
            Some(window) => window,
            None => {
                let window = page.create_window()?;
                for kind in FORWARDED_EVENTS {
                    window.on(kind, Arc::clone(&forward));
                }
                window
            },
        };
        // Also covers a kept window whose page was reconciled since.
        if !page.bounds_applied() {
            page.update_window_bounds()?;
        }
        if window.is_visible() {
            window.focus()?;
        } else {
            window.show()?;
        }

        let previous = self.current.replace(id.to_string());
        if let Some(previous) = previous.filter(|previous| previous != id) {
            if let Some(page) = self.page_mut(&previous) {
                page.suspend_window();
            }
        }
        log::info!("[MANAGER] Selected page {}", id);
        Ok(())
    }

    /// Open `url` as the clipboard page and select it.
    pub fn select_clipboard_page(&mut self, url: &str) -> WebTrayResult<()> {
        match self.clipboard.as_mut() {
            Some(page) => {
                page.change_url(url)?;
            },
            None => self.clipboard = Some(Page::clipboard(&self.ctx, url)),
        }
        if self.current.as_deref() == Some(CLIPBOARD_PAGE_ID) {
            // Selecting again would only toggle it away.
            if let Some(window) = self.clipboard.as_ref().and_then(Page::window) {
                return window.show();
            }
        }
        self.select_page(CLIPBOARD_PAGE_ID)
    }

    pub fn select_next(&mut self) -> WebTrayResult<()> {
        self.select_relative(1)
    }

    pub fn select_previous(&mut self) -> WebTrayResult<()> {
        self.select_relative(-1)
    }

    /// Step through window-capable pages, wrapping around.
    fn select_relative(&mut self, step: isize) -> WebTrayResult<()> {
        let candidates: Vec<String> = self
            .pages
            .iter()
            .filter(|page| page.can_open_window())
            .map(|page| page.id.clone())
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }
        let len = candidates.len() as isize;
        let position = self
            .current
            .as_deref()
            .and_then(|current| candidates.iter().position(|id| id == current));
        let target = match position {
            Some(index) => (index as isize + step).rem_euclid(len),
            None if step > 0 => 0,
            None => len - 1,
        };
        let id = candidates[target as usize].clone();
        if self.current.as_deref() == Some(id.as_str()) {
            // A single page: show it rather than toggle it away.
            if let Some(window) = self.current_window() {
                return window.show();
            }
        }
        self.select_page(&id)
    }

    /// Toggle the current page, or select the first usable one.
    pub fn toggle_current(&mut self) -> WebTrayResult<()> {
        match self.current.clone() {
            Some(id) => self.select_page(&id),
            None => self.select_next(),
        }
    }

    /// Run a window-menu action on the current page.
    pub fn window_action(&mut self, action: WindowAction) -> WebTrayResult<()> {
        let Some(id) = self.current.clone() else {
            return Ok(());
        };
        if action == WindowAction::Close {
            if let Some(page) = self.page_mut(&id) {
                page.close_window();
            }
            return Ok(());
        }
        let Some(window) = self.current_window() else {
            return Ok(());
        };
        match action {
            WindowAction::Reset => window.reset(),
            WindowAction::ToggleMute => window.toggle_mute().map(|_| ()),
            WindowAction::ToggleMaximize => window.toggle_maximize().map(|_| ()),
            WindowAction::Find => {
                window.show()?;
                window.open_findbar()
            },
            WindowAction::Hide => window.hide(),
            WindowAction::Close => Ok(()),
        }
    }

    // ========================================================================
    // Window lookup and bulk operations
    // ========================================================================

    /// Any managed window, page or popup.
    pub fn find_window(&self, id: &WindowId) -> Option<Arc<PageWindow>> {
        self.all_pages()
            .filter_map(Page::window)
            .find_map(|window| window.find_window(id))
    }

    pub fn live_windows(&self) -> Vec<Arc<PageWindow>> {
        self.all_pages().filter_map(Page::window).cloned().collect()
    }

    /// Rebuild every live window with the current chrome settings.
    pub fn recreate_all_windows(&mut self) -> WebTrayResult<usize> {
        let mut count = 0;
        let mut first_error = None;
        for page in self.all_pages_mut() {
            if !page.has_window() {
                continue;
            }
            match page.recreate_window(true) {
                Ok(()) => count += 1,
                Err(e) => {
                    log::error!("[MANAGER] Failed to recreate window of {}: {}", page.id, e);
                    first_error.get_or_insert(e);
                },
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    pub fn reapply_bounds(&mut self) {
        for page in self.all_pages_mut() {
            if let Err(e) = page.update_window_bounds() {
                log::warn!("[MANAGER] Failed to apply bounds to {}: {}", page.id, e);
            }
        }
    }

    pub fn reapply_opacity(&self) {
        for window in self.live_windows() {
            window.apply_opacity();
            for popup in window.live_popups() {
                popup.apply_opacity();
            }
        }
    }

    /// Close every window. Used on quit.
    pub fn close_all(&mut self) {
        for page in self.all_pages_mut() {
            page.close_window();
        }
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn page_statuses(&self) -> Vec<PageStatus> {
        self.pages
            .iter()
            .map(|page| PageStatus {
                id: page.id.clone(),
                label: page.label.clone(),
                openable: page.can_open_window(),
                current: self.current.as_deref() == Some(page.id.as_str()),
                open: page.has_window(),
                visible: page.is_window_visible(),
            })
            .collect()
    }

    pub fn current_window_state(&self) -> Option<CurrentWindow> {
        self.current_window().map(|window| CurrentWindow {
            muted: window.is_muted(),
            maximized: window.is_maximized(),
        })
    }

    pub fn is_current_visible(&self) -> bool {
        self.current_page().is_some_and(Page::is_window_visible)
    }
}
