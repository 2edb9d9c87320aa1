//! Shared manager handle.
//!
//! Owns the locked [`PageManager`] plus everything that needs to await: the
//! window-event loop, confirmations, shortcut recovery. Commands, the tray
//! and shortcuts all go through this type.
//!
//! Manager operations run on the main thread. Native window calls made from
//! any other thread wait for the main thread, so a worker holding the lock
//! across one would stall the tray and every sync command. Off the main
//! thread the lock is only held for lookups; everything else goes through
//! [`ManagerHandle::post`] or [`ManagerHandle::on_main`].

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};

use super::menu::{self, MenuAction};
use super::settings::{effect_of, CloseTask, SettingEffect};
use super::shell::{resolve_glyph, ShellHost, ShortcutAction, TrayView};
use super::{PageManager, Reconciled, WindowAction};
use crate::config::{self, SettingId};
use crate::error::{WebTrayError, WebTrayResult};
use crate::modal::DialogOptions;
use crate::permissions::{PageDirectory, PermissionManager};
use crate::store::StoredPage;
use crate::window::{Listener, PageWindow, PopupAction, WindowContext, WindowEvent, WindowId};

const RECREATE_KEY: &str = "recreate-windows";
const APP_NAME: &str = "WebTray";

pub struct ManagerHandle {
    core: Mutex<PageManager>,
    ctx: Arc<WindowContext>,
    permissions: Arc<PermissionManager>,
    shell: Arc<dyn ShellHost>,
    close_tasks: Mutex<Vec<CloseTask>>,
}

impl ManagerHandle {
    /// Build the handle and start its window-event loop.
    pub fn new(
        ctx: Arc<WindowContext>,
        permissions: Arc<PermissionManager>,
        shell: Arc<dyn ShellHost>,
    ) -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<(WindowId, WindowEvent)>();
        let forward: Listener = Arc::new(move |event, id| {
            let _ = tx.send((id.clone(), event.clone()));
        });

        let handle = Arc::new(Self {
            core: Mutex::new(PageManager::new(Arc::clone(&ctx), forward)),
            ctx,
            permissions,
            shell,
            close_tasks: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&handle);
        tauri::async_runtime::spawn(async move {
            while let Some((id, event)) = rx.recv().await {
                let Some(handle) = weak.upgrade() else { break };
                handle.post(move |handle| handle.on_window_event(&id, &event));
            }
            log::debug!("[MANAGER] Event loop stopped");
        });
        handle
    }

    /// Load pages, attach the permission manager and register shortcuts.
    pub fn start(self: &Arc<Self>) -> WebTrayResult<()> {
        let directory: Weak<dyn PageDirectory> = Arc::downgrade(self) as Weak<dyn PageDirectory>;
        self.permissions.install(directory);

        let records = self.ctx.store.pages()?;
        self.reconcile(&records)?;
        self.register_shortcuts();
        self.refresh_tray();
        log::info!("[MANAGER] Started with {} pages", records.len());
        Ok(())
    }

    /// Run a closure against the locked manager.
    pub fn with<T>(&self, f: impl FnOnce(&mut PageManager) -> T) -> T {
        f(&mut self.core.lock())
    }

    pub fn find_window(&self, id: &WindowId) -> Option<Arc<PageWindow>> {
        self.core.lock().find_window(id)
    }

    // ========================================================================
    // Main thread
    // ========================================================================

    /// Queue `f` on the main thread without waiting for it.
    pub fn post(self: &Arc<Self>, f: impl FnOnce(&Arc<Self>) + Send + 'static) {
        let handle = Arc::clone(self);
        if let Err(e) = self.shell.run_on_main(Box::new(move || f(&handle))) {
            log::error!("[MANAGER] Failed to reach the main thread: {}", e);
        }
    }

    /// Run `f` on the main thread and wait for its result.
    pub async fn on_main<T: Send + 'static>(
        self: &Arc<Self>,
        f: impl FnOnce(&Arc<Self>) -> WebTrayResult<T> + Send + 'static,
    ) -> WebTrayResult<T> {
        let (tx, rx) = oneshot::channel();
        let handle = Arc::clone(self);
        self.shell.run_on_main(Box::new(move || {
            let _ = tx.send(f(&handle));
        }))?;
        rx.await
            .map_err(|_| WebTrayError::Other("Main thread task was dropped".to_string()))?
    }

    // ========================================================================
    // Window events
    // ========================================================================

    fn on_window_event(&self, id: &WindowId, event: &WindowEvent) {
        match event {
            WindowEvent::Navigated(url) => {
                log::debug!("[MANAGER] {} navigated to {}", id, url);
                self.permissions.clear_temporary(id);
            },
            WindowEvent::Replaced => self.permissions.clear_temporary(id),
            WindowEvent::Closed => {
                self.permissions.clear_temporary(id);
                self.refresh_tray();
            },
            WindowEvent::Shown | WindowEvent::Hidden => self.refresh_tray(),
            _ => {},
        }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    /// Persist a page list from the settings UI and reconcile against it.
    /// Returns the records as stored, ids filled in.
    pub fn pages_updated(&self, records: Vec<StoredPage>) -> WebTrayResult<Vec<StoredPage>> {
        let stored = self.ctx.store.set_pages(records)?;
        self.reconcile(&stored)?;
        self.refresh_tray();
        Ok(stored)
    }

    fn reconcile(&self, records: &[StoredPage]) -> WebTrayResult<Reconciled> {
        let outcome = self.core.lock().update_pages(records)?;
        log::debug!("[MANAGER] Reconciled pages: {:?}", outcome);
        if outcome.needs_setup {
            log::info!("[MANAGER] No usable pages, opening settings");
            self.shell.open_settings()?;
        }
        Ok(outcome)
    }

    pub fn select_page(&self, id: &str) -> WebTrayResult<()> {
        self.core.lock().select_page(id)?;
        self.refresh_tray();
        Ok(())
    }

    pub fn select_clipboard_page(&self) -> WebTrayResult<()> {
        let Some(url) = self.clipboard_url() else {
            log::debug!("[MANAGER] Clipboard holds no web URL");
            return Ok(());
        };
        self.core.lock().select_clipboard_page(&url)?;
        self.refresh_tray();
        Ok(())
    }

    pub fn window_action(&self, action: WindowAction) -> WebTrayResult<()> {
        self.core.lock().window_action(action)?;
        self.refresh_tray();
        Ok(())
    }

    /// Tray click: toggle the current page.
    pub fn toggle_current(&self) -> WebTrayResult<()> {
        self.core.lock().toggle_current()?;
        self.refresh_tray();
        Ok(())
    }

    pub fn shortcut(&self, action: ShortcutAction) -> WebTrayResult<()> {
        log::debug!("[SHORTCUT] {:?}", action);
        {
            let mut core = self.core.lock();
            match action {
                ShortcutAction::Toggle => core.toggle_current()?,
                ShortcutAction::Next => core.select_next()?,
                ShortcutAction::Previous => core.select_previous()?,
            }
        }
        self.refresh_tray();
        Ok(())
    }

    /// Dispatch a context menu click by item id.
    pub fn menu_action(&self, id: &str) -> WebTrayResult<()> {
        let Some(action) = MenuAction::parse(id) else {
            log::warn!("[TRAY] Unknown menu item {}", id);
            return Ok(());
        };
        match action {
            MenuAction::SelectPage(page) => self.select_page(&page),
            MenuAction::SelectClipboard => self.select_clipboard_page(),
            MenuAction::Window(action) => self.window_action(action),
            MenuAction::Settings => self.shell.open_settings(),
            MenuAction::Quit => {
                self.core.lock().close_all();
                self.shell.quit();
                Ok(())
            },
        }
    }

    // ========================================================================
    // Tray
    // ========================================================================

    fn clipboard_url(&self) -> Option<String> {
        self.shell
            .clipboard_text()
            .map(|text| text.trim().to_string())
            .filter(|text| menu::is_web_url(text))
    }

    pub fn tray_view(&self) -> TrayView {
        let clipboard = self.clipboard_url();
        let (statuses, window, active, current_label) = {
            let core = self.core.lock();
            (
                core.page_statuses(),
                core.current_window_state(),
                core.is_current_visible(),
                core.current_page().map(|page| page.label.clone()),
            )
        };
        let settings = self.ctx.settings();
        TrayView {
            glyph: resolve_glyph(settings.tray_theme, self.shell.system_theme()),
            active,
            tooltip: match current_label {
                Some(label) => format!("{} - {}", APP_NAME, label),
                None => APP_NAME.to_string(),
            },
            menu: menu::build_menu(&statuses, clipboard.as_deref(), window),
        }
    }

    pub fn refresh_tray(&self) {
        let view = self.tray_view();
        if let Err(e) = self.shell.update_tray(&view) {
            log::warn!("[TRAY] Failed to update tray: {}", e);
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Persist a setting and apply its live effect.
    pub fn setting_updated(self: &Arc<Self>, id: SettingId, value: Value) -> WebTrayResult<()> {
        self.ctx.store.set_setting(id, value)?;
        let effect = effect_of(id);
        log::debug!("[MANAGER] Setting {} changed: {:?}", id.as_str(), effect);
        match effect {
            SettingEffect::ConfirmRecreate => self.queue_close_task(CloseTask::RecreateWindows),
            SettingEffect::ReapplyBounds => self.core.lock().reapply_bounds(),
            SettingEffect::ReapplyOpacity => self.core.lock().reapply_opacity(),
            SettingEffect::RefreshTray => self.refresh_tray(),
            SettingEffect::RegisterShortcuts => self.register_shortcuts(),
            SettingEffect::Nothing => {},
        }
        Ok(())
    }

    /// Queued tasks are deduplicated.
    fn queue_close_task(&self, task: CloseTask) {
        let mut tasks = self.close_tasks.lock();
        if !tasks.contains(&task) {
            tasks.push(task);
        }
    }

    pub fn has_close_tasks(&self) -> bool {
        !self.close_tasks.lock().is_empty()
    }

    /// The settings window wants to close. Returns `true` if closing must be
    /// held back; the window is closed once queued work has run.
    pub fn settings_close_requested(self: &Arc<Self>) -> bool {
        if !self.has_close_tasks() {
            return false;
        }
        let handle = Arc::clone(self);
        tauri::async_runtime::spawn(async move {
            handle.run_close_tasks().await;
            if let Err(e) = handle.shell.close_settings() {
                log::warn!("[MANAGER] Failed to close settings: {}", e);
            }
        });
        true
    }

    pub async fn run_close_tasks(self: &Arc<Self>) {
        let tasks = std::mem::take(&mut *self.close_tasks.lock());
        for task in tasks {
            match task {
                CloseTask::RecreateWindows => self.confirm_recreate().await,
            }
        }
    }

    async fn confirm_recreate(self: &Arc<Self>) {
        let open = self
            .on_main(|handle| Ok(handle.core.lock().live_windows().len()))
            .await
            .unwrap_or_else(|e| {
                log::error!("[MANAGER] {}", e);
                0
            });
        if open == 0 {
            return;
        }
        let options = DialogOptions::new(
            "Recreate all windows?",
            "Window frame and full screen settings only apply to new windows.",
        )
        .detail("Open windows will be closed and reopened. Unsaved page state may be lost.")
        .buttons(["Recreate", "Later"])
        .default_id(0)
        .cancel_id(1);

        match self.ctx.modals.confirm(Some(RECREATE_KEY), None, options).await {
            Ok(Some(true)) => {
                let result = self
                    .on_main(|handle| {
                        let result = handle.core.lock().recreate_all_windows();
                        handle.refresh_tray();
                        result
                    })
                    .await;
                match result {
                    Ok(count) => log::info!("[MANAGER] Recreated {} windows", count),
                    Err(e) => log::error!("[MANAGER] Recreating windows failed: {}", e),
                }
            },
            Ok(_) => log::debug!("[MANAGER] Window recreation declined"),
            Err(e) => log::error!("[MANAGER] Recreate prompt failed: {}", e),
        }
    }

    // ========================================================================
    // Shortcuts
    // ========================================================================

    /// Re-register every global shortcut. Failures offer to clear the setting.
    pub fn register_shortcuts(self: &Arc<Self>) {
        if let Err(e) = self.shell.unregister_shortcuts() {
            log::warn!("[SHORTCUT] Failed to unregister shortcuts: {}", e);
        }
        for id in SettingId::SHORTCUTS {
            let Some(accelerator) = config::shortcut(&self.ctx.store, id) else {
                continue;
            };
            let Some(action) = ShortcutAction::for_setting(id) else {
                continue;
            };
            match self.shell.register_shortcut(&accelerator, action) {
                Ok(()) => log::info!("[SHORTCUT] Registered {} for {:?}", accelerator, action),
                Err(e) => {
                    log::warn!("[SHORTCUT] {}", e);
                    let handle = Arc::clone(self);
                    tauri::async_runtime::spawn(async move {
                        handle.offer_to_clear_shortcut(id, &accelerator).await;
                    });
                },
            }
        }
    }

    pub async fn offer_to_clear_shortcut(&self, id: SettingId, accelerator: &str) {
        let options = DialogOptions::new(
            "Shortcut unavailable",
            format!("The shortcut \"{}\" could not be registered.", accelerator),
        )
        .detail("It may be invalid or already used by another application. Clear it?")
        .buttons(["Clear shortcut", "Keep"])
        .default_id(0)
        .cancel_id(1);

        let key = format!("shortcut-{}", id.as_str());
        match self.ctx.modals.confirm(Some(key.as_str()), None, options).await {
            Ok(Some(true)) => match self.ctx.store.set_setting(id, json!("")) {
                Ok(()) => log::info!("[SHORTCUT] Cleared {}", id.as_str()),
                Err(e) => log::error!("[SHORTCUT] Failed to clear {}: {}", id.as_str(), e),
            },
            Ok(_) => {},
            Err(e) => log::error!("[SHORTCUT] Prompt failed: {}", e),
        }
    }

    // ========================================================================
    // Popups
    // ========================================================================

    /// A page asked to open `url` in a new window.
    pub fn open_popup(&self, opener: &WindowId, url: &str) -> WebTrayResult<()> {
        let window = self
            .find_window(opener)
            .ok_or_else(|| WebTrayError::WindowNotFound {
                id: opener.to_string(),
            })?;
        match window.open_popup(url)? {
            PopupAction::OpenExternal(url) => {
                log::info!("[POPUP] Opening {} externally", url);
                self.shell.open_external(&url)
            },
            PopupAction::OpenChild(url) => {
                log::info!("[POPUP] Opened {} from {}", url, opener);
                Ok(())
            },
            PopupAction::Ignore => {
                log::debug!("[POPUP] Ignored {} from {}", url, opener);
                Ok(())
            },
        }
    }
}

impl PageDirectory for ManagerHandle {
    fn session_for_window(&self, id: &WindowId) -> Option<String> {
        self.find_window(id).map(|window| window.session().to_string())
    }

    fn is_window_alive(&self, id: &WindowId) -> bool {
        self.find_window(id).is_some_and(|window| window.is_alive())
    }

    fn url_for_window(&self, id: &WindowId) -> Option<String> {
        // Lock released before the native query.
        let window = self.find_window(id)?;
        window.current_url()
    }
}
