use std::sync::Arc;
use tauri::{Manager, RunEvent};

mod app;
mod commands;
mod config;
mod error;
mod logging;
mod manager;
mod modal;
mod page;
mod permissions;
mod store;
mod window;

use app::TauriShell;
use manager::ManagerHandle;
use modal::host::TauriModalHost;
use modal::sources::XcapSourceProvider;
use modal::{DialogOptions, ModalService};
use permissions::{DefaultSystemPermissions, PermissionManager, SessionTrackingFactory};
use store::{Store, TauriStoreBackend};
use window::{TauriWindowFactory, WindowContext};

/// Long-lived services, managed as Tauri state.
pub struct AppServices {
    pub store: Arc<Store>,
    pub modals: Arc<ModalService>,
    pub permissions: Arc<PermissionManager>,
    pub manager: Arc<ManagerHandle>,
    pub shell: Arc<TauriShell>,
}

/// A second launch only tells the user the app is already in the tray.
fn alert_already_running(app: &tauri::AppHandle) {
    let Some(services) = app.try_state::<AppServices>() else {
        return;
    };
    let modals = Arc::clone(&services.modals);
    tauri::async_runtime::spawn(async move {
        let options = DialogOptions::new("WebTray is already running", "Use the tray icon to open your pages.");
        if let Err(e) = modals.alert(Some("already-running"), None, options).await {
            log::warn!("[MANAGER] Failed to show already-running alert: {}", e);
        }
    });
}

fn setup(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = app.handle().clone();
    logging::init_file(&handle)?;
    log::info!("[MANAGER] Starting WebTray {}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(Store::new(Box::new(TauriStoreBackend::open(&handle)?)));
    let modals = Arc::new(ModalService::new(Arc::new(TauriModalHost::new(handle.clone()))));

    let permissions = PermissionManager::new(
        Arc::clone(&store),
        Arc::clone(&modals),
        Arc::new(XcapSourceProvider),
        Arc::new(DefaultSystemPermissions),
    );
    let notify_handle = handle.clone();
    permissions.on_change(Arc::new(move || {
        commands::store::emit_permissions_changed(&notify_handle)
    }));

    let factory = Arc::new(SessionTrackingFactory::new(
        Arc::new(TauriWindowFactory::new(handle.clone())),
        permissions.sessions(),
    ));
    let ctx = WindowContext::new(factory, Arc::clone(&store), Arc::clone(&modals));

    let shell = Arc::new(TauriShell::new(handle.clone()));
    let manager = ManagerHandle::new(ctx, Arc::clone(&permissions), shell.clone());

    app.manage(AppServices {
        store,
        modals,
        permissions,
        manager: Arc::clone(&manager),
        shell,
    });

    app::tray::init(app)?;
    manager.start()?;
    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init_console();

    // Single instance must be registered first
    let mut builder = tauri::Builder::default().plugin(tauri_plugin_single_instance::init(
        |app, _args, _cwd| {
            log::info!("[MANAGER] Second instance launched");
            alert_already_running(app);
        },
    ));

    builder = builder
        .plugin(tauri_plugin_clipboard_manager::init())
        .plugin(tauri_plugin_store::Builder::default().build())
        .plugin(tauri_plugin_opener::init());

    #[cfg(desktop)]
    {
        use tauri_plugin_global_shortcut::ShortcutState;

        builder = builder.plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, shortcut, event| {
                    if !matches!(event.state(), ShortcutState::Pressed) {
                        return;
                    }
                    let Some(services) = app.try_state::<AppServices>() else {
                        return;
                    };
                    let Some(action) = services.shell.action_for(shortcut) else {
                        return;
                    };
                    services.manager.post(move |manager| {
                        if let Err(e) = manager.shortcut(action) {
                            log::error!("[SHORTCUT] {:?} failed: {}", action, e);
                        }
                    });
                })
                .build(),
        );
    }

    let app = builder
        .on_window_event(app::events::handle_window_event)
        .invoke_handler(tauri::generate_handler![
            // Storage
            commands::store::storage_pages,
            commands::store::storage_pages_updated,
            commands::store::storage_settings,
            commands::store::storage_settings_updated,
            commands::store::storage_permissions,
            commands::store::storage_permissions_updated,
            commands::store::storage_permissions_revoke,
            // Page window chrome
            commands::chrome::window_start_drag,
            commands::chrome::window_toggle_maximize,
            commands::chrome::window_hide,
            commands::chrome::findbar_open,
            commands::chrome::findbar_search,
            commands::chrome::findbar_close,
            commands::chrome::open_popup,
            // Permissions
            commands::permission::permission_request,
            commands::permission::permission_check,
            commands::permission::permission_display_media,
            // Modals
            commands::modal::modal_request,
            commands::modal::modal_content_height,
            commands::modal::modal_respond,
            commands::modal::modal_respond_source,
            // Logging
            logging::write_log,
        ])
        .setup(setup)
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|_app, event| {
        // Tray app: closing the last window keeps running. Only an explicit
        // exit (tray Quit) carries a code.
        if let RunEvent::ExitRequested { api, code, .. } = event {
            if code.is_none() {
                api.prevent_exit();
            }
        }
    });
}
