// Commands are declared so each capability can grant only what its windows
// need: remote pages must not reach the storage commands.
const COMMANDS: &[&str] = &[
    // Settings window
    "storage_pages",
    "storage_pages_updated",
    "storage_settings",
    "storage_settings_updated",
    "storage_permissions",
    "storage_permissions_updated",
    "storage_permissions_revoke",
    // Page and popup windows
    "window_start_drag",
    "window_toggle_maximize",
    "window_hide",
    "findbar_open",
    "findbar_search",
    "findbar_close",
    "open_popup",
    "permission_request",
    "permission_check",
    "permission_display_media",
    // Modal renderers
    "modal_request",
    "modal_content_height",
    "modal_respond",
    "modal_respond_source",
    // Local UI
    "write_log",
];

fn main() {
    tauri_build::try_build(
        tauri_build::Attributes::new()
            .app_manifest(tauri_build::AppManifest::new().commands(COMMANDS)),
    )
    .expect("failed to run tauri-build");
}
