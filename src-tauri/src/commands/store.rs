//! Storage commands used by the settings UI.

use serde_json::Value;
use tauri::{command, AppHandle, Emitter, State};

use crate::config::SettingId;
use crate::error::{WebTrayError, WebTrayResult};
use crate::store::schema::{PermissionMap, StoredPage};
use crate::AppServices;

pub const PAGES_CHANGED_EVENT: &str = "storage.pages.changed";
pub const PERMISSIONS_CHANGED_EVENT: &str = "storage.permissions.changed";

fn setting_id(id: &str) -> WebTrayResult<SettingId> {
    SettingId::parse(id).ok_or_else(|| WebTrayError::Other(format!("Unknown setting '{}'", id)))
}

pub(crate) fn emit_permissions_changed(app: &AppHandle) {
    if let Err(e) = app.emit(PERMISSIONS_CHANGED_EVENT, ()) {
        log::warn!("[STORE] Failed to emit {}: {}", PERMISSIONS_CHANGED_EVENT, e);
    }
}

#[command]
pub fn storage_pages(services: State<'_, AppServices>) -> WebTrayResult<Vec<StoredPage>> {
    services.store.pages()
}

/// Persist the edited page list and reconcile open windows against it.
/// Returns the records as stored, with ids assigned.
///
/// The reconcile itself runs on the main thread, where the manager lives.
#[command]
pub async fn storage_pages_updated(
    app: AppHandle,
    services: State<'_, AppServices>,
    pages: Vec<StoredPage>,
) -> WebTrayResult<Vec<StoredPage>> {
    let stored = services
        .manager
        .on_main(move |manager| manager.pages_updated(pages))
        .await?;
    if let Err(e) = app.emit(PAGES_CHANGED_EVENT, &stored) {
        log::warn!("[STORE] Failed to emit {}: {}", PAGES_CHANGED_EVENT, e);
    }
    Ok(stored)
}

#[command]
pub fn storage_settings(services: State<'_, AppServices>, id: String) -> WebTrayResult<Value> {
    Ok(services.store.setting(setting_id(&id)?))
}

#[command]
pub async fn storage_settings_updated(
    services: State<'_, AppServices>,
    id: String,
    value: Value,
) -> WebTrayResult<()> {
    let id = setting_id(&id)?;
    services
        .manager
        .on_main(move |manager| manager.setting_updated(id, value))
        .await
}

#[command]
pub fn storage_permissions(services: State<'_, AppServices>) -> PermissionMap {
    services.store.permissions()
}

#[command]
pub fn storage_permissions_updated(
    app: AppHandle,
    services: State<'_, AppServices>,
    permissions: PermissionMap,
) -> WebTrayResult<()> {
    services.store.set_permissions(&permissions)?;
    emit_permissions_changed(&app);
    Ok(())
}

/// Remove grants matching the given partial key; returns how many were removed.
#[command]
pub fn storage_permissions_revoke(
    app: AppHandle,
    services: State<'_, AppServices>,
    session: Option<String>,
    origin: Option<String>,
    capability: Option<String>,
) -> WebTrayResult<usize> {
    let removed = services.store.revoke_permissions(
        session.as_deref(),
        origin.as_deref(),
        capability.as_deref(),
    )?;
    log::info!("[STORE] Revoked {} permission grant(s)", removed);
    emit_permissions_changed(&app);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_id_lookup() {
        assert_eq!(setting_id("show_frame").unwrap(), SettingId::ShowFrame);
        let err = setting_id("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
