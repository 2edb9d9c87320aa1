//! Permission gates called from page windows.
//!
//! Every command resolves to a plain answer: failures deny. The origin is
//! always the calling window's own document; nothing the page sends is
//! used as an origin.

use tauri::{command, State, WebviewWindow};

use crate::permissions::{DisplayMediaGrant, PermissionCheck, PermissionRequest};
use crate::window::native::WindowId;
use crate::AppServices;

/// Prompt (or answer from stored grants) for a capability.
#[command]
pub async fn permission_request(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    permission: String,
    media_types: Vec<String>,
) -> Result<bool, ()> {
    let request = PermissionRequest {
        window: WindowId::from(window.label()),
        permission,
        media_types,
    };
    Ok(services.permissions.request(request).await)
}

/// Synchronous check; never prompts.
#[command]
pub fn permission_check(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    permission: String,
) -> bool {
    services.permissions.check(&PermissionCheck {
        window: Some(WindowId::from(window.label())),
        permission,
        requesting_url: window.url().ok().map(|url| url.to_string()),
        ..PermissionCheck::default()
    })
}

/// `getDisplayMedia`: pick a source. `None` denies.
#[command]
pub async fn permission_display_media(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    audio: bool,
) -> Result<Option<DisplayMediaGrant>, ()> {
    Ok(services
        .permissions
        .request_display_media(WindowId::from(window.label()), audio)
        .await)
}
