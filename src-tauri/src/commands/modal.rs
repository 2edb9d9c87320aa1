//! Commands used by the modal renderer (`modal.html`, `picker.html`).
//!
//! A modal identifies itself by its window label, so none of these take a
//! handle argument.

use tauri::{command, State, WebviewWindow};

use crate::error::{WebTrayError, WebTrayResult};
use crate::modal::{parse_modal_label, ModalHandle, ModalRequest, ModalResponse};
use crate::AppServices;

fn handle_of(window: &WebviewWindow) -> WebTrayResult<ModalHandle> {
    handle_for_label(window.label())
}

fn handle_for_label(label: &str) -> WebTrayResult<ModalHandle> {
    parse_modal_label(label).ok_or_else(|| WebTrayError::ModalError(format!("'{}' is not a modal window", label)))
}

/// What to render.
#[command]
pub fn modal_request(window: WebviewWindow, services: State<'_, AppServices>) -> WebTrayResult<ModalRequest> {
    let handle = handle_of(&window)?;
    services
        .modals
        .request_for(handle)
        .ok_or_else(|| WebTrayError::ModalError(format!("modal {} has no pending request", handle)))
}

/// The renderer laid out its content; size the window and show it.
#[command]
pub fn modal_content_height(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    height: f64,
) -> WebTrayResult<()> {
    services.modals.report_height(handle_of(&window)?, height)
}

#[command]
pub fn modal_respond(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    response: usize,
    checkbox_checked: bool,
) -> WebTrayResult<bool> {
    Ok(services.modals.resolve(
        handle_of(&window)?,
        ModalResponse::Dialog {
            response,
            checkbox_checked,
        },
    ))
}

/// Screen picker answer. A missing source id cancels.
#[command]
pub fn modal_respond_source(
    window: WebviewWindow,
    services: State<'_, AppServices>,
    source_id: Option<String>,
    share_audio: bool,
) -> WebTrayResult<bool> {
    let response = match source_id {
        Some(source_id) => ModalResponse::Source {
            source_id,
            share_audio,
        },
        None => ModalResponse::Dismissed,
    };
    Ok(services.modals.resolve(handle_of(&window)?, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::modal_label;

    #[test]
    fn test_handle_from_label() {
        assert_eq!(handle_for_label(&modal_label(42)).unwrap(), 42);
        assert!(handle_for_label("settings").is_err());
        assert!(handle_for_label("page-abc-1").is_err());
    }
}
