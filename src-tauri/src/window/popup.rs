//! Popup (new-window) policy.

use crate::config::PopupPolicy;

/// Schemes that may be handed to the system browser.
const EXTERNAL_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Schemes that may be loaded in a child window.
const WINDOW_SCHEMES: [&str; 2] = ["http", "https"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
    OpenChild(String),
    OpenExternal(String),
    Ignore,
}

/// Decide what to do with a page's request to open `url` in a new window.
pub fn decide(policy: PopupPolicy, url: &str) -> PopupAction {
    let Ok(parsed) = url::Url::parse(url) else {
        log::debug!("[POPUP] Ignoring unparsable popup URL {}", url);
        return PopupAction::Ignore;
    };
    let scheme = parsed.scheme();

    match policy {
        PopupPolicy::Deny => PopupAction::Ignore,
        PopupPolicy::Window if WINDOW_SCHEMES.contains(&scheme) => {
            PopupAction::OpenChild(parsed.to_string())
        },
        PopupPolicy::Window | PopupPolicy::External if EXTERNAL_SCHEMES.contains(&scheme) => {
            PopupAction::OpenExternal(parsed.to_string())
        },
        _ => PopupAction::Ignore,
    }
}
