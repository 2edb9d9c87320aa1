//! Tauri commands.
//!
//! - `store`: settings UI access to pages, settings and permission grants
//! - `chrome`: gestures, find bar and popups from page windows
//! - `permission`: capability gates from the page bridge
//! - `modal`: modal renderer round trips
//!
//! Frontend logging (`write_log`) lives in `crate::logging`.

pub mod chrome;
pub mod modal;
pub mod permission;
pub mod store;

#[cfg(test)]
mod tests {
    use serde_json::Value;

    fn granted(capability: &str) -> (Vec<String>, Vec<String>) {
        let parsed: Value = serde_json::from_str(capability).unwrap();
        let strings = |key: &str| -> Vec<String> {
            parsed[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect()
        };
        (strings("windows"), strings("permissions"))
    }

    #[test]
    fn test_remote_pages_only_reach_bridge_commands() {
        let (windows, permissions) = granted(include_str!("../../capabilities/pages.json"));
        assert_eq!(windows, vec!["page-*", "popup-*"]);
        assert!(permissions.iter().all(|p| !p.starts_with("core:")));
        assert!(permissions.iter().all(|p| {
            ["allow-window-", "allow-findbar-", "allow-open-popup", "allow-permission-"]
                .iter()
                .any(|prefix| p.starts_with(prefix))
        }));
    }

    #[test]
    fn test_storage_commands_are_granted_to_settings_only() {
        let capabilities = [
            include_str!("../../capabilities/pages.json"),
            include_str!("../../capabilities/modals.json"),
            include_str!("../../capabilities/settings.json"),
        ];
        for capability in capabilities {
            let (windows, permissions) = granted(capability);
            let storage = permissions.iter().any(|p| p.starts_with("allow-storage-"));
            assert_eq!(storage, windows == vec!["settings"], "{:?}", windows);
        }
    }
}
