//! Domain accessors over the primitive store API.
//!
//! Logical keys:
//!
//! ```text
//! Pages                      -> [StoredPage]
//! WindowBounds.<pageId>      -> StoredBounds
//! SharedBounds               -> StoredBounds
//! WindowSettings.<settingId> -> value
//! Permissions                -> { session: { origin: { capability: status } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use super::Store;
use crate::config::SettingId;
use crate::error::WebTrayResult;
use crate::page::bounds::StoredBounds;

pub const PAGES_KEY: &str = "Pages";
pub const SHARED_BOUNDS_KEY: &str = "SharedBounds";
pub const PERMISSIONS_KEY: &str = "Permissions";
const BOUNDS_PREFIX: &str = "WindowBounds.";
const SETTINGS_PREFIX: &str = "WindowSettings.";

/// Session partition used when a page does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// A page record as persisted (and as exchanged with the settings UI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_session")]
    pub session: String,
    #[serde(default)]
    pub persist: bool,
}

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

/// Durable permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Allow,
    Deny,
    Ask,
}

/// `session -> origin -> capability -> status`
pub type PermissionMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, PermissionStatus>>>;

/// Generate an id for a page record that has none.
///
/// Derived from the current time plus the record's index so that ids minted
/// in one batch never collide.
pub(crate) fn generate_page_id(index: usize) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0))
        .as_millis();
    format!("{:x}-{}", timestamp, index)
}

fn bounds_key(page_id: &str) -> String {
    format!("{}{}", BOUNDS_PREFIX, page_id)
}

fn setting_key(id: SettingId) -> String {
    format!("{}{}", SETTINGS_PREFIX, id.as_str())
}

impl Store {
    // ========================================================================
    // Pages
    // ========================================================================

    /// Load page records, migrating legacy records that lack an id.
    pub fn pages(&self) -> WebTrayResult<Vec<StoredPage>> {
        let mut pages: Vec<StoredPage> = self.get_as(PAGES_KEY).unwrap_or_default();
        if self.assign_missing_ids(&mut pages)? {
            self.set_as(PAGES_KEY, &pages)?;
        }
        Ok(pages)
    }

    /// Replace the page list and drop bounds records of pages that are gone.
    pub fn set_pages(&self, mut pages: Vec<StoredPage>) -> WebTrayResult<Vec<StoredPage>> {
        self.assign_missing_ids(&mut pages)?;
        self.set_as(PAGES_KEY, &pages)?;

        let live: HashSet<String> = pages.iter().filter_map(|p| p.id.clone()).collect();
        for key in self.keys() {
            if let Some(page_id) = key.strip_prefix(BOUNDS_PREFIX) {
                if !live.contains(page_id) {
                    log::debug!("[STORE] Removing orphaned bounds for {}", page_id);
                    self.delete(&key)?;
                }
            }
        }
        Ok(pages)
    }

    /// Give id-less records a generated id and move bounds keyed by label.
    /// Returns whether anything changed.
    fn assign_missing_ids(&self, pages: &mut [StoredPage]) -> WebTrayResult<bool> {
        let mut changed = false;
        for (index, page) in pages.iter_mut().enumerate() {
            if page.id.as_deref().is_some_and(|id| !id.is_empty()) {
                continue;
            }
            let id = generate_page_id(index);
            let legacy_key = bounds_key(&page.label);
            if let Some(bounds) = self.get_raw(&legacy_key) {
                self.set(&bounds_key(&id), bounds)?;
                self.delete(&legacy_key)?;
            }
            log::info!("[STORE] Assigned id {} to page '{}'", id, page.label);
            page.id = Some(id);
            changed = true;
        }
        Ok(changed)
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    pub fn bounds(&self, page_id: &str) -> Option<StoredBounds> {
        self.get_as(&bounds_key(page_id))
    }

    pub fn set_bounds(&self, page_id: &str, bounds: &StoredBounds) -> WebTrayResult<()> {
        self.set_as(&bounds_key(page_id), bounds)
    }

    pub fn delete_bounds(&self, page_id: &str) -> WebTrayResult<()> {
        self.delete(&bounds_key(page_id))
    }

    pub fn shared_bounds(&self) -> Option<StoredBounds> {
        self.get_as(SHARED_BOUNDS_KEY)
    }

    pub fn set_shared_bounds(&self, bounds: &StoredBounds) -> WebTrayResult<()> {
        self.set_as(SHARED_BOUNDS_KEY, bounds)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Read a setting, falling back to its static default.
    pub fn setting(&self, id: SettingId) -> Value {
        self.get(&setting_key(id), id.default_value())
    }

    pub fn set_setting(&self, id: SettingId, value: Value) -> WebTrayResult<()> {
        self.set(&setting_key(id), value)
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    pub fn permissions(&self) -> PermissionMap {
        self.get_as(PERMISSIONS_KEY).unwrap_or_default()
    }

    pub fn set_permissions(&self, permissions: &PermissionMap) -> WebTrayResult<()> {
        self.set_as(PERMISSIONS_KEY, permissions)
    }

    pub fn permission(
        &self,
        session: &str,
        origin: &str,
        capability: &str,
    ) -> Option<PermissionStatus> {
        self.permissions()
            .get(session)?
            .get(origin)?
            .get(capability)
            .copied()
    }

    pub fn set_permission(
        &self,
        session: &str,
        origin: &str,
        capability: &str,
        status: PermissionStatus,
    ) -> WebTrayResult<()> {
        let mut permissions = self.permissions();
        permissions
            .entry(session.to_string())
            .or_default()
            .entry(origin.to_string())
            .or_default()
            .insert(capability.to_string(), status);
        self.set_permissions(&permissions)
    }

    /// Remove every grant matching the given partial key. `None` matches anything.
    /// Returns the number of grants removed.
    pub fn revoke_permissions(
        &self,
        session: Option<&str>,
        origin: Option<&str>,
        capability: Option<&str>,
    ) -> WebTrayResult<usize> {
        let mut permissions = self.permissions();
        let mut removed = 0;

        for (session_key, origins) in permissions.iter_mut() {
            if session.is_some_and(|s| s != session_key) {
                continue;
            }
            for (origin_key, capabilities) in origins.iter_mut() {
                if origin.is_some_and(|o| o != origin_key) {
                    continue;
                }
                let before = capabilities.len();
                capabilities.retain(|cap, _| capability.is_some_and(|c| c != cap));
                removed += before - capabilities.len();
            }
            origins.retain(|_, capabilities| !capabilities.is_empty());
        }
        permissions.retain(|_, origins| !origins.is_empty());

        if removed > 0 {
            self.set_permissions(&permissions)?;
        }
        Ok(removed)
    }
}
