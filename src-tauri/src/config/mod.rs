//! Settings catalog.
//!
//! Settings are stored flat under `WindowSettings.<id>` with a static default
//! per id. The settings UI writes raw JSON values; everything here coerces
//! at read time and falls back to the default on a type mismatch.
//!
//! - `SettingId`: the catalog of known ids and their defaults
//! - `Settings`: typed snapshot read from the store

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::Store;

/// Every known setting id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingId {
    ShowFrame,
    AllowFullscreen,
    SharedBounds,
    ResetBounds,
    DefaultPosition,
    DefaultWidth,
    DefaultHeight,
    FocusOpacity,
    BlurOpacity,
    KeepOpacityWhenMaximized,
    TrayTheme,
    PopupPolicy,
    ShortcutToggle,
    ShortcutNext,
    ShortcutPrevious,
}

impl SettingId {
    pub const ALL: [SettingId; 15] = [
        SettingId::ShowFrame,
        SettingId::AllowFullscreen,
        SettingId::SharedBounds,
        SettingId::ResetBounds,
        SettingId::DefaultPosition,
        SettingId::DefaultWidth,
        SettingId::DefaultHeight,
        SettingId::FocusOpacity,
        SettingId::BlurOpacity,
        SettingId::KeepOpacityWhenMaximized,
        SettingId::TrayTheme,
        SettingId::PopupPolicy,
        SettingId::ShortcutToggle,
        SettingId::ShortcutNext,
        SettingId::ShortcutPrevious,
    ];

    pub const SHORTCUTS: [SettingId; 3] = [
        SettingId::ShortcutToggle,
        SettingId::ShortcutNext,
        SettingId::ShortcutPrevious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingId::ShowFrame => "show_frame",
            SettingId::AllowFullscreen => "allow_fullscreen",
            SettingId::SharedBounds => "shared_bounds",
            SettingId::ResetBounds => "reset_bounds",
            SettingId::DefaultPosition => "default_position",
            SettingId::DefaultWidth => "default_width",
            SettingId::DefaultHeight => "default_height",
            SettingId::FocusOpacity => "focus_opacity",
            SettingId::BlurOpacity => "blur_opacity",
            SettingId::KeepOpacityWhenMaximized => "keep_opacity_when_maximized",
            SettingId::TrayTheme => "tray_theme",
            SettingId::PopupPolicy => "popup_policy",
            SettingId::ShortcutToggle => "shortcut_toggle",
            SettingId::ShortcutNext => "shortcut_next",
            SettingId::ShortcutPrevious => "shortcut_previous",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == id)
    }

    pub fn default_value(&self) -> Value {
        match self {
            SettingId::ShowFrame => json!(false),
            SettingId::AllowFullscreen => json!(false),
            SettingId::SharedBounds => json!(false),
            SettingId::ResetBounds => json!("none"),
            SettingId::DefaultPosition => json!("top-right"),
            SettingId::DefaultWidth => json!(480),
            SettingId::DefaultHeight => json!(640),
            SettingId::FocusOpacity => json!(1.0),
            SettingId::BlurOpacity => json!(0.85),
            SettingId::KeepOpacityWhenMaximized => json!(true),
            SettingId::TrayTheme => json!("system"),
            SettingId::PopupPolicy => json!("window"),
            SettingId::ShortcutToggle => json!("CommandOrControl+Shift+Space"),
            SettingId::ShortcutNext => json!(""),
            SettingId::ShortcutPrevious => json!(""),
        }
    }
}

/// Startup rule for whether window bounds revert to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    #[default]
    None,
    Position,
    Bounds,
}

/// Nine-point compass anchor for default window placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    Top,
    #[default]
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrayTheme {
    #[default]
    System,
    Light,
    Dark,
}

/// What happens when page content asks for a new window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupPolicy {
    #[default]
    Window,
    External,
    Deny,
}

/// Typed snapshot of every setting.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub show_frame: bool,
    pub allow_fullscreen: bool,
    pub shared_bounds: bool,
    pub reset_bounds: ResetPolicy,
    pub default_position: Anchor,
    pub default_width: u32,
    pub default_height: u32,
    pub focus_opacity: f64,
    pub blur_opacity: f64,
    pub keep_opacity_when_maximized: bool,
    pub tray_theme: TrayTheme,
    pub popup_policy: PopupPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|id| id.default_value())
    }
}

impl Settings {
    pub fn load(store: &Store) -> Self {
        Self::from_lookup(|id| store.setting(id))
    }

    fn from_lookup(lookup: impl Fn(SettingId) -> Value) -> Self {
        Self {
            show_frame: coerce(&lookup, SettingId::ShowFrame),
            allow_fullscreen: coerce(&lookup, SettingId::AllowFullscreen),
            shared_bounds: coerce(&lookup, SettingId::SharedBounds),
            reset_bounds: coerce(&lookup, SettingId::ResetBounds),
            default_position: coerce(&lookup, SettingId::DefaultPosition),
            default_width: coerce::<u32>(&lookup, SettingId::DefaultWidth).max(100),
            default_height: coerce::<u32>(&lookup, SettingId::DefaultHeight).max(100),
            focus_opacity: coerce::<f64>(&lookup, SettingId::FocusOpacity).clamp(0.1, 1.0),
            blur_opacity: coerce::<f64>(&lookup, SettingId::BlurOpacity).clamp(0.1, 1.0),
            keep_opacity_when_maximized: coerce(&lookup, SettingId::KeepOpacityWhenMaximized),
            tray_theme: coerce(&lookup, SettingId::TrayTheme),
            popup_policy: coerce(&lookup, SettingId::PopupPolicy),
        }
    }
}

/// Read a shortcut accelerator; empty means unassigned.
pub fn shortcut(store: &Store, id: SettingId) -> Option<String> {
    store
        .setting(id)
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn coerce<T>(lookup: &impl Fn(SettingId) -> Value, id: SettingId) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let value = lookup(id);
    // Numbers sometimes arrive as strings from form inputs.
    let value = match value.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
        Some(n) if !id.default_value().is_string() => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(value),
        _ => value,
    };
    serde_json::from_value(value.clone())
        .or_else(|_| from_float(&value))
        .unwrap_or_else(|_| {
            log::warn!("[CONFIG] Invalid value {} for {}, using default", value, id.as_str());
            serde_json::from_value(id.default_value()).unwrap_or_default()
        })
}

/// `640.0` should still read as a `u32`.
fn from_float<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 && n >= 0.0 => serde_json::from_value(json!(n as u64)),
        _ => serde_json::from_value(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.show_frame);
        assert_eq!(settings.reset_bounds, ResetPolicy::None);
        assert_eq!(settings.default_position, Anchor::TopRight);
        assert_eq!(settings.default_width, 480);
        assert_eq!(settings.popup_policy, PopupPolicy::Window);
    }

    #[test]
    fn test_setting_id_round_trip_names() {
        for id in SettingId::ALL {
            assert_eq!(SettingId::parse(id.as_str()), Some(id));
        }
        assert_eq!(SettingId::parse("nope"), None);
    }

    #[test]
    fn test_settings_fall_back_on_bad_values() {
        let store = Store::in_memory();
        store
            .set_setting(SettingId::DefaultPosition, json!("somewhere"))
            .unwrap();
        store.set_setting(SettingId::ShowFrame, json!(42)).unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.default_position, Anchor::TopRight);
        assert!(!settings.show_frame);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let store = Store::in_memory();
        store.set_setting(SettingId::DefaultWidth, json!("800")).unwrap();
        store.set_setting(SettingId::BlurOpacity, json!("0.5")).unwrap();

        let settings = Settings::load(&store);
        assert_eq!(settings.default_width, 800);
        assert_eq!(settings.blur_opacity, 0.5);
    }

    #[test]
    fn test_anchor_names() {
        let anchor: Anchor = serde_json::from_value(json!("bottom-left")).unwrap();
        assert_eq!(anchor, Anchor::BottomLeft);
        let anchor: Anchor = serde_json::from_value(json!("center")).unwrap();
        assert_eq!(anchor, Anchor::Center);
    }

    #[test]
    fn test_empty_shortcut_is_unassigned() {
        let store = Store::in_memory();
        store.set_setting(SettingId::ShortcutNext, json!("  ")).unwrap();
        assert_eq!(shortcut(&store, SettingId::ShortcutNext), None);
        assert_eq!(
            shortcut(&store, SettingId::ShortcutToggle).as_deref(),
            Some("CommandOrControl+Shift+Space")
        );
    }
}
