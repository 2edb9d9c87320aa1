//! Capability vocabulary.
//!
//! A capability key is a permission name, optionally narrowed by a media or
//! access subtype: `media:video`, `fileSystem:write`, `geolocation`.

use std::collections::HashSet;

/// Device classes the OS may gate independently of us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Camera,
    Microphone,
}

pub const DISPLAY_CAPTURE: &str = "display-capture";

/// Audio designator attached to a screen share that includes system audio.
pub const LOOPBACK_AUDIO: &str = "loopback";

/// Expand a permission request into the keys it is decided under.
pub fn capability_keys<S: AsRef<str>>(permission: &str, subtypes: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys: Vec<String> = subtypes
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("{}:{}", permission, s))
        .filter(|key| seen.insert(key.clone()))
        .collect();
    if keys.is_empty() {
        keys.push(permission.to_string());
    }
    keys
}

pub fn media_kind(key: &str) -> Option<MediaKind> {
    match key {
        "media:video" => Some(MediaKind::Camera),
        "media:audio" => Some(MediaKind::Microphone),
        _ => None,
    }
}

/// Label shown in permission prompts. Unknown keys are shown raw.
pub fn label(key: &str) -> String {
    let known = match key {
        "media" => "Camera and microphone",
        "media:video" => "Camera",
        "media:audio" => "Microphone",
        "speaker-selection" => "Choose audio output",
        "geolocation" => "Location",
        "notifications" => "Notifications",
        "midi" => "MIDI devices",
        "midiSysex" => "MIDI devices (system exclusive)",
        "idle-detection" => "Idle detection",
        "clipboard-read" => "Read clipboard",
        "clipboard-write" | "clipboard-sanitized-write" => "Write clipboard",
        "fileSystem" | "fileSystem:read" => "Read files",
        "fileSystem:write" | "fileSystem:readwrite" => "Edit files",
        "openExternal" => "Open external applications",
        "protocol-registration" => "Handle links",
        "usb" => "USB devices",
        "serial" => "Serial ports",
        "bluetooth" => "Bluetooth devices",
        "bluetooth-scanning" => "Bluetooth scanning",
        "hid" => "HID devices",
        "pointerLock" => "Lock the pointer",
        "keyboardLock" => "Lock the keyboard",
        "fullscreen" => "Full screen",
        "automatic-fullscreen" => "Automatic full screen",
        "persistent-storage" => "Persistent storage",
        "background-sync" => "Background sync",
        "screen-wake-lock" => "Keep the screen on",
        DISPLAY_CAPTURE => "Share your screen",
        _ => return key.to_string(),
    };
    known.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_request_expands_per_type() {
        assert_eq!(
            capability_keys("media", &["video", "audio"]),
            vec!["media:video".to_string(), "media:audio".to_string()]
        );
        assert_eq!(capability_keys::<&str>("geolocation", &[]), vec!["geolocation".to_string()]);
        assert_eq!(capability_keys("media", &[""]), vec!["media".to_string()]);
    }

    #[test]
    fn test_repeated_subtypes_collapse_in_order() {
        assert_eq!(
            capability_keys("media", &["video", "audio", "video", " audio "]),
            vec!["media:video".to_string(), "media:audio".to_string()]
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(label("media:video"), "Camera");
        assert_eq!(label("media:audio"), "Microphone");
        assert_eq!(label("clipboard-sanitized-write"), "Write clipboard");
        assert_eq!(label("some-new-thing"), "some-new-thing");
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind("media:video"), Some(MediaKind::Camera));
        assert_eq!(media_kind("geolocation"), None);
    }
}
