//! What a settings change does to the running app.

use crate::config::SettingId;

/// Live effect of changing a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingEffect {
    /// Native options changed; windows must be rebuilt once the user agrees.
    ConfirmRecreate,
    ReapplyBounds,
    ReapplyOpacity,
    RefreshTray,
    RegisterShortcuts,
    /// Read the next time it is needed.
    Nothing,
}

pub fn effect_of(id: SettingId) -> SettingEffect {
    match id {
        SettingId::ShowFrame | SettingId::AllowFullscreen => SettingEffect::ConfirmRecreate,
        SettingId::SharedBounds
        | SettingId::DefaultPosition
        | SettingId::DefaultWidth
        | SettingId::DefaultHeight => SettingEffect::ReapplyBounds,
        SettingId::FocusOpacity | SettingId::BlurOpacity | SettingId::KeepOpacityWhenMaximized => {
            SettingEffect::ReapplyOpacity
        },
        SettingId::TrayTheme => SettingEffect::RefreshTray,
        SettingId::ShortcutToggle | SettingId::ShortcutNext | SettingId::ShortcutPrevious => {
            SettingEffect::RegisterShortcuts
        },
        SettingId::PopupPolicy | SettingId::ResetBounds => SettingEffect::Nothing,
    }
}

/// Work deferred until the settings window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTask {
    RecreateWindows,
}
