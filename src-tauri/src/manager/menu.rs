//! Context menu model.
//!
//! The menu is rebuilt from a snapshot of the manager on every refresh and
//! handed to the shell, which turns it into native menu items. Item ids
//! round-trip through [`MenuAction::parse`].

use crate::page::CLIPBOARD_PAGE_LABEL;

const PAGE_PREFIX: &str = "page:";
const WINDOW_PREFIX: &str = "window:";
const CLIPBOARD_ID: &str = "clipboard";
const SETTINGS_ID: &str = "settings";
const QUIT_ID: &str = "quit";

/// Actions on the current page's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    Reset,
    ToggleMute,
    ToggleMaximize,
    Find,
    Hide,
    Close,
}

impl WindowAction {
    fn as_str(&self) -> &'static str {
        match self {
            WindowAction::Reset => "reset",
            WindowAction::ToggleMute => "mute",
            WindowAction::ToggleMaximize => "maximize",
            WindowAction::Find => "find",
            WindowAction::Hide => "hide",
            WindowAction::Close => "close",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "reset" => WindowAction::Reset,
            "mute" => WindowAction::ToggleMute,
            "maximize" => WindowAction::ToggleMaximize,
            "find" => WindowAction::Find,
            "hide" => WindowAction::Hide,
            "close" => WindowAction::Close,
            _ => return None,
        })
    }
}

/// What a menu item does when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    SelectPage(String),
    SelectClipboard,
    Window(WindowAction),
    Settings,
    Quit,
}

impl MenuAction {
    pub fn id(&self) -> String {
        match self {
            MenuAction::SelectPage(id) => format!("{}{}", PAGE_PREFIX, id),
            MenuAction::SelectClipboard => CLIPBOARD_ID.to_string(),
            MenuAction::Window(action) => format!("{}{}", WINDOW_PREFIX, action.as_str()),
            MenuAction::Settings => SETTINGS_ID.to_string(),
            MenuAction::Quit => QUIT_ID.to_string(),
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        if let Some(page) = id.strip_prefix(PAGE_PREFIX) {
            return Some(MenuAction::SelectPage(page.to_string()));
        }
        if let Some(action) = id.strip_prefix(WINDOW_PREFIX) {
            return WindowAction::parse(action).map(MenuAction::Window);
        }
        match id {
            CLIPBOARD_ID => Some(MenuAction::SelectClipboard),
            SETTINGS_ID => Some(MenuAction::Settings),
            QUIT_ID => Some(MenuAction::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item {
        id: String,
        label: String,
        enabled: bool,
        checked: bool,
    },
    Submenu {
        label: String,
        enabled: bool,
        entries: Vec<MenuEntry>,
    },
    Separator,
}

impl MenuEntry {
    fn item(action: MenuAction, label: impl Into<String>, enabled: bool) -> Self {
        MenuEntry::Item {
            id: action.id(),
            label: label.into(),
            enabled,
            checked: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuModel {
    pub entries: Vec<MenuEntry>,
}

/// Snapshot of one page for the menu.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStatus {
    pub id: String,
    pub label: String,
    pub openable: bool,
    pub current: bool,
    pub open: bool,
    pub visible: bool,
}

impl PageStatus {
    fn annotated_label(&self) -> String {
        let label = if self.label.trim().is_empty() {
            "(untitled)"
        } else {
            self.label.as_str()
        };
        match (self.open, self.visible) {
            (true, false) => format!("{} (hidden)", label),
            (true, true) if !self.current => format!("{} (open)", label),
            _ => label.to_string(),
        }
    }
}

/// State of the current page's window, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentWindow {
    pub muted: bool,
    pub maximized: bool,
}

/// Build the context menu.
///
/// `clipboard_url` is only offered when it is an http(s) URL.
pub fn build_menu(
    pages: &[PageStatus],
    clipboard_url: Option<&str>,
    current_window: Option<CurrentWindow>,
) -> MenuModel {
    let mut entries: Vec<MenuEntry> = pages
        .iter()
        .map(|page| MenuEntry::Item {
            id: MenuAction::SelectPage(page.id.clone()).id(),
            label: page.annotated_label(),
            enabled: page.openable,
            checked: page.current,
        })
        .collect();

    if clipboard_url.is_some_and(is_web_url) {
        entries.push(MenuEntry::item(
            MenuAction::SelectClipboard,
            CLIPBOARD_PAGE_LABEL,
            true,
        ));
    }
    if !entries.is_empty() {
        entries.push(MenuEntry::Separator);
    }

    let live = current_window.is_some();
    let state = current_window.unwrap_or(CurrentWindow {
        muted: false,
        maximized: false,
    });
    entries.push(MenuEntry::Submenu {
        label: "Window".to_string(),
        enabled: live,
        entries: vec![
            MenuEntry::item(MenuAction::Window(WindowAction::Reset), "Reset", live),
            MenuEntry::item(
                MenuAction::Window(WindowAction::ToggleMute),
                if state.muted { "Unmute" } else { "Mute" },
                live,
            ),
            MenuEntry::item(
                MenuAction::Window(WindowAction::ToggleMaximize),
                if state.maximized { "Restore" } else { "Maximize" },
                live,
            ),
            MenuEntry::item(MenuAction::Window(WindowAction::Find), "Find", live),
            MenuEntry::Separator,
            MenuEntry::item(MenuAction::Window(WindowAction::Hide), "Hide", live),
            MenuEntry::item(MenuAction::Window(WindowAction::Close), "Close", live),
        ],
    });
    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::item(MenuAction::Settings, "Settings", true));
    entries.push(MenuEntry::item(MenuAction::Quit, "Quit", true));

    MenuModel { entries }
}

/// Only web URLs are offered as a clipboard page.
pub fn is_web_url(text: &str) -> bool {
    url::Url::parse(text.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: &str, label: &str) -> PageStatus {
        PageStatus {
            id: id.to_string(),
            label: label.to_string(),
            openable: true,
            current: false,
            open: false,
            visible: false,
        }
    }

    fn item_labels(model: &MenuModel) -> Vec<String> {
        model
            .entries
            .iter()
            .filter_map(|entry| match entry {
                MenuEntry::Item { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_action_ids_round_trip() {
        for action in [
            MenuAction::SelectPage("abc-1".into()),
            MenuAction::SelectClipboard,
            MenuAction::Window(WindowAction::ToggleMaximize),
            MenuAction::Settings,
            MenuAction::Quit,
        ] {
            assert_eq!(MenuAction::parse(&action.id()), Some(action));
        }
        assert_eq!(MenuAction::parse("window:explode"), None);
        assert_eq!(MenuAction::parse("nope"), None);
    }

    #[test]
    fn test_pages_are_annotated_with_status() {
        let mut current = status("a", "Mail");
        current.current = true;
        current.open = true;
        current.visible = true;
        let mut hidden = status("b", "Chat");
        hidden.open = true;
        let mut open = status("c", "Docs");
        open.open = true;
        open.visible = true;
        let mut broken = status("d", "");
        broken.openable = false;

        let model = build_menu(&[current, hidden, open, broken], None, None);
        assert_eq!(
            item_labels(&model)[..4],
            ["Mail", "Chat (hidden)", "Docs (open)", "(untitled)"]
        );
        assert!(matches!(
            &model.entries[0],
            MenuEntry::Item { checked: true, .. }
        ));
        assert!(matches!(
            &model.entries[3],
            MenuEntry::Item { enabled: false, .. }
        ));
    }

    #[test]
    fn test_clipboard_entry_needs_web_url() {
        let pages = [status("a", "Mail")];
        let with_url = build_menu(&pages, Some("https://example.com/x"), None);
        assert!(item_labels(&with_url).contains(&CLIPBOARD_PAGE_LABEL.to_string()));

        let with_text = build_menu(&pages, Some("hello world"), None);
        assert!(!item_labels(&with_text).contains(&CLIPBOARD_PAGE_LABEL.to_string()));
        let with_file = build_menu(&pages, Some("file:///etc/passwd"), None);
        assert!(!item_labels(&with_file).contains(&CLIPBOARD_PAGE_LABEL.to_string()));
    }

    #[test]
    fn test_window_submenu_follows_current_window() {
        let model = build_menu(
            &[],
            None,
            Some(CurrentWindow {
                muted: true,
                maximized: false,
            }),
        );
        let MenuEntry::Submenu { enabled, entries, .. } = &model.entries[0] else {
            panic!("expected window submenu first");
        };
        assert!(enabled);
        assert!(entries.iter().any(|e| matches!(e, MenuEntry::Item { label, .. } if label == "Unmute")));

        let idle = build_menu(&[], None, None);
        assert!(matches!(
            &idle.entries[0],
            MenuEntry::Submenu { enabled: false, .. }
        ));
    }
}
