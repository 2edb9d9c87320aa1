//! System tray setup and event handling.

use tauri::{
    image::Image,
    menu::{CheckMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    App, AppHandle, Manager, Runtime,
};

use super::icon;
use crate::manager::menu::{MenuEntry, MenuModel};
use crate::manager::shell::{Glyph, TrayView};
use crate::AppServices;

pub const TRAY_ID: &str = "webtray";

pub fn glyph_image(glyph: Glyph, active: bool) -> Image<'static> {
    let (rgba, width, height) = icon::render_rgba(glyph, active);
    Image::new_owned(rgba, width, height)
}

/// Build a native menu from the model.
pub fn build_menu<R: Runtime>(app: &AppHandle<R>, model: &MenuModel) -> tauri::Result<Menu<R>> {
    let menu = Menu::new(app)?;
    for entry in &model.entries {
        let item = build_entry(app, entry)?;
        menu.append(item.as_ref())?;
    }
    Ok(menu)
}

fn build_entry<R: Runtime>(
    app: &AppHandle<R>,
    entry: &MenuEntry,
) -> tauri::Result<Box<dyn IsMenuItem<R>>> {
    Ok(match entry {
        MenuEntry::Item {
            id,
            label,
            enabled,
            checked: true,
        } => Box::new(CheckMenuItem::with_id(
            app,
            id.as_str(),
            label,
            *enabled,
            true,
            None::<&str>,
        )?),
        MenuEntry::Item {
            id, label, enabled, ..
        } => Box::new(MenuItem::with_id(
            app,
            id.as_str(),
            label,
            *enabled,
            None::<&str>,
        )?),
        MenuEntry::Submenu {
            label,
            enabled,
            entries,
        } => {
            let submenu = Submenu::new(app, label, *enabled)?;
            for child in entries {
                let item = build_entry(app, child)?;
                submenu.append(item.as_ref())?;
            }
            Box::new(submenu)
        },
        MenuEntry::Separator => Box::new(PredefinedMenuItem::separator(app)?),
    })
}

/// Apply a tray view to the live tray icon.
pub fn apply_view<R: Runtime>(app: &AppHandle<R>, view: &TrayView) -> tauri::Result<()> {
    let Some(tray) = app.tray_by_id(TRAY_ID) else {
        return Ok(());
    };
    tray.set_icon(Some(glyph_image(view.glyph, view.active)))?;
    tray.set_tooltip(Some(view.tooltip.as_str()))?;
    tray.set_menu(Some(build_menu(app, &view.menu)?))?;
    Ok(())
}

/// Create the tray icon. Its menu is filled on the first refresh.
pub fn init(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = app.handle();
    let menu = build_menu(handle, &MenuModel::default())?;

    TrayIconBuilder::with_id(TRAY_ID)
        .icon(glyph_image(Glyph::Light, false))
        .tooltip("WebTray")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(|app, event| {
            let Some(services) = app.try_state::<AppServices>() else {
                return;
            };
            if let Err(e) = services.manager.menu_action(event.id.as_ref()) {
                log::error!("[TRAY] Menu action {} failed: {}", event.id.as_ref(), e);
            }
        })
        .on_tray_icon_event(|tray, event| {
            let app = tray.app_handle();
            let Some(services) = app.try_state::<AppServices>() else {
                return;
            };
            match event {
                TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } => {
                    if let Err(e) = services.manager.toggle_current() {
                        log::error!("[TRAY] Toggle failed: {}", e);
                    }
                },
                // Clipboard contents and page state may have changed since
                // the last refresh; rebuild before the menu can open.
                TrayIconEvent::Enter { .. } => services.manager.refresh_tray(),
                _ => {},
            }
        })
        .build(app)?;

    log::info!("[TRAY] Tray icon created");
    Ok(())
}
