// ABOUTME: Cross-platform tray icon rendering the destination menu using the tray-icon crate
// ABOUTME: Runs the event loop and turns menu clicks into application messages

use crate::app::{AppState, Message};
use crate::menu::{ADD_LABEL, DELETE_LABEL, MenuAction, MenuEntry, MenuModel, QUIT_LABEL};
use crate::platform::{FolderIconProvider, FolderPicker, Platform, entry_icon};
use anyhow::Result;
use image::{Rgba, RgbaImage};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoopBuilder};
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{IconMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem, Submenu},
};

const TOOLTIP: &str = "Screenshot Destination";
/// Shown instead of the icon when the icon cannot be built.
const FALLBACK_TITLE: &str = "SD";
const STATUS_ICON_SIZE: u32 = 18;

#[derive(Debug)]
enum UserEvent {
    Menu(MenuEvent),
}

pub struct DestinationTray {
    tray_icon: TrayIcon,
}

impl DestinationTray {
    pub fn new(model: &MenuModel, icons: &dyn FolderIconProvider) -> Result<Self> {
        let menu = build_menu(model, icons)?;

        let mut tray_builder = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(TOOLTIP);

        match status_icon() {
            Ok(icon) => {
                tray_builder = tray_builder.with_icon(icon);

                // Template mode on macOS for automatic dark mode adaptation
                #[cfg(target_os = "macos")]
                {
                    tray_builder = tray_builder.with_icon_as_template(true);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to build status icon: {e}. Showing title instead.");
                tray_builder = tray_builder.with_title(FALLBACK_TITLE);
            }
        }

        let tray_icon = tray_builder.build()?;
        tracing::info!("Created tray icon");

        Ok(Self { tray_icon })
    }

    /// Replaces the whole menu; nothing from the previous menu is kept. The
    /// last non-fatal failure, if any, is shown as the tooltip.
    pub fn render(&self, app: &AppState, icons: &dyn FolderIconProvider) -> Result<()> {
        let menu = build_menu(app.menu(), icons)?;
        self.tray_icon.set_menu(Some(Box::new(menu)));
        let tooltip = app.error_message.as_deref().unwrap_or(TOOLTIP);
        self.tray_icon.set_tooltip(Some(tooltip))?;
        Ok(())
    }
}

fn build_menu(model: &MenuModel, icons: &dyn FolderIconProvider) -> Result<Menu> {
    let menu = Menu::new();

    for entry in &model.entries {
        match entry {
            MenuEntry::Select(folder) => {
                // Icon items have no check state of their own; the mark is drawn into the icon.
                let item = IconMenuItem::with_id(
                    folder.select_action().id(),
                    &folder.label,
                    true,
                    entry_icon(icons, &folder.icon()),
                    None,
                );
                menu.append(&item)?;
            }
            MenuEntry::Separator => {
                menu.append(&PredefinedMenuItem::separator())?;
            }
            MenuEntry::Add => {
                menu.append(&MenuItem::with_id(MenuAction::Add.id(), ADD_LABEL, true, None))?;
            }
            MenuEntry::DeleteSubmenu(folders) => {
                let submenu = Submenu::new(DELETE_LABEL, true);
                for folder in folders {
                    let item = IconMenuItem::with_id(
                        folder.delete_action().id(),
                        &folder.label,
                        true,
                        entry_icon(icons, &folder.icon()),
                        None,
                    );
                    submenu.append(&item)?;
                }
                menu.append(&submenu)?;
            }
            MenuEntry::Quit => {
                menu.append(&MenuItem::with_id(MenuAction::Quit.id(), QUIT_LABEL, true, None))?;
            }
        }
    }

    Ok(menu)
}

/// A small camera glyph, drawn black-on-transparent so it works as a template image.
fn status_icon() -> Result<Icon> {
    let glyph = RgbaImage::from_fn(STATUS_ICON_SIZE, STATUS_ICON_SIZE, |x, y| {
        let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
        let body = (1.0..17.0).contains(&fx) && (5.0..15.0).contains(&fy);
        let viewfinder = (6.0..12.0).contains(&fx) && (3.0..5.0).contains(&fy);
        let lens = ((fx - 9.0).powi(2) + (fy - 10.0).powi(2)).sqrt();
        let lens_gap = (1.8..3.2).contains(&lens);

        if (body || viewfinder) && !lens_gap {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });

    Ok(Icon::from_rgba(glyph.into_raw(), STATUS_ICON_SIZE, STATUS_ICON_SIZE)?)
}

/// Applies a menu action. Returns `false` when the app should exit.
fn dispatch(app: &mut AppState, action: MenuAction, picker: &dyn FolderPicker) -> bool {
    tracing::debug!("Menu action: {action:?}");
    let message = match action {
        MenuAction::Select(destination) => Message::Select(destination),
        MenuAction::Delete(destination) => Message::Delete(destination),
        MenuAction::Add => Message::AddFolder(picker.pick_folder()),
        MenuAction::Quit => return false,
    };
    app.update(message);
    true
}

/// Runs the status-bar event loop until Quit. Favorites are saved when the loop ends.
pub fn run(mut app: AppState) -> ! {
    #[allow(unused_mut)]
    let mut event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();

    #[cfg(target_os = "macos")]
    {
        use tao::platform::macos::{ActivationPolicy, EventLoopExtMacOS};
        event_loop.set_activation_policy(ActivationPolicy::Accessory);
    }

    let proxy_for_menu = event_loop.create_proxy();
    MenuEvent::set_event_handler(Some(move |event| {
        let _ = proxy_for_menu.send_event(UserEvent::Menu(event));
    }));

    let icons = Platform::icon_provider();
    let picker = Platform::folder_picker();
    let mut tray: Option<DestinationTray> = None;

    event_loop.run(move |event, _target, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                if tray.is_none() {
                    match DestinationTray::new(app.menu(), icons.as_ref()) {
                        Ok(built) => tray = Some(built),
                        Err(e) => {
                            tracing::error!("Failed to create tray icon: {e:#}");
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                }
            }

            Event::UserEvent(UserEvent::Menu(menu_event)) => {
                let Some(action) = MenuAction::from_id(menu_event.id.0.as_str()) else {
                    tracing::debug!("Ignoring unknown menu id: {}", menu_event.id.0);
                    return;
                };

                if !dispatch(&mut app, action, picker.as_ref()) {
                    tracing::info!("Quit selected - exiting");
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                if let Some(tray) = &tray {
                    if let Err(e) = tray.render(&app, icons.as_ref()) {
                        tracing::warn!("Failed to rebuild menu: {e:#}");
                    }
                }
            }

            Event::LoopDestroyed => {
                app.update(Message::Terminate);
                tracing::info!("Event loop finished");
            }

            _ => {}
        }
    })
}
