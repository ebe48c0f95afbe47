// ABOUTME: Core application state and Model-View-Update logic for the screenshot destination menu
// ABOUTME: Applies select/delete/add actions to the favorites and external setting, then rebuilds the menu

use crate::destination::Destination;
use crate::favorites::Favorites;
use crate::menu::{self, MenuModel};
use crate::screencapture::ExternalSetting;
use std::path::PathBuf;

pub struct AppState {
    favorites: Favorites,
    setting: ExternalSetting,
    menu: MenuModel,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Make this folder the OS screenshot location.
    Select(Destination),
    /// Drop this folder from the favorites. The OS setting is left alone.
    Delete(Destination),
    /// Result of the folder picker; `None` when the user cancelled.
    AddFolder(Option<PathBuf>),
    /// Persist before the process exits.
    Terminate,
}

impl AppState {
    /// Launch: takes the already loaded favorites and builds the first menu.
    pub fn new(favorites: Favorites, setting: ExternalSetting) -> Self {
        let mut state = Self {
            favorites,
            setting,
            menu: MenuModel::default(),
            error_message: None,
        };
        state.rebuild_menu();
        state
    }

    /// `error_message` afterwards describes only failures from this message.
    pub fn update(&mut self, message: Message) {
        self.error_message = None;

        match message {
            Message::Select(destination) => {
                match self.setting.set(&destination) {
                    Ok(outcome) if !outcome.refreshed => {
                        self.error_message = Some(format!(
                            "Screenshot location changed to {destination}, but the menubar was not refreshed"
                        ));
                    }
                    Ok(_) => {}
                    Err(e) => self.report(e.to_string()),
                }
                self.rebuild_menu();
            }

            Message::Delete(destination) => {
                match self.favorites.remove(&destination) {
                    Ok(true) => tracing::info!("Removed favorite {destination}"),
                    Ok(false) => tracing::debug!("{destination} was not a favorite"),
                    Err(e) => self.report(format!("Failed to save favorites: {e:#}")),
                }
                self.rebuild_menu();
            }

            Message::AddFolder(None) => {
                tracing::debug!("Folder selection cancelled");
            }

            Message::AddFolder(Some(folder)) => {
                let destination = Destination::new(folder);
                match self.favorites.add(destination.clone()) {
                    Ok(true) => tracing::info!("Added favorite {destination}"),
                    Ok(false) => tracing::debug!("{destination} is already a favorite"),
                    Err(e) => self.report(format!("Failed to save favorites: {e:#}")),
                }
                self.rebuild_menu();
            }

            Message::Terminate => {
                if let Err(e) = self.favorites.save() {
                    self.report(format!("Failed to save favorites: {e:#}"));
                }
            }
        }
    }

    pub fn menu(&self) -> &MenuModel {
        &self.menu
    }

    #[cfg(test)]
    pub fn favorites(&self) -> &[Destination] {
        self.favorites.as_slice()
    }

    /// Queries the OS setting once and regenerates every entry.
    fn rebuild_menu(&mut self) {
        let active = self.setting.get();
        self.menu = menu::build(self.favorites.as_slice(), &active);
        tracing::debug!("Menu rebuilt, checked entry: {:?}", self.menu.checked());
    }

    fn report(&mut self, message: String) {
        tracing::warn!("{message}");
        self.error_message = Some(message);
    }
}
