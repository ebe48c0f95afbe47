// ABOUTME: Pure translation from the favorites list and active destination into a menu model
// ABOUTME: Menu ids encode the action and the favorite's path so clicks map back without lookup tables

use crate::destination::Destination;
use std::path::PathBuf;

const SELECT_PREFIX: &str = "select:";
const DELETE_PREFIX: &str = "delete:";
const ADD_ID: &str = "add";
const QUIT_ID: &str = "quit";

pub const ADD_LABEL: &str = "Add Destination…";
pub const DELETE_LABEL: &str = "Remove Destination";
pub const QUIT_LABEL: &str = "Quit";

/// What a click on a menu entry asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Select(Destination),
    Delete(Destination),
    Add,
    Quit,
}

impl MenuAction {
    pub fn id(&self) -> String {
        match self {
            MenuAction::Select(destination) => format!("{SELECT_PREFIX}{destination}"),
            MenuAction::Delete(destination) => format!("{DELETE_PREFIX}{destination}"),
            MenuAction::Add => ADD_ID.to_string(),
            MenuAction::Quit => QUIT_ID.to_string(),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        if let Some(path) = id.strip_prefix(SELECT_PREFIX) {
            return Some(MenuAction::Select(Destination::new(path)));
        }
        if let Some(path) = id.strip_prefix(DELETE_PREFIX) {
            return Some(MenuAction::Delete(Destination::new(path)));
        }
        match id {
            ADD_ID => Some(MenuAction::Add),
            QUIT_ID => Some(MenuAction::Quit),
            _ => None,
        }
    }
}

/// The OS folder icon an entry is drawn with. A check mark is painted over
/// the icon of the checked entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    pub path: PathBuf,
    pub check_mark: bool,
}

/// One favorite as it appears in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub label: String,
    pub destination: Destination,
    pub checked: bool,
}

impl FolderEntry {
    fn new(destination: &Destination, checked: bool) -> Self {
        Self {
            label: destination.display_name().to_string(),
            destination: destination.clone(),
            checked,
        }
    }

    pub fn icon(&self) -> IconRequest {
        IconRequest {
            path: self.destination.path().to_path_buf(),
            check_mark: self.checked,
        }
    }

    pub fn select_action(&self) -> MenuAction {
        MenuAction::Select(self.destination.clone())
    }

    pub fn delete_action(&self) -> MenuAction {
        MenuAction::Delete(self.destination.clone())
    }
}

/// Top-level menu items in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Select(FolderEntry),
    Separator,
    Add,
    /// Omitted entirely when there is nothing to delete.
    DeleteSubmenu(Vec<FolderEntry>),
    Quit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuModel {
    pub entries: Vec<MenuEntry>,
}

impl MenuModel {
    pub fn select_entries(&self) -> impl Iterator<Item = &FolderEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            MenuEntry::Select(folder) => Some(folder),
            _ => None,
        })
    }

    pub fn checked(&self) -> Option<&Destination> {
        self.select_entries()
            .find(|folder| folder.checked)
            .map(|folder| &folder.destination)
    }

    #[cfg(test)]
    pub fn delete_entries(&self) -> Option<&[FolderEntry]> {
        self.entries.iter().find_map(|entry| match entry {
            MenuEntry::DeleteSubmenu(folders) => Some(folders.as_slice()),
            _ => None,
        })
    }
}

/// Rebuilds the whole menu. `favorites` is expected in sorted order; `active`
/// is the destination the OS currently reports.
pub fn build(favorites: &[Destination], active: &Destination) -> MenuModel {
    let mut entries: Vec<MenuEntry> = favorites
        .iter()
        .map(|destination| MenuEntry::Select(FolderEntry::new(destination, destination == active)))
        .collect();

    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::Add);

    if !favorites.is_empty() {
        let deletable = favorites
            .iter()
            .map(|destination| FolderEntry::new(destination, false))
            .collect();
        entries.push(MenuEntry::DeleteSubmenu(deletable));
    }

    entries.push(MenuEntry::Quit);

    MenuModel { entries }
}
