// ABOUTME: Persisted, sorted, duplicate-free list of favorite screenshot destinations
// ABOUTME: Storage is abstracted behind a trait; production storage is a TOML state file

use crate::destination::Destination;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Backing store for the favorite folder paths.
pub trait FavoritesStorage {
    /// Returns `None` when nothing has been persisted yet.
    fn read(&self) -> Result<Option<Vec<String>>>;

    /// Replaces any previously persisted list.
    fn write(&self, paths: &[String]) -> Result<()>;
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct FavoritesFile {
    #[serde(rename = "pathsKey", default, skip_serializing_if = "Option::is_none")]
    paths: Option<Vec<String>>,
}

/// Stores the favorites as `pathsKey = [...]` in a TOML file.
pub struct TomlFavoritesStorage {
    path: PathBuf,
}

impl TomlFavoritesStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStorage for TomlFavoritesStorage {
    fn read(&self) -> Result<Option<Vec<String>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read favorites file: {}", self.path.display()))?;
        let file: FavoritesFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse favorites file: {}", self.path.display()))?;

        Ok(file.paths)
    }

    fn write(&self, paths: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favorites directory: {}", parent.display())
            })?;
        }

        let file = FavoritesFile {
            paths: Some(paths.to_vec()),
        };
        let content = toml::to_string(&file).context("Failed to serialize favorites")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write favorites to: {}", self.path.display()))
    }
}

/// The favorites list. Always sorted ascending by path string with no duplicates.
pub struct Favorites {
    entries: Vec<Destination>,
    storage: Box<dyn FavoritesStorage>,
}

impl Favorites {
    /// Reads the persisted list, seeding it with `defaults` when nothing is
    /// stored or the store cannot be read. The seed is not written back here.
    pub fn load(storage: Box<dyn FavoritesStorage>, defaults: &[Destination]) -> Self {
        let entries = match storage.read() {
            Ok(Some(paths)) => {
                tracing::info!("Loaded {} favorite destinations", paths.len());
                paths.iter().map(Destination::new).collect()
            }
            Ok(None) => {
                tracing::info!("No saved favorites, seeding {} defaults", defaults.len());
                defaults.to_vec()
            }
            Err(e) => {
                tracing::warn!("Failed to load favorites: {e:#}. Using defaults.");
                defaults.to_vec()
            }
        };

        let mut favorites = Self { entries, storage };
        favorites.sort();
        favorites
    }

    pub fn as_slice(&self) -> &[Destination] {
        &self.entries
    }

    /// Inserts `destination` and persists. Returns `Ok(false)` without writing
    /// when it is already present. On `Err` the in-memory list has still been
    /// updated; only the write failed.
    pub fn add(&mut self, destination: Destination) -> Result<bool> {
        match self.entries.binary_search(&destination) {
            Ok(_) => Ok(false),
            Err(idx) => {
                self.entries.insert(idx, destination);
                self.save()?;
                Ok(true)
            }
        }
    }

    /// Removes every entry matching `destination` and persists, whether or not
    /// anything was removed. Same error contract as [`Favorites::add`].
    pub fn remove(&mut self, destination: &Destination) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != destination);
        let removed = self.entries.len() != before;
        self.save()?;
        Ok(removed)
    }

    pub fn save(&self) -> Result<()> {
        let paths: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.as_str().to_string())
            .collect();
        self.storage.write(&paths)
    }

    fn sort(&mut self) {
        self.entries.sort();
        self.entries.dedup();
    }
}

#[cfg(test)]
pub use memory::MemoryFavoritesStorage;

#[cfg(test)]
mod memory {
    use super::FavoritesStorage;
    use anyhow::{Result, bail};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// In-memory storage whose clones share state, so a test can keep a handle
    /// after boxing one into [`super::Favorites`].
    #[derive(Clone, Default)]
    pub struct MemoryFavoritesStorage {
        paths: Rc<RefCell<Option<Vec<String>>>>,
        fail_reads: Rc<Cell<bool>>,
        fail_writes: Rc<Cell<bool>>,
        writes: Rc<Cell<usize>>,
    }

    impl MemoryFavoritesStorage {
        pub fn with_paths(paths: &[&str]) -> Self {
            let storage = Self::default();
            *storage.paths.borrow_mut() = Some(paths.iter().map(|p| p.to_string()).collect());
            storage
        }

        pub fn stored(&self) -> Option<Vec<String>> {
            self.paths.borrow().clone()
        }

        pub fn writes(&self) -> usize {
            self.writes.get()
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.set(fail);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.set(fail);
        }
    }

    impl FavoritesStorage for MemoryFavoritesStorage {
        fn read(&self) -> Result<Option<Vec<String>>> {
            if self.fail_reads.get() {
                bail!("simulated read failure");
            }
            Ok(self.paths.borrow().clone())
        }

        fn write(&self, paths: &[String]) -> Result<()> {
            if self.fail_writes.get() {
                bail!("simulated write failure");
            }
            *self.paths.borrow_mut() = Some(paths.to_vec());
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }
}
