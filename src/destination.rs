// ABOUTME: Destination value type identifying a screenshot folder by its normalized absolute path
// ABOUTME: Provides lexical normalization, string ordering, and the display name used for menu labels

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A folder that screenshots can be saved to.
///
/// Two destinations are equal when their normalized path strings are equal, and
/// they order lexicographically by that string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Destination {
    path: String,
}

impl Destination {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: normalize(path.as_ref()),
        }
    }

    /// `<home>/<name>`, used for the seeded favorites and the Desktop fallback.
    pub fn in_home(name: &str) -> Self {
        Self::new(home_dir().join(name))
    }

    pub fn desktop() -> Self {
        Self::in_home("Desktop")
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Last path component, or the whole path for the filesystem root.
    pub fn display_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) if idx + 1 < self.path.len() => &self.path[idx + 1..],
            _ => &self.path,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for Destination {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Lexical normalization: no filesystem access, symlinks are left alone.
fn normalize(path: &Path) -> String {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) if path.is_relative() => home_dir().join(path),
        Err(_) => path.to_path_buf(),
    };

    let mut parts: Vec<String> = Vec::new();
    for component in expanded.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    format!("/{}", parts.join("/"))
}
