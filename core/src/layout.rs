//! Runtime layout definition.
//!
//! Defines the directories an application expects under its working root
//! before it starts.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{BootstrapError, Result};

/// Log output directory.
pub const LOGS_DIR: &str = "logs";

/// Persistent data directory.
pub const STORAGE_DIR: &str = "storage";

/// Runtime configuration directory.
pub const CONFIG_DIR: &str = "config";

/// Directories of the standard runtime layout, in creation order.
pub const STANDARD_DIRS: [&str; 3] = [LOGS_DIR, STORAGE_DIR, CONFIG_DIR];

/// Set of directory names that must exist under the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLayout {
    dirs: Vec<String>,
}

impl Default for RuntimeLayout {
    fn default() -> Self {
        Self {
            dirs: STANDARD_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl RuntimeLayout {
    /// Get the standard layout (`logs`, `storage`, `config`).
    pub fn standard() -> Self {
        Self::default()
    }

    /// Build a custom layout from directory names.
    pub fn new<I, S>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let layout = Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Check that every name is a unique, single relative path component.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for dir in &self.dirs {
            if !is_single_component(dir) {
                return Err(BootstrapError::Config(format!(
                    "invalid layout directory name '{}': must be a single relative path component",
                    dir
                )));
            }
            if !seen.insert(dir.as_str()) {
                return Err(BootstrapError::Config(format!(
                    "duplicate layout directory name '{}'",
                    dir
                )));
            }
        }
        Ok(())
    }

    /// Get all directories that need to exist under the root.
    pub fn required_dirs(&self) -> Vec<&str> {
        self.dirs.iter().map(String::as_str).collect()
    }

    /// Resolve every required directory against a working root.
    pub fn resolve(&self, root: &Path) -> Vec<PathBuf> {
        self.dirs.iter().map(|d| root.join(d)).collect()
    }
}

/// A plain file name: no separators, not `.` or `..`, no prefix.
///
/// Checked on the raw string since `Path::components` drops trailing
/// separators and `.` segments.
fn is_single_component(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
