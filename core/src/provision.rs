//! Runtime layout provisioner.
//!
//! Ensures every directory of a [`RuntimeLayout`] exists under a working
//! root. Creation is "create if absent": a directory that already exists,
//! including one created concurrently by another instance, is left
//! untouched. Any other outcome aborts provisioning.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};
use serde::{Deserialize, Serialize};

use crate::error::ProvisioningError;
use crate::layout::RuntimeLayout;

/// State of a single required directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirState {
    /// Created by this run.
    Created,
    /// Already present as a directory.
    Existing,
    /// Not present (inspection only).
    Missing,
    /// Occupied by a non-directory (inspection only).
    Collision,
    /// Present as a directory the running user cannot write (inspection only).
    NotWritable,
}

impl std::fmt::Display for DirState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Existing => write!(f, "existing"),
            Self::Missing => write!(f, "missing"),
            Self::Collision => write!(f, "collision"),
            Self::NotWritable => write!(f, "not-writable"),
        }
    }
}

/// Outcome for one required directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirReport {
    pub name: String,
    pub path: PathBuf,
    pub state: DirState,
}

/// Outcome of a provisioning or inspection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub root: PathBuf,
    pub entries: Vec<DirReport>,
}

impl ProvisionReport {
    /// Names of directories created by this run.
    pub fn created(&self) -> Vec<&str> {
        self.names_in(DirState::Created)
    }

    /// Names of directories that were already present.
    pub fn existing(&self) -> Vec<&str> {
        self.names_in(DirState::Existing)
    }

    /// Whether every required directory is present.
    pub fn is_complete(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e.state, DirState::Created | DirState::Existing))
    }

    /// Whether any required path is occupied by a non-directory.
    pub fn has_collision(&self) -> bool {
        self.entries.iter().any(|e| e.state == DirState::Collision)
    }

    /// Whether provisioning would fail on this layout.
    pub fn is_blocked(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.state, DirState::Collision | DirState::NotWritable))
    }

    fn names_in(&self, state: DirState) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.state == state)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Provisions a runtime layout under a working root.
#[derive(Debug, Clone)]
pub struct Provisioner {
    root: PathBuf,
    layout: RuntimeLayout,
}

impl Provisioner {
    /// Create a provisioner for the standard layout.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: RuntimeLayout::standard(),
        }
    }

    /// Set a custom layout.
    pub fn with_layout(mut self, layout: RuntimeLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &RuntimeLayout {
        &self.layout
    }

    /// Verify the working root is a directory the running user can write.
    ///
    /// Runs before any directory is created, so an unusable root leaves
    /// the filesystem untouched.
    pub fn preflight(&self) -> Result<(), ProvisioningError> {
        let meta = match fs::metadata(&self.root) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProvisioningError::RootMissing {
                    path: self.root.clone(),
                })
            }
            Err(e) => {
                return Err(ProvisioningError::RootNotWritable {
                    path: self.root.clone(),
                    source: e,
                })
            }
        };

        if !meta.is_dir() {
            return Err(ProvisioningError::RootNotDirectory {
                path: self.root.clone(),
            });
        }

        check_writable(&self.root).map_err(|source| ProvisioningError::RootNotWritable {
            path: self.root.clone(),
            source,
        })
    }

    /// Ensure every required directory exists.
    ///
    /// Stops at the first failure; directories created before it are kept.
    pub fn provision(&self) -> Result<ProvisionReport, ProvisioningError> {
        tracing::info!(
            root = %self.root.display(),
            dirs = ?self.layout.required_dirs(),
            "Provisioning runtime layout"
        );

        self.preflight()?;

        let mut entries = Vec::new();
        for (name, path) in self
            .layout
            .required_dirs()
            .into_iter()
            .zip(self.layout.resolve(&self.root))
        {
            let state = ensure_dir(&path)?;
            tracing::debug!(dir = %path.display(), state = %state, "Ensured directory");
            entries.push(DirReport {
                name: name.to_string(),
                path,
                state,
            });
        }

        let report = ProvisionReport {
            root: self.root.clone(),
            entries,
        };
        tracing::info!(
            created = ?report.created(),
            existing = ?report.existing(),
            "Runtime layout ready"
        );
        Ok(report)
    }

    /// Report the state of every required directory without changing anything.
    ///
    /// Fails only when the root itself is unusable.
    pub fn inspect(&self) -> Result<ProvisionReport, ProvisioningError> {
        self.preflight()?;

        let entries = self
            .layout
            .required_dirs()
            .into_iter()
            .zip(self.layout.resolve(&self.root))
            .map(|(name, path)| {
                let state = match fs::metadata(&path) {
                    Ok(meta) if meta.is_dir() => match check_writable(&path) {
                        Ok(()) => DirState::Existing,
                        Err(_) => DirState::NotWritable,
                    },
                    Ok(_) => DirState::Collision,
                    Err(_) => match fs::symlink_metadata(&path) {
                        // Dangling symlink: the name is taken.
                        Ok(_) => DirState::Collision,
                        Err(_) => DirState::Missing,
                    },
                };
                DirReport {
                    name: name.to_string(),
                    path,
                    state,
                }
            })
            .collect();

        Ok(ProvisionReport {
            root: self.root.clone(),
            entries,
        })
    }
}

/// Whether the running user may create entries in `path`.
fn check_writable(path: &Path) -> io::Result<()> {
    access(path, AccessFlags::W_OK | AccessFlags::X_OK).map_err(io::Error::from)
}

/// Create `path` if absent, then require that it is writable.
fn ensure_dir(path: &Path) -> Result<DirState, ProvisioningError> {
    let state = match fs::create_dir(path) {
        Ok(()) => DirState::Created,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            // Follows symlinks: a link to a directory is accepted.
            if !path.is_dir() {
                return Err(ProvisioningError::NotADirectory {
                    path: path.to_path_buf(),
                });
            }
            DirState::Existing
        }
        Err(e) => {
            return Err(ProvisioningError::CreateFailed {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    // A restrictive umask or a pre-existing read-only directory.
    check_writable(path).map_err(|source| ProvisioningError::NotWritable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(state)
}

/// Provision the standard layout under `root`.
pub fn provision_standard(root: impl Into<PathBuf>) -> Result<ProvisionReport, ProvisioningError> {
    Provisioner::new(root).provision()
}
