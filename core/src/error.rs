use std::path::PathBuf;
use thiserror::Error;

/// Failure to ensure a required runtime directory exists.
///
/// Every variant is fatal: startup is aborted before the entry point runs.
#[derive(Error, Debug)]
pub enum ProvisioningError {
    /// Working root does not exist
    #[error("working root {} does not exist", .path.display())]
    RootMissing { path: PathBuf },

    /// Working root exists but is not a directory
    #[error("working root {} is not a directory", .path.display())]
    RootNotDirectory { path: PathBuf },

    /// Working root cannot be written to by the running user
    #[error("working root {} is not writable: {source}", .path.display())]
    RootNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required path is occupied by something other than a directory
    #[error("required path {} exists and is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    /// A required directory exists but the running user cannot write it
    #[error("required directory {} is not writable: {source}", .path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed (permission denied, disk full, ...)
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisioningError {
    /// The path the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::RootMissing { path }
            | Self::RootNotDirectory { path }
            | Self::RootNotWritable { path, .. }
            | Self::NotADirectory { path }
            | Self::NotWritable { path, .. }
            | Self::CreateFailed { path, .. } => path,
        }
    }
}

/// Bootstrap error types
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Runtime layout could not be provisioned
    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entry point could not be started
    #[error("Hand-off to {program} failed: {source}")]
    HandOff {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BootstrapError {
    fn from(err: serde_json::Error) -> Self {
        BootstrapError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BootstrapError {
    fn from(err: serde_yaml::Error) -> Self {
        BootstrapError::Serialization(err.to_string())
    }
}

/// `EX_CANTCREAT` from sysexits.h.
pub const EXIT_CANT_CREATE: i32 = 73;
/// `EX_CONFIG` from sysexits.h.
pub const EXIT_CONFIG: i32 = 78;
/// Shell convention for a command that was found but could not run.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Shell convention for a command that was not found.
pub const EXIT_NOT_FOUND: i32 = 127;

impl BootstrapError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Provisioning(_) => EXIT_CANT_CREATE,
            Self::Config(_) | Self::Serialization(_) => EXIT_CONFIG,
            Self::HandOff { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            Self::HandOff { .. } => EXIT_NOT_EXECUTABLE,
            Self::Io(_) => 1,
        }
    }
}

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;
