//! Bootstrap Core - runtime layout provisioning
//!
//! Types and the filesystem half of the bootstrap: the runtime layout an
//! application expects under its working root, the idempotent provisioner
//! that creates it, and bootstrap configuration.

pub mod config;
pub mod error;
pub mod layout;
pub mod provision;

// Re-export commonly used types
pub use config::{BootstrapConfig, EntryPoint};
pub use error::{BootstrapError, ProvisioningError, Result};
pub use layout::RuntimeLayout;
pub use provision::{DirReport, DirState, ProvisionReport, Provisioner};

/// Bootstrap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
