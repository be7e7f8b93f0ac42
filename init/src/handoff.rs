//! Entry-point hand-off.
//!
//! Replaces the bootstrap process with the application's entry point once
//! the runtime layout is in place. The entry point is started with its own
//! fixed arguments only, in the working root, inheriting environment and
//! stdio. It is not awaited or supervised.

use std::convert::Infallible;
use std::path::Path;
use std::process::Command;

use bootstrap_core::{BootstrapError, EntryPoint, Result};

/// Build the command that starts the entry point.
pub fn build_command(entrypoint: &EntryPoint, root: &Path) -> Command {
    let mut command = Command::new(&entrypoint.program);
    command.args(&entrypoint.args).current_dir(root);
    command
}

/// Transfer control to the entry point.
///
/// On Unix this replaces the current process image and only returns if
/// `execvp` fails.
#[cfg(unix)]
pub fn hand_off(entrypoint: &EntryPoint, root: &Path) -> Result<Infallible> {
    use std::os::unix::process::CommandExt;

    tracing::info!(
        program = %entrypoint.program,
        args = ?entrypoint.args,
        workdir = %root.display(),
        "Handing off to entry point"
    );

    let source = build_command(entrypoint, root).exec();
    Err(BootstrapError::HandOff {
        program: entrypoint.program.clone(),
        source,
    })
}

/// Transfer control to the entry point.
///
/// Without `exec`, the child is spawned and its exit status becomes ours.
#[cfg(not(unix))]
pub fn hand_off(entrypoint: &EntryPoint, root: &Path) -> Result<Infallible> {
    tracing::info!(
        program = %entrypoint.program,
        args = ?entrypoint.args,
        workdir = %root.display(),
        "Starting entry point (no exec on this platform)"
    );

    let status = build_command(entrypoint, root)
        .status()
        .map_err(|source| BootstrapError::HandOff {
            program: entrypoint.program.clone(),
            source,
        })?;
    std::process::exit(status.code().unwrap_or(1));
}
