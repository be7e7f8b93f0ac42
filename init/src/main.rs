//! Bootstrap init process.
//!
//! Runs as the container's command and is responsible for:
//! - Ensuring the runtime layout (`logs`, `storage`, `config`) exists
//! - Aborting startup if it cannot
//! - Replacing itself with the application entry point

use bootstrap_core::VERSION;
use bootstrap_init::{execute, logging, Cli, LogFormat};
use clap::Parser;
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    logging::init(LogFormat::resolve(cli.log_format));

    debug!("bootstrap-init {} starting (PID {})", VERSION, process::id());

    let mut stdout = std::io::stdout().lock();
    match execute(&cli, &mut stdout) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Bootstrap failed: {}", e);
            process::exit(e.exit_code());
        }
    }
}
