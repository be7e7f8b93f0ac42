//! Bootstrap init library.
//!
//! Command-line front end of the bootstrap: provisions the runtime layout
//! and hands control to the application's entry point.

pub mod cli;
pub mod handoff;
pub mod logging;

pub use cli::{execute, Cli};
pub use logging::LogFormat;
