//! Command-line interface.

use std::io::Write;
use std::path::PathBuf;

use bootstrap_core::{BootstrapConfig, EntryPoint, ProvisionReport, Provisioner, Result};
use clap::{Args, Parser, Subcommand};

use crate::handoff;
use crate::logging::LogFormat;

/// Exit status of `check` when a required directory is missing.
pub const EXIT_INCOMPLETE: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "bootstrap-init", version)]
#[command(about = "Provision the runtime layout (logs, storage, config) and start the application")]
pub struct Cli {
    /// Log output format [env: BOOTSTRAP_LOG_FORMAT]
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision the layout, then replace this process with the entry point
    Run(RunArgs),

    /// Provision the layout and exit
    Provision(ReportArgs),

    /// Report the layout state without changing anything
    Check(ReportArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// Working root [env: BOOTSTRAP_ROOT] [default: current directory]
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// YAML config file [env: BOOTSTRAP_CONFIG]
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    fn load(&self, entrypoint: Option<EntryPoint>) -> Result<BootstrapConfig> {
        let overrides = BootstrapConfig {
            root: self.root.clone(),
            entrypoint,
        };
        BootstrapConfig::load(self.config.as_deref(), overrides)
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Entry point and its fixed arguments [env: BOOTSTRAP_ENTRYPOINT]
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute a parsed command line.
///
/// Returns the process exit status. A successful `run` never returns.
pub fn execute(cli: &Cli, out: &mut impl Write) -> Result<i32> {
    match &cli.command {
        Command::Run(args) => {
            let never = run(args)?;
            match never {}
        }
        Command::Provision(args) => provision(args, out),
        Command::Check(args) => check(args, out),
    }
}

fn run(args: &RunArgs) -> Result<std::convert::Infallible> {
    let entrypoint = if args.command.is_empty() {
        None
    } else {
        Some(EntryPoint::from_argv(&args.command)?)
    };
    let config = args.common.load(entrypoint)?;
    // Resolve everything before touching the filesystem.
    let entrypoint = config.require_entrypoint()?;
    let root = config.root_or_current()?;

    Provisioner::new(&root).provision()?;

    handoff::hand_off(entrypoint, &root)
}

fn provision(args: &ReportArgs, out: &mut impl Write) -> Result<i32> {
    let root = args.common.load(None)?.root_or_current()?;
    let report = Provisioner::new(root).provision()?;
    write_report(&report, args.json, out)?;
    Ok(0)
}

fn check(args: &ReportArgs, out: &mut impl Write) -> Result<i32> {
    let root = args.common.load(None)?.root_or_current()?;
    let report = Provisioner::new(root).inspect()?;
    write_report(&report, args.json, out)?;

    if report.is_blocked() {
        tracing::error!("Runtime layout has a required path that is not a writable directory");
        Ok(bootstrap_core::error::EXIT_CANT_CREATE)
    } else if !report.is_complete() {
        tracing::warn!("Runtime layout is incomplete");
        Ok(EXIT_INCOMPLETE)
    } else {
        Ok(0)
    }
}

fn write_report(report: &ProvisionReport, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        out.flush()?;
        return Ok(());
    }

    for entry in &report.entries {
        writeln!(out, "{:<12} {}", entry.state.to_string(), entry.path.display())?;
    }
    out.flush()?;
    Ok(())
}
