use std::path::PathBuf;

use clap::Parser;
use logswap::{Mode, Preset};

/// Logswap moves console output calls in a TypeScript source tree to the project logger.
#[derive(Debug, Parser, Clone)]
#[clap(version)]
pub struct CLIOpts {
    /// Raise the log level (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Parser, Clone)]
pub enum Command {
    /// Replace console calls with logger calls, importing the logger where needed.
    #[clap(name = "migrate")]
    Migrate(RunOpts),
    /// Import the logger in files that call it without importing it.
    #[clap(name = "fix-imports")]
    FixImports(RunOpts),
}

#[derive(Debug, Parser, Clone)]
pub struct RunOpts {
    /// Source root to scan recursively.
    #[clap(env = "LOGSWAP_ROOT")]
    pub root: PathBuf,
    /// Built-in settings to start from: `frontend` or `backend`.
    #[clap(long, default_value = "frontend")]
    pub preset: Preset,
    /// TOML file overriding the preset's settings.
    #[clap(long, env = "LOGSWAP_CONFIG")]
    pub config: Option<PathBuf>,
    /// Report the files that would change without writing them.
    #[clap(long)]
    pub dry_run: bool,
}

mod logging;
mod transform;

fn main() -> anyhow::Result<()> {
    let opts = CLIOpts::parse();
    logging::init(opts.verbose);

    match opts.command {
        Command::Migrate(opts) => transform::run(&opts, Mode::Migrate),
        Command::FixImports(opts) => transform::run(&opts, Mode::RepairImports),
    }
}
