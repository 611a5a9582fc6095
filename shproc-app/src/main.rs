use anyhow::Context;
use clap::Parser;
use shproc::{Interp, ShellConfig};
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// A line-oriented shell with recordable procedures and for loops.
#[derive(Debug, Parser)]
#[command(name = "shprocsh", version, about)]
struct Cli {
    /// Script to run; starts an interactive session when omitted
    script: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Maximum depth of nested procedure calls
    #[arg(long, value_name = "DEPTH")]
    recursion_limit: Option<usize>,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_env("SHPROC_LOG")
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("shprocsh started with verbosity level: {}", cli.verbose);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut config = ShellConfig::default();
    if let Some(limit) = cli.recursion_limit {
        config = config.with_recursion_limit(limit);
    }
    let mut interp = Interp::with_config(config);

    match &cli.script {
        Some(path) => shproc_shell::script(&mut interp, path, &mut io::stdout().lock())
            .context("script failed")?,
        None => shproc_shell::repl(&mut interp).context("line editor failed")?,
    }

    Ok(())
}
