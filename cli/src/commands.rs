pub mod resolve;
pub mod strategies;

use clap::{Args, Parser, Subcommand};
use lanprobe_core::StrategyKind;

#[derive(Parser)]
#[command(name = "lanprobe")]
#[command(about = "Finds which candidate hostnames resolve on the local network.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output (-q drops headers, -qq prints bare hostnames)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe candidate hostnames and rank the ones that resolve
    #[command(alias = "r")]
    Resolve(ResolveArgs),
    /// List the probe strategies and whether this host supports them
    #[command(alias = "s")]
    Strategies,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Hostnames to probe, optionally as `label=hostname`
    pub hostnames: Vec<String>,

    /// Read candidates from a file, one `hostname` or `label=hostname` per line
    #[arg(short, long)]
    pub file: Option<std::path::PathBuf>,

    /// Hostname pattern, `<name>` is replaced by every --name (repeatable)
    #[arg(short, long = "pattern")]
    pub patterns: Vec<String>,

    /// Name to expand patterns with (repeatable)
    #[arg(short, long = "name")]
    pub names: Vec<String>,

    /// Probe strategy: fetch, frame or topology
    #[arg(short, long, default_value = "fetch")]
    pub strategy: StrategyKind,

    #[command(flatten)]
    pub tuning: Tuning,
}

/// Overrides for the selected strategy's defaults.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct Tuning {
    /// Maximum probes in flight (also the batch size)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Bound on one timing sample, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Confirmation samples must land under this, in milliseconds
    #[arg(long)]
    pub threshold_ms: Option<u64>,

    /// Pause between waves, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
