pub mod expand;
pub mod scan;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sweepr_common::config::{
    Config, DEFAULT_LIVENESS_POOL, DEFAULT_THREADS, OutputFormat, ParseMode,
};
use sweepr_common::network::ports::{self, PortSet};
use sweepr_common::network::target::{self, HostSet};

const DEFAULT_LOG_FILE: &str = "result.txt";

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(version, about = "A concurrent TCP port scanner.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Less output; repeat for even less
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan hosts for open TCP ports
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Show what a target and port specification expand to
    #[command(alias = "e")]
    Expand(TargetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Addresses: 10.0.0.1, 10.0.0.1,10.0.0.7, 10.0.0.0/24 or 10.0.0.10-20
    #[arg(short, long, value_name = "SPEC", required_unless_present = "list", conflicts_with = "list")]
    pub ip: Option<String>,

    /// File with one address specification per line
    #[arg(short, long, value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Ports: 80, 22,80,443, 1-1024, top100 or top1000
    #[arg(short, long, value_name = "SPEC", default_value = "top1000")]
    pub ports: String,

    /// Reject the whole specification on the first invalid address
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Simultaneous connect attempts
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_THREADS, value_parser = positive)]
    pub threads: usize,

    /// Only scan hosts that answer ICMP echo or a common port
    #[arg(long)]
    pub alive: bool,

    /// Simultaneous hosts probed by --alive
    #[arg(long, value_name = "N", default_value_t = DEFAULT_LIVENESS_POOL, value_parser = positive)]
    pub alive_pool: usize,

    /// Skip service fingerprinting
    #[arg(long)]
    pub no_fingerprint: bool,

    /// Path to the nmap binary used for fingerprinting
    #[arg(long, value_name = "PATH")]
    pub nmap: Option<PathBuf>,

    /// Directory the result file is written to
    #[arg(short, long, value_name = "DIR", default_value = "result")]
    pub output_dir: PathBuf,

    /// Result file format (csv or json)
    #[arg(long, value_name = "FORMAT", default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Append progress lines to this file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Do not keep a log file
    #[arg(long)]
    pub no_log_file: bool,

    /// Stop scheduling probes after this many seconds
    #[arg(long, value_name = "SECS", value_parser = positive)]
    pub deadline: Option<usize>,

    /// Do not listen for 'q' to stop early
    #[arg(long)]
    pub no_input: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl TargetArgs {
    pub fn mode(&self) -> ParseMode {
        match self.strict {
            true => ParseMode::Strict,
            false => ParseMode::Lenient,
        }
    }

    /// Expands ports first so a bad port spec fails before any file is read.
    pub fn resolve(&self, mode: ParseMode) -> anyhow::Result<(HostSet, PortSet)> {
        ports::validate(&self.ports)?;
        let port_set: PortSet = ports::expand(&self.ports)?;

        let hosts: HostSet = match (&self.ip, &self.list) {
            (Some(spec), _) => target::expand(spec, mode)?,
            (None, Some(path)) => HostSet::from_file(path, mode)?,
            (None, None) => anyhow::bail!("no targets given, use --ip or --list"),
        };

        Ok((hosts, port_set))
    }
}

impl ScanArgs {
    pub fn log_file(&self) -> Option<PathBuf> {
        (!self.no_log_file).then(|| self.log_file.clone())
    }

    pub fn to_config(&self, quiet: u8) -> Config {
        Config {
            threads: self.threads,
            liveness_pool: self.alive_pool,
            address_mode: self.target.mode(),
            alive_check: self.alive,
            fingerprint: !self.no_fingerprint,
            nmap_path: self.nmap.clone(),
            output_dir: self.output_dir.clone(),
            format: self.format,
            deadline: self.deadline.map(|secs| Duration::from_secs(secs as u64)),
            quiet,
            disable_input: self.no_input,
        }
    }
}

fn positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("'{s}' is not a number")),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
