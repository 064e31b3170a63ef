use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Connect timeout for a single TCP attempt, in both the scanner and the liveness fallback.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Echo requests sent per host during the ICMP liveness phase.
pub const PING_COUNT: u16 = 3;
/// Budget for the whole echo sequence of one host.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_THREADS: usize = 200;
pub const DEFAULT_LIVENESS_POOL: usize = 200;
/// Upper bound for one fingerprinting run against a single host.
pub const FINGERPRINT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Largest address block a single specification may expand to (a /8).
pub const MAX_HOSTS: usize = 1 << 24;

/// How unparseable address literals are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Drop invalid elements and keep going.
    #[default]
    Lenient,
    /// Reject the whole specification on the first invalid element.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected csv or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Runtime settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Simultaneous connect attempts allowed in the port scanner.
    pub threads: usize,
    /// Simultaneous hosts probed by the liveness stage.
    pub liveness_pool: usize,
    /// How malformed address list entries are treated.
    pub address_mode: ParseMode,
    /// Filter targets through the liveness stage before scanning.
    pub alive_check: bool,
    /// Hand open ports to the fingerprinting engine.
    pub fingerprint: bool,
    pub nmap_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Overall budget after which no further probes are scheduled.
    pub deadline: Option<Duration>,
    pub quiet: u8,
    /// Disables the 'q' keyboard listener.
    pub disable_input: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            liveness_pool: DEFAULT_LIVENESS_POOL,
            address_mode: ParseMode::default(),
            alive_check: false,
            fingerprint: true,
            nmap_path: None,
            output_dir: PathBuf::from("result"),
            format: OutputFormat::default(),
            deadline: None,
            quiet: 0,
            disable_input: false,
        }
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
