use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use colored::*;
use sweepr_common::logging::{PRINT_TARGET, SUCCESS_TARGET};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::IndicatifFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt as tracing_fmt};

type Paint = fn(ColoredString) -> ColoredString;

/// Renders events as `[+] message` lines, or verbatim for the print target.
///
/// The plain variant drops every colour, for log files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweeprFormatter {
    plain: bool,
}

impl SweeprFormatter {
    pub fn plain() -> Self {
        Self { plain: true }
    }
}

impl<S, N> FormatEvent<S, N> for SweeprFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta: &Metadata<'_> = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        if meta.target() == PRINT_TARGET {
            let raw: String = fields.raw_msg.unwrap_or_default();
            return match self.plain {
                true => writeln!(writer, "{}", console::strip_ansi_codes(&raw)),
                false => writeln!(writer, "{raw}"),
            };
        }

        let (symbol, paint) = symbol(meta.target(), meta.level());
        match self.plain {
            true => writeln!(
                writer,
                "{symbol} {}",
                console::strip_ansi_codes(&fields.message)
            ),
            false => writeln!(writer, "{} {}", paint(symbol.into()), fields.message),
        }
    }
}

fn symbol(target: &str, level: &Level) -> (&'static str, Paint) {
    if target == SUCCESS_TARGET {
        return ("[+]", |s| s.green().bold());
    }

    match *level {
        Level::TRACE => ("[ ]", |s| s.dimmed()),
        Level::DEBUG => ("[?]", |s| s.blue()),
        Level::INFO => ("[*]", |s| s.cyan().bold()),
        Level::WARN => ("[!]", |s| s.yellow().bold()),
        Level::ERROR => ("[-]", |s| s.red().bold()),
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    raw_msg: Option<String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "raw_msg" => self.raw_msg = Some(value.to_string()),
            "message" => self.message.push_str(value),
            name => {
                let _ = write!(self.message, " {name}={value}");
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                let _ = write!(self.message, "{value:?}");
            }
            name => {
                let _ = write!(self.message, " {name}={value:?}");
            }
        }
    }
}

/// Installs the global subscriber: terminal output routed through the progress
/// bars, plus an optional plain-text log file that receives every finding.
pub fn init(quiet: u8, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_level: &str = match quiet {
        0 | 1 => "info",
        _ => "warn",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let indicatif_layer = IndicatifLayer::new();
    let terminal_layer = tracing_fmt::layer()
        .with_writer(indicatif_layer.get_stderr_writer())
        .event_format(SweeprFormatter::default());

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let layer = tracing_fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .event_format(SweeprFormatter::plain())
                .with_filter(filter_fn(|meta: &Metadata<'_>| meta.target() != PRINT_TARGET));
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(terminal_layer)
        .with(file_layer)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .try_init()
        .context("a global logger is already installed")?;

    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
