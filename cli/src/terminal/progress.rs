use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::*;
use indicatif::ProgressStyle;
use sweepr_core::scanner::{EventHook, ScanEvent};
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const BAR_TEMPLATE: &str =
    "{spinner:.blue} {span_name} [{bar:32.green/bright_black}] {pos}/{len} {msg} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.blue} {span_name} {msg}";
const TICKS: &[&str] = &[
    "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
];

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
}

/// Bar counting finished connect attempts, with the open-port count as message.
pub fn scan_span(total: u64) -> (Span, EventHook) {
    let span = info_span!("scanning", indicatif.pb_show = true);
    span.pb_set_style(&style(BAR_TEMPLATE));
    span.pb_set_length(total);

    let open = Arc::new(AtomicUsize::new(0));
    let bar = span.clone();
    let hook: EventHook = Arc::new(move |event: ScanEvent| match event {
        ScanEvent::Attempted(_) => bar.pb_inc(1),
        ScanEvent::Open(_) => {
            let count = open.fetch_add(1, Ordering::Relaxed) + 1;
            bar.pb_set_message(&format!("{} open", count.to_string().green().bold()));
        }
        ScanEvent::Alive(..) => {}
    });

    (span, hook)
}

/// Spinner for the liveness pass, with the alive-host count as message.
pub fn liveness_span(total: usize) -> (Span, EventHook) {
    let span = info_span!("liveness", indicatif.pb_show = true);
    span.pb_set_style(&style(SPINNER_TEMPLATE));
    span.pb_set_message(&format!("probing {total} hosts"));

    let alive = Arc::new(AtomicUsize::new(0));
    let bar = span.clone();
    let hook: EventHook = Arc::new(move |event: ScanEvent| {
        if let ScanEvent::Alive(..) = event {
            let count = alive.fetch_add(1, Ordering::Relaxed) + 1;
            bar.pb_set_message(&format!(
                "{} of {total} hosts alive",
                count.to_string().green().bold()
            ));
        }
    });

    (span, hook)
}

pub fn fingerprint_span(hosts: usize) -> Span {
    let span = info_span!("fingerprinting", indicatif.pb_show = true);
    span.pb_set_style(&style(SPINNER_TEMPLATE));
    span.pb_set_message(&format!("identifying services on {hosts} hosts"));
    span
}
