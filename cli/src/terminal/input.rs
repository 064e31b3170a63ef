use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use sweepr_core::scanner::StopSignal;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Listens for 'q' or Ctrl-C on the terminal and trips the stop signal.
pub struct InputHandle {
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputHandle {
    pub fn start(stop: StopSignal) -> Self {
        let finished = Arc::new(AtomicBool::new(false));
        let done = finished.clone();

        let thread = thread::spawn(move || {
            if let Err(e) = enable_raw_mode() {
                debug!("Keyboard input disabled: {e}");
                return;
            }
            while !done.load(Ordering::Relaxed) {
                if !event::poll(POLL_INTERVAL).unwrap_or(false) {
                    continue;
                }
                if let Ok(Event::Key(key_event)) = event::read() {
                    let is_q = key_event.code == KeyCode::Char('q');
                    let is_ctrl_c = key_event.code == KeyCode::Char('c')
                        && key_event.modifiers.contains(KeyModifiers::CONTROL);

                    if (is_q || is_ctrl_c) && key_event.kind == KeyEventKind::Press {
                        warn!("Stopping early, waiting for probes in flight");
                        stop.stop();
                        break;
                    }
                }
            }
            let _ = disable_raw_mode();
        });

        Self {
            finished,
            thread: Some(thread),
        }
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        let _ = disable_raw_mode();
    }
}
