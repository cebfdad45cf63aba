//! Cosmetic spinner for slow remote calls.
//!
//! The spinner thread only draws to stderr. It never touches repository
//! state, and dropping the [`Spinner`] stops and joins it.

use std::io::{IsTerminal, Write};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{Sender, bounded, tick};

const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
const TICK: Duration = Duration::from_millis(100);

pub struct Spinner {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning with `label`, but only when stderr is a terminal.
    pub fn start(label: impl Into<String>) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self::disabled();
        }
        Self::spawn(label.into())
    }

    pub fn disabled() -> Self {
        Self {
            stop: None,
            handle: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    fn spawn(label: String) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticker = tick(TICK);
        let spawned = std::thread::Builder::new()
            .name("spinner".into())
            .spawn(move || {
                let mut frame = 0usize;
                loop {
                    crossbeam::select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let mut err = std::io::stderr().lock();
                            let _ = write!(err, "\r{} {label}", FRAMES[frame % FRAMES.len()]);
                            let _ = err.flush();
                            frame += 1;
                        }
                    }
                }
                let mut err = std::io::stderr().lock();
                let _ = write!(err, "\r{}\r", " ".repeat(label.len() + 2));
                let _ = err.flush();
            });

        match spawned {
            Ok(handle) => Self {
                stop: Some(stop_tx),
                handle: Some(handle),
            },
            Err(e) => {
                tracing::debug!(error = %e, "spinner thread unavailable");
                Self::disabled()
            }
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
