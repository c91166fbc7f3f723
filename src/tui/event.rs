//! Event handling for the scheduler loop.
//!
//! Terminal input is read on a separate thread and forwarded through an
//! `mpsc` channel; the signal handler sends into the same channel. The loop
//! itself uses `recv_timeout` as its polling timer.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tracing::debug;

const INPUT_POLL: Duration = Duration::from_millis(250);

/// Application events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize (width, height).
    Resize(u16, u16),
    /// Termination signal.
    Shutdown,
}

/// Receiving end of the event channel.
pub struct EventHandler {
    rx: Receiver<Event>,
    tx: Sender<Event>,
}

impl EventHandler {
    /// Creates a handler without any input source.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { rx, tx }
    }

    /// Creates a handler fed by a thread reading crossterm events.
    pub fn with_terminal_input() -> Self {
        let handler = Self::new();
        let event_tx = handler.tx.clone();

        thread::spawn(move || {
            loop {
                if !event::poll(INPUT_POLL).unwrap_or(false) {
                    continue;
                }
                let event = match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "terminal input closed");
                        break;
                    }
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        });

        handler
    }

    /// Another sender into this handler, e.g. for the signal handler.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    /// Turns SIGINT, SIGTERM and SIGHUP into [`Event::Shutdown`] so the
    /// loop can restore instruments and the terminal before exiting.
    /// Succeeds at most once per process.
    pub fn forward_signals(&self) -> Result<(), ctrlc::Error> {
        let tx = self.sender();
        ctrlc::set_handler(move || {
            debug!("termination signal received");
            let _ = tx.send(Event::Shutdown);
        })
    }

    /// Waits up to `timeout` for the next event; `Ok(None)` on timeout.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<Event>, mpsc::RecvError> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(mpsc::RecvError),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
