use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::assistant::Reply;
use crate::tutor::TutorError;

/// Unified event type consumed by the app runner
#[derive(Debug)]
pub enum CoachEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Reply(Result<Reply, TutorError>),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait CoachEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<CoachEvent, RecvTimeoutError>;

    /// Handle for posting events from worker threads into the same queue.
    fn sender(&self) -> Sender<CoachEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<CoachEvent>,
    rx: Receiver<CoachEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            let sent = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    reader_tx.send(CoachEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => reader_tx.send(CoachEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("terminal event read failed: {}", e);
                    break;
                }
            };
            if sent.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CoachEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<CoachEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-backed event source for tests
pub struct TestEventSource {
    tx: Sender<CoachEvent>,
    rx: Receiver<CoachEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CoachEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<CoachEvent> {
        self.tx.clone()
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: CoachEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: CoachEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn sender(&self) -> Sender<CoachEvent> {
        self.event_source.sender()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> CoachEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                CoachEvent::Tick
            }
        }
    }
}
