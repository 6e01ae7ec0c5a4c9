use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::quiz::SessionToken;

/// Countdown resolution of a quiz question
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);
/// How long answer feedback stays up before the quiz moves on
pub const FEEDBACK_DELAY: Duration = Duration::from_secs(2);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
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

/// Test event source fed from a channel
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => QuizEvent::Tick,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Periodic one-second countdown for the current question
    Countdown,
    /// One-shot move past the feedback phase
    Advance,
}

/// A scheduled callback, tagged with the session that armed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub token: SessionToken,
    pub kind: TimerKind,
    pub due: Instant,
}

/// Pending quiz timers: at most one countdown and one advance
#[derive(Debug, Clone)]
pub struct Scheduler {
    countdown_interval: Duration,
    countdown: Option<Timer>,
    advance: Option<Timer>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(COUNTDOWN_INTERVAL)
    }
}

impl Scheduler {
    pub fn new(countdown_interval: Duration) -> Self {
        Self {
            countdown_interval,
            countdown: None,
            advance: None,
        }
    }

    /// Arm the countdown; its first tick is one interval after `from`
    pub fn start_countdown(&mut self, token: SessionToken, from: Instant) {
        self.countdown = Some(Timer {
            token,
            kind: TimerKind::Countdown,
            due: from + self.countdown_interval,
        });
    }

    pub fn cancel_countdown(&mut self) {
        self.countdown = None;
    }

    pub fn schedule_advance(&mut self, token: SessionToken, due: Instant) {
        self.advance = Some(Timer {
            token,
            kind: TimerKind::Advance,
            due,
        });
    }

    pub fn cancel_all(&mut self) {
        self.countdown = None;
        self.advance = None;
    }

    pub fn is_idle(&self) -> bool {
        self.countdown.is_none() && self.advance.is_none()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.countdown, self.advance]
            .into_iter()
            .flatten()
            .map(|t| t.due)
            .min()
    }

    /// Remove and return the earliest timer due at `now`.
    ///
    /// A fired countdown re-arms itself one interval later.
    pub fn pop_due(&mut self, now: Instant) -> Option<Timer> {
        let countdown_due = self.countdown.filter(|t| t.due <= now);
        let advance_due = self.advance.filter(|t| t.due <= now);

        match (countdown_due, advance_due) {
            (Some(c), Some(a)) if a.due < c.due => {
                self.advance = None;
                Some(a)
            }
            (Some(c), _) => {
                self.countdown = Some(Timer {
                    due: c.due + self.countdown_interval,
                    ..c
                });
                Some(c)
            }
            (None, Some(a)) => {
                self.advance = None;
                Some(a)
            }
            (None, None) => None,
        }
    }
}
