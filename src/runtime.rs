use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Session ticks happen once per second.
pub const SESSION_TICK: Duration = Duration::from_secs(1);

/// Unified event type consumed by the editor loop
#[derive(Clone, Debug)]
pub enum EditorEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block until an event arrives or the source is closed.
    fn recv(&self) -> Result<EditorEvent, RecvError>;

    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<EditorEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<EditorEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // Windows reports releases too; only presses are edits.
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(EditorEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(EditorEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(%err, "terminal event reader stopped");
                    break;
                }
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

impl EventSource for CrosstermEventSource {
    fn recv(&self) -> Result<EditorEvent, RecvError> {
        self.rx.recv()
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<EditorEvent, RecvTimeoutError> {
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

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(SESSION_TICK)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<EditorEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<EditorEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv(&self) -> Result<EditorEvent, RecvError> {
        self.rx.recv()
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<EditorEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Single consumer that merges input events with the session clock.
///
/// Every event the editor handles comes out of `step`, one at a time, so a
/// tick can never run in the middle of an edit. The clock is armed per
/// session; while disarmed no `Tick` is ever produced.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Option<Instant>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            next_tick: None,
        }
    }

    /// Arm the clock; the first tick fires one interval from now.
    pub fn start_ticking(&mut self) {
        self.next_tick = Some(Instant::now() + self.ticker.interval());
    }

    /// Disarm the clock. No `Tick` is returned after this call.
    pub fn stop_ticking(&mut self) {
        self.next_tick = None;
    }

    pub fn is_ticking(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Block until the next input event or tick deadline.
    ///
    /// Returns `None` once the event source is closed and the clock is
    /// disarmed, since nothing further can happen.
    pub fn step(&mut self) -> Option<EditorEvent> {
        let Some(deadline) = self.next_tick else {
            return self.event_source.recv().ok();
        };

        let now = Instant::now();
        if now >= deadline {
            return Some(self.fire_tick(deadline, now));
        }

        match self.event_source.recv_timeout(deadline - now) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => Some(self.fire_tick(deadline, Instant::now())),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                Some(self.fire_tick(deadline, Instant::now()))
            }
        }
    }

    fn fire_tick(&mut self, deadline: Instant, now: Instant) -> EditorEvent {
        let interval = self.ticker.interval();
        let mut next = deadline + interval;
        // Skip missed ticks instead of bursting to catch up.
        if next <= now {
            next = now + interval;
        }
        self.next_tick = Some(next);
        EditorEvent::Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);
        runner.start_ticking();

        match runner.step() {
            Some(EditorEvent::Tick) => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(EditorEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_secs(10));
        let mut runner = Runner::new(es, ticker);
        runner.start_ticking();

        match runner.step() {
            Some(EditorEvent::Resize) => {}
            other => panic!("expected Resize event, got {other:?}"),
        }
    }

    #[test]
    fn disarmed_runner_never_ticks() {
        let (tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);
        runner.start_ticking();
        runner.stop_ticking();
        assert!(!runner.is_ticking());

        tx.send(EditorEvent::Key(KeyEvent::new(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
        )))
        .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert!(matches!(runner.step(), Some(EditorEvent::Key(_))));
        drop(tx);
        assert!(runner.step().is_none());
    }

    #[test]
    fn keystrokes_do_not_push_back_the_tick() {
        let (tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(30));
        let mut runner = Runner::new(es, ticker);
        runner.start_ticking();

        let producer = std::thread::spawn(move || {
            for _ in 0..20 {
                if tx.send(EditorEvent::Resize).is_err() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        });

        let started = Instant::now();
        let mut saw_tick = false;
        while started.elapsed() < Duration::from_millis(500) {
            if let Some(EditorEvent::Tick) = runner.step() {
                saw_tick = true;
                break;
            }
        }
        producer.join().unwrap();
        assert!(saw_tick, "tick should fire on schedule despite a steady event stream");
    }

    #[test]
    fn closed_source_still_ticks_while_armed() {
        let (tx, rx) = mpsc::channel::<EditorEvent>();
        drop(tx);
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(2)),
        );
        runner.start_ticking();
        assert!(matches!(runner.step(), Some(EditorEvent::Tick)));
    }
}
