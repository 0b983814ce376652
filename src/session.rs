//! The dangerous writing session: a small state machine driven by two inputs,
//! a 1 Hz tick and document-change notifications, delivered one at a time by
//! the host loop.
//!
//! ```text
//! Active ──inactive ≥ threshold──▶ Warning{n} ──n reaches 0──▶ delete ▶ Stopped
//!   ▲                                  │
//!   └──────────── any edit ────────────┘
//! Active/Warning ──goal / stop / close──▶ Stopped
//! ```

use crate::clock::Clock;
use crate::document::{Document, DocumentError, DocumentId};
use crate::goal::{SessionConfig, SessionGoal, SessionMode};
use crate::word_count::count_words;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Active,
    /// Inactivity threshold crossed; `countdown` seconds until deletion
    Warning { countdown: u32 },
    Stopped,
}

impl SessionState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn warning_countdown(&self) -> Option<u32> {
        match self {
            Self::Warning { countdown } => Some(*countdown),
            _ => None,
        }
    }
}

/// Snapshot taken at start plus the last-activity timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRuntime {
    pub start_millis: i64,
    pub start_word_count: usize,
    /// Characters present before the session; only text past this offset
    /// is ever deleted. Never revised after start.
    pub start_text_len: usize,
    pub last_activity_millis: i64,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Time elapsed (timer mode) or enough words written (word-count mode)
    GoalReached,
    ExplicitStop,
    /// The bound document went away
    DocumentClosed,
    DeletedSessionText { removed_chars: usize },
    /// Countdown expired but the document had not grown
    EndedNoNewText,
    /// Countdown expired and the host refused the delete
    DeletionFailed { error: DocumentError },
}

/// Everything the presentation layer needs for one redraw.
///
/// All numbers are derived by the session; presenters only format them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFrame {
    pub mode: SessionMode,
    pub state: SessionState,
    /// Seconds remaining in timer mode, seconds elapsed in word-count mode
    pub time_secs: u64,
    /// Word-count mode only; 0 in timer mode
    pub words_remaining: u64,
    /// Total words in timer mode, words written this session in word-count mode
    pub words: u64,
    pub warning_countdown: Option<u32>,
}

/// Renders session status somewhere the writer can see it
pub trait Presenter {
    fn render(&mut self, frame: &StatusFrame);
    fn dispose(&mut self);
}

pub struct Session<C: Clock, P: Presenter> {
    config: SessionConfig,
    runtime: SessionRuntime,
    state: SessionState,
    document: DocumentId,
    clock: C,
    presenter: P,
}

impl<C: Clock, P: Presenter> Session<C, P> {
    /// Bind to `document` and begin. Renders once before returning.
    pub fn start(config: SessionConfig, document: &dyn Document, clock: C, presenter: P) -> Self {
        let now = clock.now_millis();
        let runtime = SessionRuntime {
            start_millis: now,
            start_word_count: count_words(document.text()),
            start_text_len: document.char_len(),
            last_activity_millis: now,
        };
        tracing::info!(
            mode = %config.mode(),
            goal = %config.goal.label(),
            inactivity_threshold = config.inactivity_threshold_secs,
            delete_countdown = config.delete_countdown_secs,
            start_text_len = runtime.start_text_len,
            start_word_count = runtime.start_word_count,
            "session started"
        );

        let mut session = Self {
            config,
            runtime,
            state: SessionState::Active,
            document: document.id(),
            clock,
            presenter,
        };
        session.render(document);
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn runtime(&self) -> &SessionRuntime {
        &self.runtime
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn document_id(&self) -> DocumentId {
        self.document
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    pub fn words_written(&self, document: &dyn Document) -> usize {
        count_words(document.text()).saturating_sub(self.runtime.start_word_count)
    }

    /// Handle a change notification. Changes to other documents are ignored.
    pub fn on_document_change(
        &mut self,
        changed: DocumentId,
        document: &dyn Document,
    ) -> Option<SessionOutcome> {
        if self.is_stopped() || changed != self.document {
            return None;
        }

        self.runtime.last_activity_millis = self.clock.now_millis();

        if let SessionState::Warning { countdown } = self.state {
            self.state = SessionState::Active;
            tracing::debug!(countdown, state = %self.state, "activity cancelled warning");
        }

        if let SessionGoal::WordCount { words } = self.config.goal {
            if self.words_written(document) >= words {
                return Some(self.finish(SessionOutcome::GoalReached));
            }
        }

        self.render(document);
        None
    }

    /// Advance one second.
    pub fn on_tick(&mut self, document: &mut dyn Document) -> Option<SessionOutcome> {
        if self.is_stopped() {
            return None;
        }
        if document.id() != self.document {
            tracing::warn!("tick delivered with a document this session is not bound to");
            return None;
        }

        let now = self.clock.now_millis();
        let inactive_secs = whole_secs(now - self.runtime.last_activity_millis);

        if inactive_secs >= u64::from(self.config.inactivity_threshold_secs) {
            match self.state {
                SessionState::Warning { countdown } => {
                    let countdown = countdown.saturating_sub(1);
                    if countdown == 0 {
                        return Some(self.delete_session_text(document));
                    }
                    self.state = SessionState::Warning { countdown };
                }
                _ => {
                    self.state = SessionState::Warning {
                        countdown: self.config.delete_countdown_secs,
                    };
                    tracing::debug!(inactive_secs, state = %self.state, "entering warning");
                }
            }
        }

        if let SessionGoal::Timer { minutes } = self.config.goal {
            let elapsed_secs = whole_secs(now - self.runtime.start_millis);
            if elapsed_secs as f64 >= minutes * 60.0 {
                return Some(self.finish(SessionOutcome::GoalReached));
            }
        }

        self.render(document);
        None
    }

    /// End the session at the writer's request. Only the first call has any
    /// effect.
    pub fn stop(&mut self) -> Option<SessionOutcome> {
        if self.is_stopped() {
            return None;
        }
        Some(self.finish(SessionOutcome::ExplicitStop))
    }

    /// The host closed a document; ends the session if it was ours.
    pub fn on_document_closed(&mut self, closed: DocumentId) -> Option<SessionOutcome> {
        if self.is_stopped() || closed != self.document {
            return None;
        }
        Some(self.finish(SessionOutcome::DocumentClosed))
    }

    fn delete_session_text(&mut self, document: &mut dyn Document) -> SessionOutcome {
        // No tick or edit may run a transition while the delete is in flight.
        self.state = SessionState::Stopped;

        let start = self.runtime.start_text_len;
        let current = document.char_len();
        let outcome = if current > start {
            match document.delete_range(start..current) {
                Ok(()) => SessionOutcome::DeletedSessionText {
                    removed_chars: current - start,
                },
                Err(error) => {
                    tracing::error!(%error, start, end = current, "failed to delete session text");
                    SessionOutcome::DeletionFailed { error }
                }
            }
        } else {
            SessionOutcome::EndedNoNewText
        };

        self.finish(outcome)
    }

    fn finish(&mut self, outcome: SessionOutcome) -> SessionOutcome {
        self.state = SessionState::Stopped;
        self.presenter.dispose();
        tracing::info!(?outcome, "session ended");
        outcome
    }

    fn render(&mut self, document: &dyn Document) {
        let frame = self.status_frame(document);
        self.presenter.render(&frame);
    }

    fn status_frame(&self, document: &dyn Document) -> StatusFrame {
        let now = self.clock.now_millis();
        let elapsed_secs = whole_secs(now - self.runtime.start_millis);
        let current_words = count_words(document.text());

        let (time_secs, words_remaining, words) = match self.config.goal {
            SessionGoal::Timer { minutes } => {
                let target_secs = (minutes * 60.0).ceil() as u64;
                (
                    target_secs.saturating_sub(elapsed_secs),
                    0,
                    current_words as u64,
                )
            }
            SessionGoal::WordCount { words: target } => {
                let written = current_words.saturating_sub(self.runtime.start_word_count);
                (
                    elapsed_secs,
                    target.saturating_sub(written) as u64,
                    written as u64,
                )
            }
        };

        StatusFrame {
            mode: self.config.mode(),
            state: self.state,
            time_secs,
            words_remaining,
            words,
            warning_countdown: self.state.warning_countdown(),
        }
    }
}

/// Whole seconds in a millisecond span, clamped at zero for clock skew.
fn whole_secs(millis: i64) -> u64 {
    (millis.max(0) / 1000) as u64
}
