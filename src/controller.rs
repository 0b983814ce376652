use std::fmt;

use thiserror::Error;

use crate::clock::Clock;
use crate::config::Config;
use crate::document::{Document, DocumentId};
use crate::goal::{ConfigError, SessionConfig, SessionGoal};
use crate::session::{Presenter, Session, SessionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A one-line message for the writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Message for a session that ended on its own. Reaching the goal is
    /// deliberately silent.
    pub fn for_outcome(outcome: &SessionOutcome) -> Option<Self> {
        match outcome {
            SessionOutcome::DeletedSessionText { .. } => Some(Self::error(
                "Your session text has been deleted. You stopped typing!",
            )),
            SessionOutcome::EndedNoNewText => {
                Some(Self::error("Session ended - no new text was written."))
            }
            SessionOutcome::DeletionFailed { error } => Some(Self::error(format!(
                "Session ended, but your text could not be deleted: {error}"
            ))),
            SessionOutcome::ExplicitStop => Some(Self::info("Dangerous writing session stopped.")),
            SessionOutcome::GoalReached | SessionOutcome::DocumentClosed => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StartError {
    #[error("No active text editor. Open a file first.")]
    NoDocument,

    #[error("A session is already active. Stop it and start a new one?")]
    AlreadyActive,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Owns the one running session, if any.
pub struct SessionController<C: Clock, P: Presenter> {
    settings: Config,
    active: Option<Session<C, P>>,
}

impl<C: Clock, P: Presenter> SessionController<C, P> {
    pub fn new(settings: Config) -> Self {
        Self {
            settings,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&Session<C, P>> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a session on `document`.
    ///
    /// A running session is only replaced when `replace` is set; otherwise
    /// the caller gets `AlreadyActive` and should ask the writer first.
    pub fn start(
        &mut self,
        goal: SessionGoal,
        document: Option<&dyn Document>,
        clock: C,
        presenter: P,
        replace: bool,
    ) -> Result<Notice, StartError> {
        let document = document.ok_or(StartError::NoDocument)?;
        if self.active.is_some() && !replace {
            return Err(StartError::AlreadyActive);
        }
        let config = SessionConfig::new(goal, &self.settings)?;

        if let Some(mut previous) = self.active.take() {
            previous.stop();
        }
        self.active = Some(Session::start(config, document, clock, presenter));

        Ok(Notice::info(format!(
            "Dangerous writing session started! {} goal. Keep typing or lose everything!",
            goal.label()
        )))
    }

    pub fn stop(&mut self) -> Notice {
        match self.active.take() {
            Some(mut session) => session
                .stop()
                .and_then(|outcome| Notice::for_outcome(&outcome))
                .unwrap_or_else(|| Notice::info("Dangerous writing session stopped.")),
            None => Notice::info("No active session to stop."),
        }
    }

    pub fn on_tick(&mut self, document: &mut dyn Document) -> Option<SessionOutcome> {
        let outcome = self.active.as_mut()?.on_tick(document);
        self.settle(outcome)
    }

    pub fn on_document_change(
        &mut self,
        changed: DocumentId,
        document: &dyn Document,
    ) -> Option<SessionOutcome> {
        let outcome = self.active.as_mut()?.on_document_change(changed, document);
        self.settle(outcome)
    }

    pub fn on_document_closed(&mut self, closed: DocumentId) -> Option<SessionOutcome> {
        let outcome = self.active.as_mut()?.on_document_closed(closed);
        self.settle(outcome)
    }

    /// Stop whatever is running without producing a message.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.active.take() {
            session.stop();
        }
    }

    fn settle(&mut self, outcome: Option<SessionOutcome>) -> Option<SessionOutcome> {
        if outcome.is_some() {
            self.active = None;
        }
        outcome
    }
}
