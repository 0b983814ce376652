use crate::goal::SessionMode;
use crate::session::{Presenter, SessionState, StatusFrame};

/// Format whole seconds as `m:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Status line text for one frame
pub fn format_status(frame: &StatusFrame) -> String {
    if let (SessionState::Warning { .. }, Some(countdown)) = (frame.state, frame.warning_countdown)
    {
        return format!("⚠ KEEP TYPING! {countdown}s...");
    }

    match frame.mode {
        SessionMode::Timer => format!(
            "⏱ {} remaining | {} words",
            format_clock(frame.time_secs),
            frame.words
        ),
        SessionMode::WordCount => format!(
            "✎ {}/{} words | {} elapsed",
            frame.words,
            frame.words + frame.words_remaining,
            format_clock(frame.time_secs)
        ),
    }
}

/// Presenter that keeps the latest status for the editor's bottom line
#[derive(Debug, Default)]
pub struct StatusBar {
    frame: Option<StatusFrame>,
    flash_on: bool,
    disposed: bool,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to show, or `None` once disposed or before the first render
    pub fn text(&self) -> Option<String> {
        if self.disposed {
            return None;
        }
        self.frame.as_ref().map(format_status)
    }

    pub fn is_warning(&self) -> bool {
        !self.disposed
            && self
                .frame
                .is_some_and(|f| matches!(f.state, SessionState::Warning { .. }))
    }

    /// Alternates on every warning render so the bar blinks.
    pub fn flash_on(&self) -> bool {
        self.flash_on
    }

    pub fn tooltip(&self) -> &'static str {
        if self.is_warning() {
            "Your text will be deleted if you stop typing!"
        } else {
            "Esc: stop session"
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Presenter for StatusBar {
    fn render(&mut self, frame: &StatusFrame) {
        if self.disposed {
            return;
        }
        if matches!(frame.state, SessionState::Warning { .. }) {
            self.flash_on = !self.flash_on;
        } else {
            self.flash_on = false;
        }
        self.frame = Some(*frame);
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.flash_on = false;
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(mode: SessionMode, state: SessionState) -> StatusFrame {
        StatusFrame {
            mode,
            state,
            time_secs: 125,
            words_remaining: 40,
            words: 260,
            warning_countdown: state.warning_countdown(),
        }
    }

    #[test]
    fn clock_format_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn timer_status() {
        assert_eq!(
            format_status(&frame(SessionMode::Timer, SessionState::Active)),
            "⏱ 2:05 remaining | 260 words"
        );
    }

    #[test]
    fn word_count_status() {
        assert_eq!(
            format_status(&frame(SessionMode::WordCount, SessionState::Active)),
            "✎ 260/300 words | 2:05 elapsed"
        );
    }

    #[test]
    fn warning_status_overrides_mode() {
        let f = frame(SessionMode::Timer, SessionState::Warning { countdown: 3 });
        assert_eq!(format_status(&f), "⚠ KEEP TYPING! 3s...");
    }

    #[test]
    fn flash_alternates_only_while_warning() {
        let mut bar = StatusBar::new();
        let warning = frame(SessionMode::Timer, SessionState::Warning { countdown: 5 });
        bar.render(&warning);
        assert!(bar.flash_on());
        bar.render(&warning);
        assert!(!bar.flash_on());
        bar.render(&warning);
        assert!(bar.flash_on());
        assert!(bar.is_warning());

        bar.render(&frame(SessionMode::Timer, SessionState::Active));
        assert!(!bar.flash_on());
        assert!(!bar.is_warning());
    }

    #[test]
    fn disposed_bar_shows_nothing() {
        let mut bar = StatusBar::new();
        bar.render(&frame(SessionMode::Timer, SessionState::Active));
        assert!(bar.text().is_some());
        bar.dispose();
        assert!(bar.text().is_none());
        bar.render(&frame(SessionMode::Timer, SessionState::Active));
        assert!(bar.text().is_none());
        assert!(bar.is_disposed());
    }
}
