use thiserror::Error;

use crate::config::Config;

pub const MAX_TIMER_MINUTES: f64 = 180.0;
pub const MAX_WORD_TARGET: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("please enter a positive number")]
    NotPositive,

    #[error("maximum is {max}")]
    TooLarge { max: String },

    #[error("{field} must be at least 1 second")]
    ZeroSeconds { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionMode {
    Timer,
    WordCount,
}

/// What finishing a session means
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionGoal {
    /// Keep writing for this many minutes
    Timer { minutes: f64 },
    /// Write this many new words
    WordCount { words: usize },
}

impl SessionGoal {
    pub fn timer(minutes: f64) -> Result<Self, ConfigError> {
        if !minutes.is_finite() {
            return Err(ConfigError::NotANumber(minutes.to_string()));
        }
        if minutes <= 0.0 {
            return Err(ConfigError::NotPositive);
        }
        if minutes > MAX_TIMER_MINUTES {
            return Err(ConfigError::TooLarge {
                max: "180 minutes (3 hours)".to_string(),
            });
        }
        Ok(Self::Timer { minutes })
    }

    pub fn word_count(words: usize) -> Result<Self, ConfigError> {
        if words == 0 {
            return Err(ConfigError::NotPositive);
        }
        if words > MAX_WORD_TARGET {
            return Err(ConfigError::TooLarge {
                max: "10,000 words".to_string(),
            });
        }
        Ok(Self::WordCount { words })
    }

    pub fn mode(&self) -> SessionMode {
        match self {
            Self::Timer { .. } => SessionMode::Timer,
            Self::WordCount { .. } => SessionMode::WordCount,
        }
    }

    /// Short label used in the "session started" message, e.g. "5 minute".
    pub fn label(&self) -> String {
        match self {
            Self::Timer { minutes } => format!("{minutes} minute"),
            Self::WordCount { words } => format!("{words} word"),
        }
    }
}

/// Parse a timer length in minutes. Decimals are accepted.
pub fn parse_minutes(input: &str) -> Result<SessionGoal, ConfigError> {
    let trimmed = input.trim();
    let minutes = trimmed
        .parse::<f64>()
        .map_err(|_| ConfigError::NotANumber(trimmed.to_string()))?;
    SessionGoal::timer(minutes)
}

/// Parse a whole-number word target.
pub fn parse_word_target(input: &str) -> Result<SessionGoal, ConfigError> {
    let trimmed = input.trim();
    let words = trimmed
        .parse::<i64>()
        .map_err(|_| ConfigError::NotANumber(trimmed.to_string()))?;
    if words <= 0 {
        return Err(ConfigError::NotPositive);
    }
    let words = usize::try_from(words).map_err(|_| ConfigError::TooLarge {
        max: "10,000 words".to_string(),
    })?;
    SessionGoal::word_count(words)
}

/// Settings fixed for the lifetime of one session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub goal: SessionGoal,
    pub inactivity_threshold_secs: u32,
    pub delete_countdown_secs: u32,
}

impl SessionConfig {
    pub fn new(goal: SessionGoal, settings: &Config) -> Result<Self, ConfigError> {
        if settings.inactivity_threshold == 0 {
            return Err(ConfigError::ZeroSeconds {
                field: "inactivity threshold",
            });
        }
        if settings.delete_countdown == 0 {
            return Err(ConfigError::ZeroSeconds {
                field: "delete countdown",
            });
        }
        Ok(Self {
            goal,
            inactivity_threshold_secs: settings.inactivity_threshold,
            delete_countdown_secs: settings.delete_countdown,
        })
    }

    pub fn mode(&self) -> SessionMode {
        self.goal.mode()
    }
}
