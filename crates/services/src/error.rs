//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::SettingsNotFound;
use quiz_core::model::{GameResultError, GameSettingsError, Level, QuestionError};

use crate::session::SessionState;

/// Errors emitted by `GameSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no settings configured for level {0}")]
    SettingsNotFound(Level),
    #[error("cannot {operation} while session is {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: SessionState,
    },
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] GameSettingsError),
    #[error(transparent)]
    Result(#[from] GameResultError),
}

impl From<SettingsNotFound> for SessionError {
    fn from(err: SettingsNotFound) -> Self {
        Self::SettingsNotFound(err.0)
    }
}
