use serde::Serialize;

use quiz_core::model::{GameResult, Question};

use super::progress::SessionProgress;

/// Push notifications delivered to session subscribers, in production order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// Minimum percent marker; constant for the whole session.
    MinPercent { percent: u8 },
    Progress(SessionProgress),
    Question(Question),
    Tick {
        remaining_millis: u64,
        formatted: String,
    },
    /// Fired once, when the session finishes.
    Finished(GameResult),
}

impl SessionEvent {
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::MinPercent { .. } => "min-percent",
            SessionEvent::Progress(_) => "progress",
            SessionEvent::Question(_) => "question",
            SessionEvent::Tick { .. } => "tick",
            SessionEvent::Finished(_) => "finished",
        }
    }
}
