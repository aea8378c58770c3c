use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::score::percent_of;
use crate::model::{GameSettings, Level, ScoreTracker};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameResultError {
    #[error("finished_at is before started_at")]
    InvalidTimeRange,
}

/// Terminal artifact of a session, built exactly once when it finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    won: bool,
    correct_count: u32,
    total_count: u32,
    settings: GameSettings,
    level: Level,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl GameResult {
    /// Evaluate the final score against the session's thresholds.
    ///
    /// A session is won only when both the count and the percent thresholds
    /// are met.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError::InvalidTimeRange` if `finished_at` is before `started_at`.
    pub fn evaluate(
        level: Level,
        settings: GameSettings,
        score: &ScoreTracker,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<Self, GameResultError> {
        if finished_at < started_at {
            return Err(GameResultError::InvalidTimeRange);
        }
        let won = score.meets_count_threshold(settings.min_count_right_answers())
            && score.meets_percent_threshold(settings.min_percent_right_answers());

        Ok(Self {
            won,
            correct_count: score.correct_count(),
            total_count: score.total_count(),
            settings,
            level,
            started_at,
            finished_at,
        })
    }

    #[must_use]
    pub fn won(&self) -> bool {
        self.won
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Achieved percentage of right answers, as shown on the summary screen.
    #[must_use]
    pub fn percent_correct(&self) -> u8 {
        percent_of(self.correct_count, self.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn settings() -> GameSettings {
        GameSettings::new(20, 5, 60, 60).unwrap()
    }

    fn score(correct: u32, total: u32) -> ScoreTracker {
        let mut tracker = ScoreTracker::new();
        for idx in 0..total {
            tracker.record_answer(idx < correct);
        }
        tracker
    }

    #[test]
    fn six_of_eight_wins() {
        let now = fixed_now();
        let result =
            GameResult::evaluate(Level::Normal, settings(), &score(6, 8), now, now).unwrap();
        assert!(result.won());
        assert_eq!(result.correct_count(), 6);
        assert_eq!(result.total_count(), 8);
        assert_eq!(result.percent_correct(), 75);
    }

    #[test]
    fn three_of_ten_loses_on_count() {
        let now = fixed_now();
        let result =
            GameResult::evaluate(Level::Normal, settings(), &score(3, 10), now, now).unwrap();
        assert!(!result.won());
    }

    #[test]
    fn enough_count_but_low_percent_loses() {
        let now = fixed_now();
        let result =
            GameResult::evaluate(Level::Normal, settings(), &score(5, 10), now, now).unwrap();
        assert!(!result.won());
    }

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::seconds(1);
        let err = GameResult::evaluate(Level::Easy, settings(), &score(0, 0), now, earlier)
            .unwrap_err();
        assert_eq!(err, GameResultError::InvalidTimeRange);
    }
}
