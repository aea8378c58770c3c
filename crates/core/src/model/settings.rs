use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest sum bound that still leaves room for a visible number and an answer.
pub const MIN_SUM_VALUE: u32 = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameSettingsError {
    #[error("max sum value must be at least {MIN_SUM_VALUE}, got {0}")]
    MaxSumTooSmall(u32),

    #[error("game time must be > 0 seconds")]
    ZeroGameTime,

    #[error("minimum percent must be in [0, 100], got {0}")]
    PercentOutOfRange(u8),
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Rules for a single session: question bounds, win thresholds and duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GameSettingsRecord", rename_all = "camelCase")]
pub struct GameSettings {
    max_sum_value: u32,
    min_count_right_answers: u32,
    min_percent_right_answers: u8,
    game_time_in_seconds: u32,
}

/// Unvalidated wire shape used while deserializing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameSettingsRecord {
    max_sum_value: u32,
    min_count_right_answers: u32,
    min_percent_right_answers: u8,
    game_time_in_seconds: u32,
}

impl TryFrom<GameSettingsRecord> for GameSettings {
    type Error = GameSettingsError;

    fn try_from(record: GameSettingsRecord) -> Result<Self, Self::Error> {
        GameSettings::new(
            record.max_sum_value,
            record.min_count_right_answers,
            record.min_percent_right_answers,
            record.game_time_in_seconds,
        )
    }
}

impl GameSettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns `GameSettingsError::MaxSumTooSmall` if `max_sum_value < 2`.
    /// Returns `GameSettingsError::ZeroGameTime` if `game_time_in_seconds == 0`.
    /// Returns `GameSettingsError::PercentOutOfRange` if the percent exceeds 100.
    pub fn new(
        max_sum_value: u32,
        min_count_right_answers: u32,
        min_percent_right_answers: u8,
        game_time_in_seconds: u32,
    ) -> Result<Self, GameSettingsError> {
        if max_sum_value < MIN_SUM_VALUE {
            return Err(GameSettingsError::MaxSumTooSmall(max_sum_value));
        }
        if game_time_in_seconds == 0 {
            return Err(GameSettingsError::ZeroGameTime);
        }
        if min_percent_right_answers > 100 {
            return Err(GameSettingsError::PercentOutOfRange(
                min_percent_right_answers,
            ));
        }

        Ok(Self {
            max_sum_value,
            min_count_right_answers,
            min_percent_right_answers,
            game_time_in_seconds,
        })
    }

    #[must_use]
    pub fn max_sum_value(&self) -> u32 {
        self.max_sum_value
    }

    #[must_use]
    pub fn min_count_right_answers(&self) -> u32 {
        self.min_count_right_answers
    }

    #[must_use]
    pub fn min_percent_right_answers(&self) -> u8 {
        self.min_percent_right_answers
    }

    #[must_use]
    pub fn game_time_in_seconds(&self) -> u32 {
        self.game_time_in_seconds
    }

    /// Total session duration in milliseconds.
    #[must_use]
    pub fn game_time_millis(&self) -> u64 {
        u64::from(self.game_time_in_seconds) * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_bounds() {
        assert_eq!(
            GameSettings::new(1, 0, 0, 10).unwrap_err(),
            GameSettingsError::MaxSumTooSmall(1)
        );
        assert_eq!(
            GameSettings::new(10, 0, 0, 0).unwrap_err(),
            GameSettingsError::ZeroGameTime
        );
        assert_eq!(
            GameSettings::new(10, 0, 101, 10).unwrap_err(),
            GameSettingsError::PercentOutOfRange(101)
        );
    }

    #[test]
    fn deserializes_camel_case_and_validates() {
        let json = r#"{"maxSumValue":20,"minCountRightAnswers":5,"minPercentRightAnswers":60,"gameTimeInSeconds":60}"#;
        let settings: GameSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.max_sum_value(), 20);
        assert_eq!(settings.game_time_millis(), 60_000);

        let bad = r#"{"maxSumValue":20,"minCountRightAnswers":5,"minPercentRightAnswers":60,"gameTimeInSeconds":0}"#;
        assert!(serde_json::from_str::<GameSettings>(bad).is_err());
    }
}
