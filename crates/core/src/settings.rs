//! Level → settings resolution.
//!
//! Sessions receive a `SettingsLookup` instead of reading a table directly,
//! so the state machine can be driven with any settings in tests.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{GameSettings, GameSettingsError, Level};

/// Returned when a level has no configured settings.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no settings configured for level {0}")]
pub struct SettingsNotFound(pub Level);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LevelTableError {
    #[error("invalid level table: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] GameSettingsError),
}

/// Pure lookup from a level to the rules of a session.
pub trait SettingsLookup: Send + Sync {
    /// # Errors
    ///
    /// Returns `SettingsNotFound` if the level cannot be resolved.
    fn resolve(&self, level: Level) -> Result<GameSettings, SettingsNotFound>;
}

impl<F> SettingsLookup for F
where
    F: Fn(Level) -> Result<GameSettings, SettingsNotFound> + Send + Sync,
{
    fn resolve(&self, level: Level) -> Result<GameSettings, SettingsNotFound> {
        self(level)
    }
}

/// Static keyed table of settings per level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTable {
    entries: BTreeMap<Level, GameSettings>,
}

impl LevelTable {
    /// An empty table; every lookup fails until levels are added.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The stock table shipped with the game.
    ///
    /// # Errors
    ///
    /// Returns `GameSettingsError` only if the built-in values are invalid.
    pub fn standard() -> Result<Self, GameSettingsError> {
        Ok(Self::empty()
            .with_level(Level::Test, GameSettings::new(10, 3, 50, 8)?)
            .with_level(Level::Easy, GameSettings::new(10, 10, 70, 60)?)
            .with_level(Level::Normal, GameSettings::new(20, 20, 80, 40)?)
            .with_level(Level::Hard, GameSettings::new(30, 30, 90, 40)?))
    }

    /// Parse a table from JSON of the form
    /// `{"easy": {"maxSumValue": 10, "minCountRightAnswers": 10, ...}}`.
    ///
    /// # Errors
    ///
    /// Returns `LevelTableError::Json` for malformed documents, unknown level
    /// names, or settings that fail validation.
    pub fn from_json(json: &str) -> Result<Self, LevelTableError> {
        let entries: BTreeMap<Level, GameSettings> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// Insert or override the settings for `level`.
    #[must_use]
    pub fn with_level(mut self, level: Level, settings: GameSettings) -> Self {
        self.entries.insert(level, settings);
        self
    }

    #[must_use]
    pub fn levels(&self) -> Vec<Level> {
        self.entries.keys().copied().collect()
    }
}

impl SettingsLookup for LevelTable {
    fn resolve(&self, level: Level) -> Result<GameSettings, SettingsNotFound> {
        self.entries
            .get(&level)
            .copied()
            .ok_or(SettingsNotFound(level))
    }
}
