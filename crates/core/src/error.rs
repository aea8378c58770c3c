use thiserror::Error;

use crate::model::{GameResultError, GameSettingsError, ParseLevelError, QuestionError};
use crate::settings::{LevelTableError, SettingsNotFound};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] GameSettingsError),
    #[error(transparent)]
    SettingsNotFound(#[from] SettingsNotFound),
    #[error(transparent)]
    LevelTable(#[from] LevelTableError),
    #[error(transparent)]
    Level(#[from] ParseLevelError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] GameResultError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameSettings, Level};
    use crate::settings::{LevelTable, SettingsLookup};

    fn resolve_named(table: &LevelTable, name: &str) -> Result<GameSettings, Error> {
        let level: Level = name.parse()?;
        Ok(table.resolve(level)?)
    }

    #[test]
    fn lookup_failures_convert_into_crate_error() {
        let table = LevelTable::standard().unwrap();
        assert!(resolve_named(&table, "easy").is_ok());
        assert!(matches!(
            resolve_named(&table, "insane"),
            Err(Error::Level(_))
        ));
        assert!(matches!(
            resolve_named(&LevelTable::empty(), "easy"),
            Err(Error::SettingsNotFound(_))
        ));
    }
}
