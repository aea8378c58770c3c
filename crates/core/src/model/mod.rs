mod level;
mod question;
mod result;
mod score;
mod settings;

pub use level::{Level, ParseLevelError};
pub use question::{OPTIONS_COUNT, Question, QuestionError};
pub use result::{GameResult, GameResultError};
pub use score::ScoreTracker;
pub use settings::{GameSettings, GameSettingsError, MIN_SUM_VALUE};
