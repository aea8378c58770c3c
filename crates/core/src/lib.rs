#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod settings;
pub mod time;

pub use error::Error;
pub use settings::{LevelTable, SettingsLookup, SettingsNotFound};
pub use time::{Clock, format_countdown};
