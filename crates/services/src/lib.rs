#![forbid(unsafe_code)]

pub mod clock;
pub mod error;
pub mod generator;
pub mod session;
pub mod testing;

pub use quiz_core::Clock;

pub use clock::{ClockHandle, Scheduler, SessionClock, TokioScheduler};
pub use error::SessionError;
pub use generator::{QuestionGenerator, QuestionSource};
pub use session::{
    AnswerOutcome, GameSession, GameSessionBuilder, SessionConfig, SessionEvent, SessionProgress,
    SessionState,
};
