use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use quiz_core::model::{GameResult, GameSettings, Level, Question, ScoreTracker};
use quiz_core::{Clock, SettingsLookup, format_countdown};

use super::events::SessionEvent;
use super::progress::SessionProgress;
use crate::clock::{DEFAULT_TICK_INTERVAL, Scheduler, SessionClock};
use crate::error::SessionError;
use crate::generator::{QuestionGenerator, QuestionSource};

//
// ─── STATE & CONFIG ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    NotStarted,
    Running,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::NotStarted => "not started",
            SessionState::Running => "running",
            SessionState::Finished => "finished",
        })
    }
}

/// Runtime knobs that are not part of the level rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

/// Outcome of a single answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub progress: SessionProgress,
}

//
// ─── INNER STATE ───────────────────────────────────────────────────────────────
//

struct Round {
    level: Level,
    settings: GameSettings,
    started_at: DateTime<Utc>,
    score: ScoreTracker,
    question: Question,
}

struct SessionInner {
    state: SessionState,
    round: Option<Round>,
    remaining_millis: Option<u64>,
    result: Option<GameResult>,
    source: Box<dyn QuestionSource>,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
    clock: Clock,
}

fn invalid(operation: &'static str, state: SessionState) -> SessionError {
    SessionError::InvalidStateTransition { operation, state }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    // Every mutation is all-or-nothing, so a poisoned lock still guards consistent state.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionInner {
    fn publish(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn ensure_state(
        &self,
        expected: SessionState,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            return Ok(());
        }
        warn!(operation, state = %self.state, "rejected session transition");
        Err(invalid(operation, self.state))
    }

    fn begin(&mut self, level: Level, settings: GameSettings) -> Result<(), SessionError> {
        let question = self.source.next_question(settings.max_sum_value())?;
        let score = ScoreTracker::new();
        let progress = SessionProgress::derive(&score, &settings);

        self.round = Some(Round {
            level,
            settings,
            started_at: self.clock.now(),
            score,
            question: question.clone(),
        });
        self.state = SessionState::Running;

        info!(
            %level,
            max_sum = settings.max_sum_value(),
            min_count = settings.min_count_right_answers(),
            min_percent = settings.min_percent_right_answers(),
            seconds = settings.game_time_in_seconds(),
            "session started"
        );
        self.publish(SessionEvent::MinPercent {
            percent: settings.min_percent_right_answers(),
        });
        self.publish(SessionEvent::Progress(progress));
        self.publish(SessionEvent::Question(question));
        Ok(())
    }

    fn answer(&mut self, value: u32) -> Result<AnswerOutcome, SessionError> {
        self.ensure_state(SessionState::Running, "submit an answer")?;
        let state = self.state;
        let Some(round) = self.round.as_mut() else {
            return Err(invalid("submit an answer", state));
        };

        // Draw the replacement first so a failure leaves the score untouched.
        let next = self.source.next_question(round.settings.max_sum_value())?;
        let correct = round.question.is_right(value);
        round.score.record_answer(correct);
        round.question = next.clone();
        let progress = SessionProgress::derive(&round.score, &round.settings);

        debug!(value, correct, total = progress.total_count, "answer recorded");
        self.publish(SessionEvent::Progress(progress.clone()));
        self.publish(SessionEvent::Question(next));
        Ok(AnswerOutcome { correct, progress })
    }

    fn tick(&mut self, remaining_millis: u64) {
        if self.state != SessionState::Running {
            return;
        }
        self.remaining_millis = Some(remaining_millis);
        let formatted = format_countdown(remaining_millis);
        debug!(remaining_millis, %formatted, "session tick");
        self.publish(SessionEvent::Tick {
            remaining_millis,
            formatted,
        });
    }

    fn time_is_up(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        if let Err(err) = self.finish("time is up") {
            error!(%err, "failed to finish session");
        }
    }

    fn finish(&mut self, reason: &'static str) -> Result<GameResult, SessionError> {
        let Some(round) = self.round.as_ref() else {
            return Err(invalid("finish", self.state));
        };
        let finished_at = self.clock.now().max(round.started_at);
        let result = GameResult::evaluate(
            round.level,
            round.settings,
            &round.score,
            round.started_at,
            finished_at,
        )?;

        self.state = SessionState::Finished;
        self.result = Some(result.clone());
        info!(
            reason,
            won = result.won(),
            correct = result.correct_count(),
            total = result.total_count(),
            "session finished"
        );
        self.publish(SessionEvent::Finished(result.clone()));
        Ok(result)
    }

    /// Bring a late subscriber up to date with the latest value of each stream.
    fn replay(&self, tx: &mpsc::UnboundedSender<SessionEvent>) {
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let mut events = vec![
            SessionEvent::MinPercent {
                percent: round.settings.min_percent_right_answers(),
            },
            SessionEvent::Progress(SessionProgress::derive(&round.score, &round.settings)),
            SessionEvent::Question(round.question.clone()),
        ];
        if let Some(remaining_millis) = self.remaining_millis {
            events.push(SessionEvent::Tick {
                remaining_millis,
                formatted: format_countdown(remaining_millis),
            });
        }
        if let Some(result) = &self.result {
            events.push(SessionEvent::Finished(result.clone()));
        }
        for event in events {
            let _ = tx.send(event);
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

struct SessionShared {
    inner: Arc<Mutex<SessionInner>>,
    lookup: Arc<dyn SettingsLookup>,
    clock: SessionClock,
    config: SessionConfig,
}

/// Timed quiz session: `NotStarted → Running → Finished`.
///
/// Cloning yields another handle to the same session. All mutations are
/// serialized through one lock; clock callbacks only hold a weak reference,
/// and dropping the last handle cancels the countdown.
///
/// Operations called in the wrong state return
/// `SessionError::InvalidStateTransition` and change nothing, in debug and
/// release builds alike.
#[derive(Clone)]
pub struct GameSession {
    shared: Arc<SessionShared>,
}

pub struct GameSessionBuilder {
    lookup: Arc<dyn SettingsLookup>,
    scheduler: Arc<dyn Scheduler>,
    source: Box<dyn QuestionSource>,
    config: SessionConfig,
    clock: Clock,
}

impl GameSessionBuilder {
    #[must_use]
    pub fn with_question_source(mut self, source: Box<dyn QuestionSource>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Wall clock used to stamp `started_at` / `finished_at`.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn build(self) -> GameSession {
        let inner = SessionInner {
            state: SessionState::NotStarted,
            round: None,
            remaining_millis: None,
            result: None,
            source: self.source,
            subscribers: Vec::new(),
            clock: self.clock,
        };
        GameSession {
            shared: Arc::new(SessionShared {
                inner: Arc::new(Mutex::new(inner)),
                lookup: self.lookup,
                clock: SessionClock::new(self.scheduler),
                config: self.config,
            }),
        }
    }
}

impl GameSession {
    #[must_use]
    pub fn builder(
        lookup: Arc<dyn SettingsLookup>,
        scheduler: Arc<dyn Scheduler>,
    ) -> GameSessionBuilder {
        GameSessionBuilder {
            lookup,
            scheduler,
            source: Box::new(QuestionGenerator::new()),
            config: SessionConfig::default(),
            clock: Clock::default_clock(),
        }
    }

    #[must_use]
    pub fn new(lookup: Arc<dyn SettingsLookup>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::builder(lookup, scheduler).build()
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock(&self.shared.inner)
    }

    /// Resolve the level, publish the first question and start the countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SettingsNotFound` if the level is unknown; the
    /// session stays `NotStarted` and nothing is published.
    /// Returns `SessionError::InvalidStateTransition` if already started.
    pub fn start(&self, level: Level) -> Result<(), SessionError> {
        let duration = {
            let mut inner = self.lock();
            inner.ensure_state(SessionState::NotStarted, "start")?;
            let settings = self
                .shared
                .lookup
                .resolve(level)
                .inspect_err(|err| warn!(%err, "settings lookup failed"))?;
            inner.begin(level, settings)?;
            Duration::from_millis(settings.game_time_millis())
        };
        self.start_clock(duration);
        Ok(())
    }

    fn start_clock(&self, duration: Duration) {
        let tick_target = Arc::downgrade(&self.shared.inner);
        let finish_target = tick_target.clone();

        self.shared.clock.start(
            duration,
            self.shared.config.tick_interval(),
            Box::new(move |remaining| {
                if let Some(inner) = tick_target.upgrade() {
                    lock(&inner).tick(remaining);
                }
            }),
            Box::new(move || {
                if let Some(inner) = finish_target.upgrade() {
                    lock(&inner).time_is_up();
                }
            }),
        );

        // A concurrent force-finish may have won the race before the clock existed.
        if self.state() != SessionState::Running {
            self.shared.clock.cancel();
        }
    }

    /// Check `value` against the current question, record it and advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidStateTransition` unless the session is
    /// running; score and question are left untouched.
    pub fn submit_answer(&self, value: u32) -> Result<AnswerOutcome, SessionError> {
        self.lock().answer(value)
    }

    /// End a running session now, cancelling its clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidStateTransition` unless the session is running.
    pub fn force_finish(&self) -> Result<GameResult, SessionError> {
        let result = {
            let mut inner = self.lock();
            inner.ensure_state(SessionState::Running, "finish")?;
            inner.finish("finished early")?
        };
        self.shared.clock.cancel();
        Ok(result)
    }

    /// Abandon the session: cancel the clock and close every subscription.
    ///
    /// A running session becomes `Finished` without producing a result.
    pub fn dispose(&self) {
        self.shared.clock.cancel();
        let mut inner = self.lock();
        if inner.state == SessionState::Running {
            inner.state = SessionState::Finished;
            info!("session disposed before finishing");
        }
        inner.subscribers.clear();
    }

    /// Subscribe to session events.
    ///
    /// A subscriber joining mid-session first receives the latest value of
    /// each stream, then live events in production order.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.replay(&tx);
        inner.subscribers.push(tx);
        rx
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    #[must_use]
    pub fn level(&self) -> Option<Level> {
        self.lock().round.as_ref().map(|round| round.level)
    }

    #[must_use]
    pub fn settings(&self) -> Option<GameSettings> {
        self.lock().round.as_ref().map(|round| round.settings)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<Question> {
        self.lock().round.as_ref().map(|round| round.question.clone())
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.lock()
            .round
            .as_ref()
            .map(|round| SessionProgress::derive(&round.score, &round.settings))
    }

    /// Remaining time from the latest tick, or the full duration before the first one.
    #[must_use]
    pub fn remaining_millis(&self) -> Option<u64> {
        let inner = self.lock();
        inner.remaining_millis.or_else(|| {
            inner
                .round
                .as_ref()
                .map(|round| round.settings.game_time_millis())
        })
    }

    #[must_use]
    pub fn formatted_time(&self) -> Option<String> {
        self.remaining_millis().map(format_countdown)
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.lock().result.clone()
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.shared.config
    }

    #[must_use]
    pub fn is_clock_running(&self) -> bool {
        self.shared.clock.is_running()
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("GameSession")
            .field("state", &inner.state)
            .field("level", &inner.round.as_ref().map(|round| round.level))
            .field("score", &inner.round.as_ref().map(|round| round.score))
            .field("remaining_millis", &inner.remaining_millis)
            .field("subscribers", &inner.subscribers.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
