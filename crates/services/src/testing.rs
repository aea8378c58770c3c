//! Deterministic drivers for exercising sessions without real time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use quiz_core::model::{Question, QuestionError};

use crate::clock::{ClockHandle, FinishFn, Gate, Scheduler, TickFn, as_millis};
use crate::generator::QuestionSource;

/// What a manual step delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualStep {
    Tick(u64),
    Finished,
}

struct ManualTimer {
    gate: Gate,
    state: Mutex<ManualTimerState>,
}

struct ManualTimerState {
    remaining: u64,
    step: u64,
    ticked_zero: bool,
    on_tick: TickFn,
    on_finish: Option<FinishFn>,
}

/// Scheduler whose countdowns only move when the test says so.
///
/// Each call to `step` delivers the next tick (or the final finish) of the
/// most recently scheduled countdown.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<Vec<Arc<ManualTimer>>>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn timers(&self) -> MutexGuard<'_, Vec<Arc<ManualTimer>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of countdowns scheduled so far.
    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.timers().len()
    }

    /// Deliver the next event of the latest countdown.
    ///
    /// Returns `None` once the countdown has finished or was cancelled.
    pub fn step(&self) -> Option<ManualStep> {
        let timer = self.timers().last().cloned()?;
        timer
            .gate
            .fire(|| {
                let mut state = timer.state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.ticked_zero {
                    let on_finish = state.on_finish.take()?;
                    on_finish();
                    return Some((ManualStep::Finished, true));
                }
                let remaining = state.remaining;
                let on_tick = &mut state.on_tick;
                on_tick(remaining);
                if remaining == 0 {
                    state.ticked_zero = true;
                } else {
                    state.remaining = remaining.saturating_sub(state.step);
                }
                Some((ManualStep::Tick(remaining), false))
            })
            .flatten()
            .map(|(step, finished)| {
                if finished {
                    timer.gate.close();
                }
                step
            })
    }

    /// Step until the latest countdown finishes; returns every step taken.
    pub fn run_to_end(&self) -> Vec<ManualStep> {
        std::iter::from_fn(|| self.step()).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &self,
        duration: Duration,
        interval: Duration,
        on_tick: TickFn,
        on_finish: FinishFn,
    ) -> ClockHandle {
        let gate = Gate::default();
        let timer = Arc::new(ManualTimer {
            gate: gate.clone(),
            state: Mutex::new(ManualTimerState {
                remaining: as_millis(duration),
                step: as_millis(interval).max(1),
                ticked_zero: false,
                on_tick,
                on_finish: Some(on_finish),
            }),
        });
        self.timers().push(timer);
        ClockHandle::new(gate, None)
    }
}

/// Question source that replays a fixed list, cycling when exhausted.
pub struct ScriptedQuestions {
    questions: Vec<Question>,
    next: usize,
}

impl ScriptedQuestions {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions, next: 0 }
    }
}

impl QuestionSource for ScriptedQuestions {
    fn next_question(&mut self, max_sum: u32) -> Result<Question, QuestionError> {
        if self.questions.is_empty() {
            return Err(QuestionError::MaxSumTooSmall(max_sum));
        }
        let question = self.questions[self.next % self.questions.len()].clone();
        self.next += 1;
        Ok(question)
    }
}
