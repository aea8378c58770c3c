//! Countdown clock with cancellable tick and finish callbacks.
//!
//! A clock emits `on_tick(remaining_millis)` once per interval, starting at the
//! full duration and stepping down to `0`, then calls `on_finish` exactly once.
//! Every callback runs while holding the clock's gate, so once
//! `ClockHandle::cancel` returns no further callback can start.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

pub type TickFn = Box<dyn FnMut(u64) + Send + 'static>;
pub type FinishFn = Box<dyn FnOnce() + Send + 'static>;

/// Default cadence between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Cancellable scheduled-task abstraction backing a `SessionClock`.
pub trait Scheduler: Send + Sync {
    fn schedule(
        &self,
        duration: Duration,
        interval: Duration,
        on_tick: TickFn,
        on_finish: FinishFn,
    ) -> ClockHandle;
}

//
// ─── GATE ──────────────────────────────────────────────────────────────────────
//

/// Shared open/closed flag. Callbacks run under its lock.
#[derive(Clone, Default)]
pub(crate) struct Gate {
    closed: Arc<Mutex<bool>>,
}

impl Gate {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` unless the gate is closed. Returns `None` when closed.
    pub(crate) fn fire<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let closed = self.lock();
        if *closed {
            return None;
        }
        let out = f();
        drop(closed);
        Some(out)
    }

    pub(crate) fn close(&self) {
        *self.lock() = true;
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.lock()
    }
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

/// Owner of one scheduled countdown. Dropping the handle cancels it.
pub struct ClockHandle {
    gate: Gate,
    task: Option<AbortHandle>,
}

impl ClockHandle {
    pub(crate) fn new(gate: Gate, task: Option<AbortHandle>) -> Self {
        Self { gate, task }
    }

    /// Stop the countdown. Idempotent.
    ///
    /// Blocks until an in-flight callback completes, so it must not be called
    /// from inside this clock's own `on_tick` or `on_finish`.
    pub fn cancel(&self) {
        self.gate.close();
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// True until the clock finishes or is cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.gate.is_closed()
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ClockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockHandle")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

pub(crate) fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

//
// ─── TOKIO ─────────────────────────────────────────────────────────────────────
//

/// Scheduler that runs each countdown as a task on a Tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler bound to the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        duration: Duration,
        interval: Duration,
        mut on_tick: TickFn,
        on_finish: FinishFn,
    ) -> ClockHandle {
        let interval = interval.max(Duration::from_millis(1));
        let step = as_millis(interval);
        let gate = Gate::default();
        let task_gate = gate.clone();

        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut remaining = as_millis(duration);

            loop {
                ticker.tick().await;
                if task_gate.fire(|| on_tick(remaining)).is_none() {
                    return;
                }
                if remaining == 0 {
                    break;
                }
                remaining = remaining.saturating_sub(step);
            }

            task_gate.fire(on_finish);
            task_gate.close();
        });

        ClockHandle::new(gate, Some(task.abort_handle()))
    }
}

//
// ─── SESSION CLOCK ─────────────────────────────────────────────────────────────
//

/// The single active countdown of a session.
pub struct SessionClock {
    scheduler: Arc<dyn Scheduler>,
    active: Mutex<Option<ClockHandle>>,
}

impl SessionClock {
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            active: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ClockHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a countdown, cancelling any previous one first.
    pub fn start(
        &self,
        duration: Duration,
        interval: Duration,
        on_tick: TickFn,
        on_finish: FinishFn,
    ) {
        let previous = self.slot().take();
        drop(previous);

        let handle = self
            .scheduler
            .schedule(duration, interval, on_tick, on_finish);
        *self.slot() = Some(handle);
    }

    /// Cancel the active countdown, if any.
    pub fn cancel(&self) {
        let handle = self.slot().take();
        if let Some(handle) = handle {
            handle.cancel();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.slot().as_ref().is_some_and(ClockHandle::is_active)
    }
}

impl std::fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClock")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, TickFn) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        (
            ticks,
            Box::new(move |remaining| sink.lock().unwrap().push(remaining)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_count_down_then_finish_once() {
        let (ticks, on_tick) = recorder();
        let (done_tx, done_rx) = oneshot::channel();
        let scheduler = TokioScheduler::current();

        let handle = scheduler.schedule(
            Duration::from_secs(3),
            DEFAULT_TICK_INTERVAL,
            on_tick,
            Box::new(move || {
                let _ = done_tx.send(());
            }),
        );

        done_rx.await.unwrap();
        assert_eq!(*ticks.lock().unwrap(), vec![3000, 2000, 1000, 0]);
        assert!(!handle.is_active());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.lock().unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn uneven_duration_saturates_at_zero() {
        let (ticks, on_tick) = recorder();
        let (done_tx, done_rx) = oneshot::channel();

        let _handle = TokioScheduler::current().schedule(
            Duration::from_millis(2500),
            DEFAULT_TICK_INTERVAL,
            on_tick,
            Box::new(move || {
                let _ = done_tx.send(());
            }),
        );

        done_rx.await.unwrap();
        assert_eq!(*ticks.lock().unwrap(), vec![2500, 1500, 500, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks_and_finish() {
        let (ticks, on_tick) = recorder();
        let finished = Arc::new(AtomicUsize::new(0));
        let finished_sink = Arc::clone(&finished);

        let handle = TokioScheduler::current().schedule(
            Duration::from_secs(10),
            DEFAULT_TICK_INTERVAL,
            on_tick,
            Box::new(move || {
                finished_sink.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.cancel();
        let seen = ticks.lock().unwrap().len();
        assert!(seen >= 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(ticks.lock().unwrap().len(), seen);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert!(!handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn session_clock_replaces_previous_countdown() {
        let (first_ticks, first_tick) = recorder();
        let (second_ticks, second_tick) = recorder();
        let clock = SessionClock::new(Arc::new(TokioScheduler::current()));

        clock.start(
            Duration::from_secs(10),
            DEFAULT_TICK_INTERVAL,
            first_tick,
            Box::new(|| {}),
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
        clock.start(
            Duration::from_secs(2),
            DEFAULT_TICK_INTERVAL,
            second_tick,
            Box::new(|| {}),
        );
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*first_ticks.lock().unwrap(), vec![10_000]);
        assert_eq!(*second_ticks.lock().unwrap(), vec![2000, 1000, 0]);
        assert!(!clock.is_running());
    }

    #[test]
    fn gate_refuses_after_close() {
        let gate = Gate::default();
        assert_eq!(gate.fire(|| 1), Some(1));
        gate.close();
        assert_eq!(gate.fire(|| 2), None);
    }
}
