//! Background tick loop around a session engine.
//!
//! A [`SessionRunner`] owns one engine. User actions go through
//! [`SessionRunner::act`]; while the engine is running a tokio task ticks it
//! at a fixed cadence, publishes snapshots on a `watch` channel and forwards
//! events to the registered observers.
//!
//! At most one tick loop exists per runner: (re)starting it aborts the
//! previous one. Aborting at any point is safe because engines derive their
//! state from `now - started_at` on the next tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::clock::Clock;
use crate::events::Event;
use crate::recorder::SessionObserver;
use crate::timer::SessionEngine;

struct Shared<E: SessionEngine> {
    engine: Mutex<E>,
    clock: Arc<dyn Clock>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
    snapshots: watch::Sender<E::Snapshot>,
}

impl<E: SessionEngine> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, E> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: &Event) {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer.on_event(event);
        }
    }

    /// Tick once. Returns whether the engine is still running.
    fn tick(&self) -> bool {
        let (event, running) = {
            let mut engine = self.lock();
            let event = engine.tick(self.clock.now());
            self.snapshots.send_replace(engine.snapshot());
            (event, engine.is_running())
        };
        if let Some(event) = event {
            self.notify(&event);
        }
        running
    }
}

pub struct SessionRunner<E: SessionEngine> {
    shared: Arc<Shared<E>>,
    period: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl<E: SessionEngine> SessionRunner<E> {
    pub fn new(engine: E, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (snapshots, _) = watch::channel(engine.snapshot());
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                clock,
                observers: RwLock::new(Vec::new()),
                snapshots,
            }),
            period,
            ticker: None,
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.shared
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Live snapshots, updated on every tick and action.
    pub fn subscribe(&self) -> watch::Receiver<E::Snapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> E::Snapshot {
        self.shared.lock().snapshot()
    }

    /// Read the engine without mutating it.
    pub fn inspect<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.shared.lock())
    }

    /// Apply a user action at the clock's current time.
    ///
    /// Observers see the resulting event, subscribers see the new snapshot,
    /// and the tick loop is started or stopped to match the engine. Must be
    /// called from within a Tokio runtime.
    pub fn act<F>(&mut self, action: F) -> Option<Event>
    where
        F: FnOnce(&mut E, DateTime<Utc>) -> Option<Event>,
    {
        let (event, running) = {
            let mut engine = self.shared.lock();
            let event = action(&mut engine, self.shared.clock.now());
            self.shared.snapshots.send_replace(engine.snapshot());
            (event, engine.is_running())
        };
        if let Some(event) = &event {
            self.shared.notify(event);
        }
        if running {
            self.start_ticking();
        } else {
            self.stop_ticking();
        }
        event
    }

    /// Spawn a fresh tick loop, superseding any existing one.
    pub fn start_ticking(&mut self) {
        self.stop_ticking();
        let shared = Arc::clone(&self.shared);
        let period = self.period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !shared.tick() {
                    debug!("engine stopped, tick loop exiting");
                    break;
                }
            }
        }));
    }

    /// Cancel the tick loop. The engine keeps its state.
    pub fn stop_ticking(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<E: SessionEngine> Drop for SessionRunner<E> {
    fn drop(&mut self) {
        self.stop_ticking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::timer::{CountdownEngine, CountdownState, StopwatchEngine};

    #[derive(Default)]
    struct Collect(Mutex<Vec<Event>>);

    impl SessionObserver for Collect {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl Collect {
        fn records(&self) -> usize {
            self.0.lock().unwrap().iter().filter(|e| e.record().is_some()).count()
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::at_millis(1_700_000_000_000))
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_completes_in_background() {
        let clock = clock();
        let seen = Arc::new(Collect::default());
        let mut runner =
            SessionRunner::new(CountdownEngine::new(1), clock.clone(), Duration::from_secs(1));
        runner.add_observer(seen.clone());
        let mut rx = runner.subscribe();

        runner.act(|e, now| e.start(now));
        assert!(runner.is_ticking());

        clock.advance_ms(60_000);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(seen.records(), 1);
        assert_eq!(runner.snapshot().state, CountdownState::Idle);
        assert!(!runner.is_ticking());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().remaining_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_supersedes_previous_loop() {
        let clock = clock();
        let seen = Arc::new(Collect::default());
        let mut runner =
            SessionRunner::new(CountdownEngine::new(1), clock.clone(), Duration::from_millis(100));
        runner.add_observer(seen.clone());

        runner.act(|e, now| e.start(now));
        runner.start_ticking();
        runner.start_ticking();

        clock.advance_ms(60_000);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(seen.records(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticking_without_record() {
        let clock = clock();
        let seen = Arc::new(Collect::default());
        let mut runner =
            SessionRunner::new(CountdownEngine::new(5), clock.clone(), Duration::from_secs(1));
        runner.add_observer(seen.clone());

        runner.act(|e, now| e.start(now));
        clock.advance_ms(30_000);
        runner.act(|e, now| e.pause(now));
        assert!(!runner.is_ticking());

        clock.advance_ms(10 * 60_000);
        tokio::time::sleep(Duration::from_secs(5)).await;
        runner.act(|e, _| e.reset());
        assert_eq!(seen.records(), 0);
        assert_eq!(runner.snapshot().remaining_ms, 5 * 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn stopwatch_recovers_after_suspended_loop() {
        let clock = clock();
        let mut runner =
            SessionRunner::new(StopwatchEngine::new(), clock.clone(), Duration::from_millis(10));

        runner.act(|e, now| e.start(now));
        clock.advance_ms(2_000);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runner.snapshot().elapsed_ms, 2_000);

        runner.stop_ticking();
        clock.advance_ms(5_000);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runner.snapshot().elapsed_ms, 2_000);

        runner.start_ticking();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runner.snapshot().elapsed_ms, 7_000);
    }
}
