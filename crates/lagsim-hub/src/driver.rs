//! Fixed-rate tick drivers
//!
//! Each actor gets its own tokio task that calls [`Actor::tick`] once per
//! period. Changing the rate cancels the running timer and starts a new one
//! at the new period; the actor's state is untouched. Stopping is done by
//! closing the rate channel, so dropping a [`DriverHandle`] also stops its
//! task at the next scheduling point.

use crate::{Error, Result};
use lagsim_core::{Actor, TickRate};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Lock an actor, ignoring poisoning
///
/// A panicking tick leaves the actor in whatever state it reached; the
/// simulation keeps going with it.
pub(crate) fn lock<T>(actor: &Mutex<T>) -> MutexGuard<'_, T> {
    actor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spawns tick drivers
pub struct TickDriver;

impl TickDriver {
    /// Start ticking `actor` at its current [`Actor::tick_rate`]
    ///
    /// Must be called from within a tokio runtime. The first tick happens one
    /// period after the call.
    pub fn spawn<A: Actor>(actor: Arc<Mutex<A>>) -> DriverHandle {
        let (name, rate) = {
            let guard = lock(&actor);
            (guard.name().to_string(), guard.tick_rate())
        };
        let (rate_tx, rate_rx) = watch::channel(rate);
        let ticks = Arc::new(AtomicU64::new(0));

        info!(actor = %name, %rate, "tick driver started");
        let task = tokio::spawn(run(name.clone(), actor, rate_rx, ticks.clone()));

        DriverHandle {
            name,
            rate_tx,
            task,
            ticks,
        }
    }
}

fn ticker(rate: TickRate) -> Interval {
    let period = rate.period();
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run<A: Actor>(
    name: String,
    actor: Arc<Mutex<A>>,
    mut rate_rx: watch::Receiver<TickRate>,
    ticks: Arc<AtomicU64>,
) {
    let mut interval = ticker(*rate_rx.borrow_and_update());

    loop {
        tokio::select! {
            biased;

            changed = rate_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let rate = *rate_rx.borrow_and_update();
                interval = ticker(rate);
                info!(actor = %name, %rate, "tick rate changed, timer restarted");
            }
            _ = interval.tick() => {
                // The tick runs to completion while holding the lock, so
                // there is never more than one in flight.
                lock(&actor).tick();
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    debug!(actor = %name, ticks = ticks.load(Ordering::Relaxed), "tick driver loop exited");
}

/// Lifecycle of a driver as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Task is alive and ticking
    Running,
    /// Task has exited; no ticks are scheduled
    Idle,
}

/// Control side of a running driver
#[derive(Debug)]
pub struct DriverHandle {
    name: String,
    rate_tx: watch::Sender<TickRate>,
    task: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
}

impl DriverHandle {
    /// Name of the driven actor
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the timer with one at `rate`
    pub fn set_tick_rate(&self, rate: TickRate) -> Result<()> {
        self.rate_tx
            .send(rate)
            .map_err(|_| Error::DriverStopped(self.name.clone()))
    }

    /// Rate the timer is (or is about to be) running at
    pub fn tick_rate(&self) -> TickRate {
        *self.rate_tx.borrow()
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Whether the task is still alive
    pub fn state(&self) -> DriverState {
        if self.task.is_finished() {
            DriverState::Idle
        } else {
            DriverState::Running
        }
    }

    /// Stop the timer and wait for the task to exit
    ///
    /// A tick already in progress completes first. Returns the number of
    /// ticks run.
    pub async fn stop(self) -> Result<u64> {
        let Self {
            name,
            rate_tx,
            task,
            ticks,
        } = self;
        drop(rate_tx);
        task.await?;

        let total = ticks.load(Ordering::Relaxed);
        info!(actor = %name, ticks = total, "tick driver stopped");
        Ok(total)
    }
}

/// Stop every driver, even when some of them fail
///
/// All tasks have exited when this returns. The first failure, if any, is
/// returned after the last driver has been stopped.
pub async fn stop_all(drivers: impl IntoIterator<Item = DriverHandle>) -> Result<()> {
    let mut first_error = None;
    for driver in drivers {
        let name = driver.name().to_string();
        if let Err(err) = driver.stop().await {
            warn!(actor = %name, "{err}");
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    struct Counter {
        rate: TickRate,
        ticks: u64,
        stamps: Vec<Instant>,
    }

    impl Counter {
        fn shared(hz: u16) -> Arc<Mutex<Self>> {
            Arc::new(Mutex::new(Self {
                rate: TickRate::per_second(hz),
                ticks: 0,
                stamps: Vec::new(),
            }))
        }
    }

    impl Actor for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn tick_rate(&self) -> TickRate {
            self.rate
        }

        fn tick(&mut self) {
            self.ticks += 1;
            self.stamps.push(Instant::now());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_configured_rate() {
        let actor = Counter::shared(10);
        let handle = TickDriver::spawn(actor.clone());

        sleep(Duration::from_millis(1050)).await;

        assert_eq!(lock(&actor).ticks, 10);
        assert_eq!(handle.ticks(), 10);
        assert_eq!(handle.state(), DriverState::Running);
        assert_eq!(handle.stop().await.unwrap(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_change_restarts_timer() {
        let actor = Counter::shared(10);
        let handle = TickDriver::spawn(actor.clone());

        sleep(Duration::from_millis(1050)).await;
        handle.set_tick_rate(TickRate::per_second(20)).unwrap();
        assert_eq!(handle.tick_rate().hz(), 20.0);

        // New timer starts at t=1050, first tick at t=1100
        sleep(Duration::from_millis(975)).await;
        let counter = lock(&actor);
        assert_eq!(counter.ticks, 29);

        let gaps: Vec<_> = counter
            .stamps
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect();
        let near = |g: &Duration, ms: u64| {
            g.abs_diff(Duration::from_millis(ms)) < Duration::from_millis(2)
        };
        assert!(gaps[..9].iter().all(|g| near(g, 100)));
        assert!(gaps[10..].iter().all(|g| near(g, 50)));
        drop(counter);

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticking() {
        let actor = Counter::shared(50);
        let handle = TickDriver::spawn(actor.clone());

        sleep(Duration::from_millis(110)).await;
        let total = handle.stop().await.unwrap();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(lock(&actor).ticks, total);
        assert_eq!(total, 5);
    }

    struct Exploding;

    impl Actor for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn tick_rate(&self) -> TickRate {
            TickRate::per_second(100)
        }

        fn tick(&mut self) {
            panic!("tick failed");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_stops_the_rest_after_a_failure() {
        let broken = TickDriver::spawn(Arc::new(Mutex::new(Exploding)));
        let counter = Counter::shared(50);
        let healthy = TickDriver::spawn(counter.clone());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(broken.state(), DriverState::Idle);

        let err = stop_all([broken, healthy]).await.unwrap_err();
        assert!(matches!(err, Error::Join(_)));

        let ticks = lock(&counter).ticks;
        sleep(Duration::from_secs(1)).await;
        assert_eq!(lock(&counter).ticks, ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_ends_task() {
        let actor = Counter::shared(50);
        drop(TickDriver::spawn(actor.clone()));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(lock(&actor).ticks, 0);
    }
}
