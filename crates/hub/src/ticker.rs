//! Cancelable periodic tasks that drive the session.
//!
//! Two tasks exist: the sensor tick (always on) and the optional day clock.
//! Each one fires first after a full period, then on every period, and runs
//! its action under the session write lock.  A [`TickerHandle`] owns the
//! task: `cancel()` stops it cleanly, dropping the handle aborts it, so no
//! periodic callback outlives its session.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use airmind_engine::Session;

use crate::state::SharedSession;

/// Sensor tick period used when the config does not override it.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

pub struct TickerHandle {
    name: &'static str,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Stop the task and wait for it to finish its current action.
    pub async fn cancel(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!(ticker = self.name, "ticker stopped");
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Run `action` against the session every `period` until canceled.
pub fn spawn_periodic<F>(
    name: &'static str,
    period: Duration,
    session: SharedSession,
    mut action: F,
) -> TickerHandle
where
    F: FnMut(&mut Session) + Send + 'static,
{
    let (tx, mut rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(ticker = name, period_ms = period.as_millis() as u64, "ticker started");

        loop {
            tokio::select! {
                _ = &mut rx => break,
                _ = ticker.tick() => {
                    let mut st = session.write().await;
                    action(&mut st);
                    debug!(ticker = name, "ticker fired");
                }
            }
        }
    });

    TickerHandle {
        name,
        shutdown: Some(tx),
        task: Some(task),
    }
}

/// Sensor simulation tick.
pub fn spawn_sensor_tick(session: SharedSession, period: Duration) -> TickerHandle {
    spawn_periodic("sensor", period, session, |st| {
        st.on_tick();
    })
}

/// Grow-day clock; advances the lifecycle one day per `day_length`.
pub fn spawn_day_clock(session: SharedSession, day_length: Duration) -> TickerHandle {
    spawn_periodic("day-clock", day_length, session, |st| {
        st.on_day_elapsed();
    })
}

// ===========================================================================
// Tests
// ===========================================================================
