//! Single-flight background retry loop for directory registration.
//!
//! A [`RetryScheduler`] belongs to exactly one room. Any number of callers
//! may ask it to start retrying; an atomic compare-and-set on the in-flight
//! flag lets exactly one of them spawn the loop. The loop waits one period,
//! runs an attempt, and repeats on a fixed period until an attempt resolves.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::RoomError;

/// One retry attempt: `Ok(true)` ends the loop, `Ok(false)` keeps it going,
/// `Err` ends it without resolving.
pub type RetryAttempt = BoxFuture<'static, Result<bool, RoomError>>;

/// Clears the in-flight flag when the loop ends, including on abort.
#[derive(Debug)]
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns a room's background registration loop.
#[derive(Debug)]
pub struct RetryScheduler {
    room_id: String,
    period: Duration,
    in_flight: Arc<AtomicBool>,
    loops_started: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RetryScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new(room_id: impl Into<String>, period: Duration) -> Self {
        Self {
            room_id: room_id.into(),
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
            loops_started: AtomicU64::new(0),
            task: Mutex::new(None),
        }
    }

    /// Retry period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns `true` while a loop is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of loops started over the scheduler's lifetime.
    #[must_use]
    pub fn loops_started(&self) -> u64 {
        self.loops_started.load(Ordering::Relaxed)
    }

    /// Starts the retry loop unless one is already running.
    ///
    /// Returns `true` if this call started the loop, `false` if another loop
    /// was already in flight. Must be called from within a tokio runtime.
    pub fn try_start<F>(&self, mut attempt: F) -> bool
    where
        F: FnMut() -> RetryAttempt + Send + 'static,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(room_id = %self.room_id, "registration retry already scheduled");
            return false;
        }
        self.loops_started.fetch_add(1, Ordering::Relaxed);

        let guard = InFlight(Arc::clone(&self.in_flight));
        let room_id = self.room_id.clone();
        let period = self.period;
        tracing::info!(
            %room_id,
            period_secs = period.as_secs(),
            "scheduling background registration"
        );

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!(%room_id, "background registration attempt");
                match attempt().await {
                    Ok(true) => {
                        tracing::info!(%room_id, "background registration resolved");
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!(%room_id, error = %e, "background registration failed, giving up");
                        break;
                    }
                }
            }
        });

        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(handle);
        true
    }

    /// Aborts a running loop. The in-flight flag is released as the task
    /// unwinds.
    pub fn shutdown(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
