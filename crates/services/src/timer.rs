use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Period of the quiz countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A cancellable periodic timer.
///
/// A background task fires once per period and queues a tick; the owner
/// drains ticks with [`SessionTimer::tick`]. Stopping or dropping the timer
/// aborts the task, so a timer never outlives whoever holds it.
#[derive(Debug)]
pub struct SessionTimer {
    handle: JoinHandle<()>,
    ticks: mpsc::UnboundedReceiver<()>,
    stopped: bool,
}

impl SessionTimer {
    /// Spawn the timer. The first tick arrives one `period` from now.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(period_ms = period.as_millis() as u64, "session timer started");
        Self {
            handle,
            ticks,
            stopped: false,
        }
    }

    /// Wait for the next tick. Returns `false` once the timer is stopped.
    pub async fn tick(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.ticks.recv().await.is_some()
    }

    /// Cancel the timer and discard any ticks not yet drained. Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.handle.abort();
        self.ticks.close();
        tracing::debug!("session timer stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.stopped && !self.handle.is_finished()
    }

    #[cfg(test)]
    pub(crate) fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.handle.abort_handle()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut timer = SessionTimer::start(TICK_PERIOD);
        let started = Instant::now();

        assert!(timer.tick().await);
        assert_eq!(started.elapsed(), TICK_PERIOD);
        assert!(timer.tick().await);
        assert_eq!(started.elapsed(), TICK_PERIOD * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_yields_no_ticks() {
        let mut timer = SessionTimer::start(TICK_PERIOD);
        assert!(timer.tick().await);

        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.tick().await);

        timer.stop();
        assert!(!timer.tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_aborts_the_task() {
        let timer = SessionTimer::start(TICK_PERIOD);
        let task = timer.abort_handle();
        drop(timer);

        tokio::time::sleep(TICK_PERIOD * 3).await;
        assert!(task.is_finished());
    }
}
