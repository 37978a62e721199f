//! Host scheduling: the cooperative context and tick delays

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Pending tick delay
pub type Delay = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Runs work on the host's single cooperative context.
pub trait Scheduler {
    /// Start `task` on the cooperative context and return at once.
    fn run_now<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static;

    /// Resolve after `ticks` host ticks.
    fn delay(&self, ticks: u32) -> Delay;
}

/// Scheduler for a tokio `LocalSet` with a fixed tick length.
///
/// `run_now` must be called from inside the `LocalSet`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickScheduler {
    tick: Duration,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK)
    }
}

impl TickScheduler {
    /// 20 ticks per second
    pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Zero-length ticks; delays only yield
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl Scheduler for TickScheduler {
    fn run_now<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        tokio::task::spawn_local(task)
    }

    fn delay(&self, ticks: u32) -> Delay {
        Box::pin(tokio::time::sleep(self.tick * ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test(start_paused = true)]
    async fn test_delay_waits_for_ticks() {
        let scheduler = TickScheduler::default();
        let started = tokio::time::Instant::now();
        scheduler.delay(40).await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_run_now_on_local_set() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                // Non-Send state is fine on the cooperative context
                let hits = Rc::new(Cell::new(0));
                let inner = Rc::clone(&hits);
                let handle = TickScheduler::immediate().run_now(async move {
                    inner.set(inner.get() + 1);
                    7
                });
                assert_eq!(handle.await.unwrap(), 7);
                assert_eq!(hits.get(), 1);
            })
            .await;
    }
}
