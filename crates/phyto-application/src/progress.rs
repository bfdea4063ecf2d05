//! Cosmetic progress for in-flight analyses.
//!
//! The ticker runs on its own clock and knows nothing about the request it
//! decorates. It only ever moves the shared percentage forward and never past
//! the ceiling; the dashboard jumps it to 100 once the real answer arrives.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background task nudging a progress percentage towards a ceiling.
///
/// Cancelled by [`ProgressTicker::stop`] or when dropped.
pub struct ProgressTicker {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Starts ticking every `interval`, adding `0..=max_step` each time.
    pub fn start(
        progress: watch::Sender<u8>,
        interval: Duration,
        max_step: u8,
        ceiling: u8,
    ) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticks = tokio::time::interval(interval);
            // The first tick of an interval completes immediately.
            ticks.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticks.tick() => {
                        let step = rng.gen_range(0..=max_step);
                        progress.send_if_modified(|value| {
                            let next = value.saturating_add(step).min(ceiling).max(*value);
                            let changed = next != *value;
                            *value = next;
                            changed
                        });
                    }
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the ticker and waits for it to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::debug!(error = %e, "Progress ticker ended abnormally");
            }
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_progress_rises_and_stays_under_ceiling() {
        let (tx, mut rx) = watch::channel(0u8);
        let ticker = ProgressTicker::start(tx, Duration::from_millis(150), 8, 90);

        let mut last = 0;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let current = *rx.borrow_and_update();
            assert!(current >= last, "progress went backwards");
            assert!(current <= 90);
            last = current;
        }
        ticker.stop().await;
        assert!(last > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_progress() {
        let (tx, rx) = watch::channel(0u8);
        let ticker = ProgressTicker::start(tx, Duration::from_millis(150), 8, 90);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        ticker.stop().await;

        let frozen = *rx.borrow();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*rx.borrow(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, rx) = watch::channel(0u8);
        let ticker = ProgressTicker::start(tx, Duration::from_millis(150), 8, 90);
        drop(ticker);
        tokio::task::yield_now().await;

        let frozen = *rx.borrow();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*rx.borrow(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_lowers_a_value_above_ceiling() {
        let (tx, rx) = watch::channel(95u8);
        let ticker = ProgressTicker::start(tx, Duration::from_millis(150), 8, 90);
        tokio::time::sleep(Duration::from_secs(2)).await;
        ticker.stop().await;
        assert_eq!(*rx.borrow(), 95);
    }
}
