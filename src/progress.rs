use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;

const STEP_INTERVAL: Duration = Duration::from_millis(100);
const FULL: u64 = 100;

/// Perceived-progress ticker: +1% every 100ms of wall-clock time,
/// stopping on its own at 100%.
///
/// This is cosmetic. It is not told how many probes have finished and
/// must never gate output generation; the aggregator's deadline event
/// is the real completion signal, and whoever owns that event retires
/// the ticker through [`finish`](Self::finish) or
/// [`abort`](Self::abort).
pub struct ProgressTicker {
    percent: Arc<AtomicU64>,
    bar: ProgressBar,
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub fn start() -> Self {
        let bar = ProgressBar::new(FULL);
        bar.set_style(
            ProgressStyle::with_template("[{bar:40.cyan/blue}] {percent}% {msg}")
                .unwrap()
                .progress_chars("|| "),
        );
        bar.set_message("Benchmarking...");

        let percent = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(Notify::new());

        let handle = tokio::spawn({
            let percent = Arc::clone(&percent);
            let stop = Arc::clone(&stop);
            let bar = bar.clone();
            async move {
                let mut interval = time::interval(STEP_INTERVAL);
                // interval's first tick is immediate; the first step
                // belongs at t+100ms
                interval.tick().await;
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let p = percent.fetch_add(1, Ordering::Relaxed) + 1;
                            bar.set_position(p);
                            if p >= FULL {
                                break;
                            }
                        }
                        _ = stop.notified() => break,
                    }
                }
            }
        });

        Self {
            percent,
            bar,
            stop,
            handle,
        }
    }

    pub fn percent(&self) -> u64 {
        self.percent.load(Ordering::Relaxed).min(FULL)
    }

    /// Counter handle that survives `finish`/`abort`, so tests can
    /// check the ticker's terminal state.
    #[cfg(test)]
    pub(crate) fn percent_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.percent)
    }

    /// The run completed; snap to 100% and retire the bar.
    pub async fn finish(self) {
        self.stop.notify_one();
        let _ = self.handle.await;
        // The ticker paces itself on wall clock, so it routinely
        // disagrees with the real completion instant.
        tracing::debug!(
            percent = self.percent.load(Ordering::Relaxed).min(FULL),
            "run complete, retiring ticker"
        );
        self.percent.store(FULL, Ordering::Relaxed);
        self.bar.set_position(FULL);
        self.bar.finish_with_message("done");
    }

    /// The run failed; retire the bar without pretending completion.
    pub async fn abort(self) {
        self.stop.notify_one();
        let _ = self.handle.await;
        self.bar.finish_and_clear();
    }
}
