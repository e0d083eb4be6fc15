// Cancellable periodic executor. Runs a task on a fixed cadence until the
// shutdown signal fires; a run in progress always completes before exit.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::Instrument;

#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// One unit of work. Errors are logged and the schedule continues.
    async fn run_once(&self) -> anyhow::Result<()>;
}

/// Spawns the loop. The first run happens one `period` after spawning.
/// Dropping the shutdown sender also stops the loop.
pub fn spawn<T: PeriodicTask>(
    task: Arc<T>,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let span = tracing::info_span!(
        "periodic",
        task = task.name(),
        period_ms = period.as_millis() as u64
    );
    tokio::spawn(
        async move {
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut failures: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        tracing::debug!(failures, "periodic task shutting down");
                        break;
                    }
                    _ = tick.tick() => {
                        if let Err(e) = task.run_once().await {
                            failures += 1;
                            tracing::warn!(error = %e, failures, "periodic run failed");
                        }
                    }
                }
            }
        }
        .instrument(span),
    )
}
