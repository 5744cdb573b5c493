//! Background growth conversion.
//!
//! One task runs `convert_tick` on a fixed interval. The loop awaits each
//! tick before waiting for the next, so ticks never overlap. After a tick
//! that overruns, one tick fires right away and the rest of the missed
//! deadlines are skipped; the timer then resumes its fixed grid.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::registry::{ChannelRegistry, TickReport};

/// Handle to the running conversion task.
///
/// Dropping the handle aborts the task; call [`ConversionScheduler::stop`]
/// to let an in-flight tick finish first.
pub struct ConversionScheduler {
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl ConversionScheduler {
    /// Spawn the conversion loop on the current tokio runtime.
    ///
    /// The first tick fires one `interval` after spawning. Intervals
    /// shorter than a millisecond are raised to one millisecond.
    pub fn spawn(registry: Arc<ChannelRegistry>, interval: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let join_handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = registry.convert_tick().await;
                        record_tick_metrics(&report);
                    }
                }
            }

            debug!("Conversion loop exited");
        });

        info!(interval_ms = interval.as_millis() as u64, "Conversion scheduler started");

        Self {
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
            interval,
        }
    }

    /// The tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signal the loop to stop and wait for it to finish.
    pub async fn stop(mut self) -> Result<(), tokio::task::JoinError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.await?;
        }
        info!("Conversion scheduler stopped");
        Ok(())
    }
}

impl Drop for ConversionScheduler {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Record tick metrics.
fn record_tick_metrics(report: &TickReport) {
    info!(
        target: "channel_ranking::metrics",
        metric_type = "tick",
        converted = report.converted,
        subscribers_gained = report.subscribers_gained,
        saved = report.saved,
        "tick_metric"
    );
}
