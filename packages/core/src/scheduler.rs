//! Expiry sweep scheduler.
//!
//! Drives the periodic sweep loop: each tick runs the expiry sweeper for
//! the current local day so alerts are in place before anyone looks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::signal;
use tokio::time;

use crate::expiry::{ExpirySweeper, SweepError, SweepReport};
use crate::metrics::AppMetrics;

/// Run the expiry sweep loop.
///
/// Failed sweeps are logged and the loop waits for the next tick; a
/// failed sweep is safe to retry.
///
/// Runs until `Ctrl+C` (SIGINT) is received.
pub async fn run_expiry_sweeps(
    sweeper: ExpirySweeper,
    metrics: Arc<AppMetrics>,
    sweep_interval_seconds: u64,
) {
    let mut interval = time::interval(Duration::from_secs(sweep_interval_seconds));

    tracing::info!(
        "Expiry sweeps started (interval: {}s)",
        sweep_interval_seconds
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let today = Local::now().date_naive();
                let _ = sweep_once(&sweeper, &metrics, today).await;
            }

            _ = signal::ctrl_c() => {
                tracing::info!("Shutdown signal received. Stopping sweeps.");
                break;
            }
        }
    }

    tracing::info!("Expiry sweeps stopped cleanly");
}

/// Execute a single sweep and record it in `metrics`.
pub async fn sweep_once(
    sweeper: &ExpirySweeper,
    metrics: &AppMetrics,
    today: NaiveDate,
) -> Result<SweepReport, SweepError> {
    match sweeper.run(today).await {
        Ok(report) => {
            metrics.record_sweep(&report);
            Ok(report)
        }
        Err(err) => {
            metrics.record_sweep(&err.partial);
            metrics.sweep_errors_total.inc();
            tracing::error!(
                "Expiry sweep failed in bucket {} after {} alert(s): {}",
                err.bucket,
                err.partial.created,
                err.source
            );
            Err(err)
        }
    }
}
