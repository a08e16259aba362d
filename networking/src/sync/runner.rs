use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{
    error::SyncError,
    service::{SyncService, TickOutcome},
};

/// Drive `service` every `period` until `shutdown` fires or its sender drops.
///
/// A tick that finds no common block is followed by a rollback of the local
/// tip, so the next tick negotiates one height lower.
pub async fn run_sync_loop(
    service: Arc<SyncService>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(period_secs = period.as_secs(), "Sync loop started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Sync loop stopping");
                return;
            }
            _ = interval.tick() => {
                match service.tick().await {
                    Ok(TickOutcome::NoCommonBlock) => {
                        service.rollback().await;
                    }
                    Ok(outcome) => debug!(outcome = ?outcome, "Sync tick finished"),
                    Err(SyncError::Busy) => debug!("Skipped sync tick, previous one still running"),
                    Err(err) => warn!(error = %err, "Sync tick failed"),
                }
            }
        }
    }
}
