//! Presence cleanup background task.
//!
//! Periodically prunes presence records whose `last_activity_at` exceeds the
//! staleness threshold, regardless of recorded status. Readers already treat
//! stale records as offline (see [`super::effective_status`]); this sweep
//! keeps the store from accumulating them.
//!
//! # Graceful Shutdown
//!
//! The task supports graceful shutdown via a cancellation token. When the
//! token is cancelled, the task completes its current iteration and exits
//! cleanly.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::store::EntityStore;

/// Start the presence cleanup background task.
///
/// Runs a prune pass every `interval`, deleting records older than
/// `staleness_threshold`. Store errors are logged and the loop continues -
/// the store might recover.
///
/// Returns when the cancellation token is triggered.
#[instrument(skip_all, name = "net.task.presence_cleanup")]
pub async fn run_presence_cleanup(
    store: Arc<dyn EntityStore>,
    staleness_threshold: Duration,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    info!(
        target: "net.task.presence_cleanup",
        staleness_secs = staleness_threshold.as_secs(),
        interval_secs = interval.as_secs(),
        "Starting presence cleanup task"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match prune_stale(&store, staleness_threshold).await {
                    Ok(count) => {
                        if count > 0 {
                            info!(
                                target: "net.task.presence_cleanup",
                                pruned = count,
                                "Pruned stale presence records"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            target: "net.task.presence_cleanup",
                            error = %e,
                            "Presence cleanup pass failed"
                        );
                    }
                }
            }
            () = cancel_token.cancelled() => {
                info!(
                    target: "net.task.presence_cleanup",
                    "Presence cleanup task received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(target: "net.task.presence_cleanup", "Presence cleanup task stopped");
}

/// Delete every record older than the threshold. Returns the number pruned.
async fn prune_stale(
    store: &Arc<dyn EntityStore>,
    threshold: Duration,
) -> common::error::Result<u64> {
    let now = Utc::now();
    let mut pruned = 0u64;

    for record in store.list_presence().await? {
        if record.is_stale(threshold, now) {
            store
                .delete_presence(&record.actor_id, &record.client_id)
                .await?;
            pruned = pruned.saturating_add(1);
        }
    }

    Ok(pruned)
}
