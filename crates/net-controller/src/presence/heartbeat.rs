//! Presence heartbeat task.
//!
//! One task per authenticated client: an immediate write on spawn, then a
//! write per interval while the surface is foreground-visible. Hiding the
//! surface stops the ticker entirely; becoming visible again writes
//! immediately and restarts the interval, so readers get a fresh timestamp
//! the instant a surface returns to foreground.
//!
//! The task is owned by the client context through its handle and is
//! guaranteed to stop when the cancellation token fires; a best-effort
//! offline write is attempted on the way out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use common::types::{ClientId, MemberId};

use super::{PresenceRecord, PresenceStatus};
use crate::config::Config;
use crate::store::EntityStore;

/// Mutable inputs of the heartbeat, updated through the handle.
#[derive(Debug, Clone)]
struct HeartbeatInputs {
    visible: bool,
    status: PresenceStatus,
    route: String,
}

/// Handle to a running presence heartbeat.
#[derive(Clone)]
pub struct PresenceHeartbeatHandle {
    inputs: Arc<watch::Sender<HeartbeatInputs>>,
    cancel_token: CancellationToken,
}

impl PresenceHeartbeatHandle {
    /// Report a visibility transition of the viewing surface.
    pub fn set_visible(&self, visible: bool) {
        self.inputs.send_modify(|i| i.visible = visible);
    }

    /// Update the status carried by subsequent writes.
    pub fn set_status(&self, status: PresenceStatus) {
        self.inputs.send_modify(|i| i.status = status);
    }

    /// Update the route carried by subsequent writes.
    pub fn set_route(&self, route: impl Into<String>) {
        let route = route.into();
        self.inputs.send_modify(|i| i.route = route);
    }

    /// Stop the heartbeat.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The presence heartbeat task.
pub struct PresenceHeartbeat;

impl PresenceHeartbeat {
    /// Spawn a heartbeat for `(actor, client)` starting visible and online.
    ///
    /// Returns the handle and the task join handle. The task stops when
    /// `cancel_token` fires.
    pub fn spawn(
        store: Arc<dyn EntityStore>,
        actor_id: MemberId,
        client_id: ClientId,
        route: String,
        config: &Config,
        cancel_token: CancellationToken,
    ) -> (PresenceHeartbeatHandle, JoinHandle<()>) {
        let (inputs_tx, inputs_rx) = watch::channel(HeartbeatInputs {
            visible: true,
            status: PresenceStatus::Online,
            route,
        });

        let handle = PresenceHeartbeatHandle {
            inputs: Arc::new(inputs_tx),
            cancel_token: cancel_token.clone(),
        };

        let task = tokio::spawn(run_heartbeat(
            store,
            actor_id,
            client_id,
            config.heartbeat_interval,
            inputs_rx,
            cancel_token,
        ));

        (handle, task)
    }
}

#[instrument(
    skip_all,
    name = "net.presence.heartbeat",
    fields(actor_id = %actor_id, client_id = %client_id)
)]
async fn run_heartbeat(
    store: Arc<dyn EntityStore>,
    actor_id: MemberId,
    client_id: ClientId,
    interval: Duration,
    mut inputs_rx: watch::Receiver<HeartbeatInputs>,
    cancel_token: CancellationToken,
) {
    debug!(
        target: "net.presence",
        interval_secs = interval.as_secs(),
        "Presence heartbeat started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut visible = inputs_rx.borrow().visible;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                // Best-effort: leave an offline record behind; the cleanup
                // sweep removes it once stale.
                let mut record = current_record(&actor_id, &client_id, &inputs_rx);
                record.status = PresenceStatus::Offline;
                if let Err(e) = store.write_presence(record).await {
                    debug!(
                        target: "net.presence",
                        error = %e,
                        "Offline write on teardown failed"
                    );
                }
                break;
            }

            changed = inputs_rx.changed() => {
                if changed.is_err() {
                    // All handles dropped; nothing can update us anymore
                    break;
                }
                let now_visible = inputs_rx.borrow().visible;
                if now_visible && !visible {
                    // Foregrounded: fresh timestamp now, interval restarts
                    write_presence(&store, &actor_id, &client_id, &inputs_rx).await;
                    ticker.reset();
                }
                visible = now_visible;
            }

            _ = ticker.tick(), if visible => {
                write_presence(&store, &actor_id, &client_id, &inputs_rx).await;
            }
        }
    }

    info!(target: "net.presence", "Presence heartbeat stopped");
}

fn current_record(
    actor_id: &MemberId,
    client_id: &ClientId,
    inputs_rx: &watch::Receiver<HeartbeatInputs>,
) -> PresenceRecord {
    let inputs = inputs_rx.borrow();
    PresenceRecord {
        actor_id: actor_id.clone(),
        client_id: client_id.clone(),
        route: inputs.route.clone(),
        status: inputs.status,
        last_activity_at: Utc::now(),
    }
}

async fn write_presence(
    store: &Arc<dyn EntityStore>,
    actor_id: &MemberId,
    client_id: &ClientId,
    inputs_rx: &watch::Receiver<HeartbeatInputs>,
) {
    let record = current_record(actor_id, client_id, inputs_rx);
    if let Err(e) = store.write_presence(record).await {
        // The next tick will retry; presence tolerates missed beats
        warn!(
            target: "net.presence",
            error = %e,
            "Presence write failed"
        );
    }
}
