//! Presence heartbeat and connection health tracking.
//!
//! Each authenticated client writes a presence record immediately on mount
//! and then on a fixed interval while its surface is foreground-visible;
//! hiding the surface pauses the heartbeat and returning to foreground
//! forces a fresh write. A separate sweep prunes records whose activity
//! timestamp exceeds the staleness threshold.
//!
//! Invariant: a record past the staleness threshold is treated as offline by
//! every reader even before the sweep physically deletes it - use
//! [`effective_status`] rather than reading `status` directly.

mod cleanup;
mod health;
mod heartbeat;

pub use cleanup::run_presence_cleanup;
pub use health::{ConnectionHealth, HealthReport};
pub use heartbeat::{PresenceHeartbeat, PresenceHeartbeatHandle};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use common::types::{ClientId, MemberId};

/// Activity status carried by a presence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceStatus {
    Online,
    Idle,
    InCall,
    Transmitting,
    Away,
    Offline,
}

/// Liveness record for one `(actor, client)` pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub actor_id: MemberId,
    pub client_id: ClientId,
    /// The surface the client is viewing, e.g. `/operations/abc123`.
    pub route: String,
    pub status: PresenceStatus,
    pub last_activity_at: DateTime<Utc>,
}

impl PresenceRecord {
    /// Whether this record is older than the staleness threshold at `now`.
    #[must_use]
    pub fn is_stale(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.last_activity_at);
        age > chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::MAX)
    }
}

/// The status readers must report for a record: its recorded status, unless
/// the record has gone stale, in which case `Offline` regardless of what is
/// physically stored.
#[must_use]
pub fn effective_status(
    record: &PresenceRecord,
    threshold: Duration,
    now: DateTime<Utc>,
) -> PresenceStatus {
    if record.is_stale(threshold, now) {
        PresenceStatus::Offline
    } else {
        record.status
    }
}
