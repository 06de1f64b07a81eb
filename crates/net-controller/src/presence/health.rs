//! Connection health accounting for a joined session.
//!
//! Consumed by health/latency UI: tracks connect transitions, reconnect
//! count, last successful connect time and last reported latency. The
//! reconnect count moves only on a `connected -> disconnected -> connected`
//! cycle, never on the initial connect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::session::SessionState;

/// Summarized health of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthReport {
    Ok,
    Degraded,
    Error,
    Offline,
}

/// Per-session connection health tracker.
#[derive(Debug, Clone)]
pub struct ConnectionHealth {
    latency_threshold: Duration,
    connects: u32,
    last_connected_at: Option<DateTime<Utc>>,
    last_latency: Option<Duration>,
}

impl ConnectionHealth {
    #[must_use]
    pub fn new(latency_threshold: Duration) -> Self {
        Self {
            latency_threshold,
            connects: 0,
            last_connected_at: None,
            last_latency: None,
        }
    }

    /// Record a successful transition to `connected`.
    pub fn on_connected(&mut self) {
        self.connects = self.connects.saturating_add(1);
        self.last_connected_at = Some(Utc::now());
    }

    /// Record a latency sample reported by the transport.
    pub fn record_latency(&mut self, latency: Duration) {
        self.last_latency = Some(latency);
    }

    /// Completed reconnects: connects beyond the first.
    #[must_use]
    pub fn reconnect_count(&self) -> u32 {
        self.connects.saturating_sub(1)
    }

    #[must_use]
    pub fn last_connected_at(&self) -> Option<DateTime<Utc>> {
        self.last_connected_at
    }

    #[must_use]
    pub fn last_latency(&self) -> Option<Duration> {
        self.last_latency
    }

    /// Summarize health for the given session state.
    ///
    /// `Degraded` while reconnecting (connecting again after a prior
    /// connect) or when the last latency sample exceeds the threshold while
    /// joined; `Error` mirrors the lifecycle engine's error state.
    #[must_use]
    pub fn report(&self, state: SessionState) -> HealthReport {
        match state {
            SessionState::Error => HealthReport::Error,
            SessionState::Disconnected => HealthReport::Offline,
            SessionState::Connecting => {
                if self.connects > 0 {
                    HealthReport::Degraded
                } else {
                    HealthReport::Ok
                }
            }
            SessionState::Connected => {
                if self.last_latency.is_some_and(|l| l > self.latency_threshold) {
                    HealthReport::Degraded
                } else {
                    HealthReport::Ok
                }
            }
        }
    }
}
