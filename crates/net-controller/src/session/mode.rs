//! Global connection-mode resolution with bounded caching.
//!
//! Mode lives in configuration that may be remote; sessions consult it on
//! every join but must not hot-loop a liveness check, so fetched values are
//! cached for a bounded TTL. Fetch failures fall back to the last known (or
//! configured) mode rather than blocking a join.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use super::ConnectionMode;
use crate::errors::NetError;

/// Supplies the current global connection mode.
#[async_trait]
pub trait ModeSource: Send + Sync {
    async fn current_mode(&self) -> Result<ConnectionMode, NetError>;
}

/// A mode pinned at construction time - the common case, where mode comes
/// straight from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct FixedModeSource(pub ConnectionMode);

#[async_trait]
impl ModeSource for FixedModeSource {
    async fn current_mode(&self) -> Result<ConnectionMode, NetError> {
        Ok(self.0)
    }
}

/// TTL cache over a [`ModeSource`].
pub struct CachedModeSource {
    source: Arc<dyn ModeSource>,
    ttl: Duration,
    fallback: ConnectionMode,
    cached: Option<(ConnectionMode, Instant)>,
}

impl CachedModeSource {
    #[must_use]
    pub fn new(source: Arc<dyn ModeSource>, ttl: Duration, fallback: ConnectionMode) -> Self {
        Self {
            source,
            ttl,
            fallback,
            cached: None,
        }
    }

    /// Resolve the current mode, consulting the source only when the cached
    /// value has expired. Never fails: a fetch error yields the last known
    /// mode, else the configured fallback.
    pub async fn resolve(&mut self) -> ConnectionMode {
        if let Some((mode, fetched_at)) = self.cached {
            if fetched_at.elapsed() < self.ttl {
                return mode;
            }
        }

        match self.source.current_mode().await {
            Ok(mode) => {
                self.cached = Some((mode, Instant::now()));
                mode
            }
            Err(e) => {
                let mode = self.cached.map_or(self.fallback, |(mode, _)| mode);
                warn!(
                    target: "net.session",
                    error = %e,
                    fallback = ?mode,
                    "Mode fetch failed, using last known mode"
                );
                mode
            }
        }
    }
}
