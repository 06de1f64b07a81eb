//! Connection lifecycle engine.
//!
//! One [`SessionEngine`] per `(room, actor)` pairing, driven from a single
//! caller timeline. States run `disconnected -> connecting -> {connected,
//! error}`, with `leave()` legal from anywhere. Mode (`Sim`/`Live`) is global
//! configuration resolved through a TTL-cached [`ModeSource`]; live joins
//! mint a transport token through [`TokenMinter`], simulated joins synthesize
//! a roster locally.
//!
//! The engine manages only the token/identity handshake and reported state;
//! media frames belong to the external transport.

mod engine;
mod mode;

pub use engine::{SessionEngine, SIM_LOCAL_PARTICIPANT_ID};
pub use mode::{CachedModeSource, FixedModeSource, ModeSource};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global connection mode. All rooms obey the same mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Synthetic participants, no external transport. For testing/demo.
    Sim,
    /// Minted transport token plus an external media service.
    Live,
}

/// Connection state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Reported link quality of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
}

/// One participant on a net, synthetic in `Sim` mode or mirrored from the
/// media service roster in `Live` mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub is_local: bool,
    pub audio_level: f32,
    pub connection_quality: ConnectionQuality,
    pub is_transmitting: bool,
}

/// A transport token minted by the external issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedToken {
    pub value: String,
}

/// Failure reported by the token issuer. The message is the provider's own
/// and is surfaced to the caller verbatim inside `Transport`.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct MintError(pub String);

/// External token-issuing collaborator, consumed only in `Live` mode.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint a transport token for `(room_name, identity)`.
    async fn mint(&self, room_name: &str, identity: &str) -> Result<MintedToken, MintError>;
}

/// Minter for deployments that never leave `Sim` mode. Any live join fails
/// with a clear message instead of a hang.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableMinter;

#[async_trait]
impl TokenMinter for UnavailableMinter {
    async fn mint(&self, _room_name: &str, _identity: &str) -> Result<MintedToken, MintError> {
        Err(MintError(
            "live transport is not configured for this deployment".to_string(),
        ))
    }
}
