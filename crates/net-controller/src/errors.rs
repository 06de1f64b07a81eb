//! Voice-net layer error types.
//!
//! Every failure in this layer lands in a recoverable state: sessions end up
//! `Disconnected` or `Error` (both re-joinable) and governance actions are
//! atomic from the caller's perspective. Internal detail is logged server-side
//! and kept out of user-facing strings.

use common::error::CommonError;
use thiserror::Error;

/// Voice-net layer error type.
#[derive(Debug, Error)]
pub enum NetError {
    /// Malformed room-naming input. Local to the caller that built it.
    #[error("Invalid room identity: {0}")]
    InvalidIdentity(String),

    /// Actor lacks authority for the requested action. The reason is
    /// surfaced to the user verbatim.
    #[error("Policy blocked: {reason}")]
    PolicyBlocked { reason: String },

    /// Stale or bad id. Retryable from the user's point of view.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token mint or media handoff failed. The session transitions to
    /// `Error` rather than silently retrying.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Governance path degraded to a direct read; partial data is attached
    /// to the outcome. A non-blocking warning, not a destructive error.
    #[error("Stale read: {0}")]
    StaleRead(String),

    /// A join was requested while another join on the same session was
    /// still in flight. Caller contract violation.
    #[error("Join already in flight")]
    JoinInFlight,

    /// A leave raced the in-flight join; the mint result was discarded.
    #[error("Join superseded by leave")]
    JoinSuperseded,

    /// Entity store collaborator failed.
    #[error(transparent)]
    Store(#[from] CommonError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NetError {
    /// Returns a user-safe message (no internal details).
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NetError::InvalidIdentity(_) => "Invalid room name".to_string(),
            NetError::PolicyBlocked { reason } => reason.clone(),
            NetError::NotFound(_) => "Not found - it may have been removed".to_string(),
            NetError::Transport(msg) => format!("Connection failed: {msg}"),
            NetError::StaleRead(_) => "Showing possibly stale data".to_string(),
            NetError::JoinInFlight => "A join is already in progress".to_string(),
            NetError::JoinSuperseded => "Join was cancelled".to_string(),
            NetError::Store(_) | NetError::Config(_) | NetError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    /// Whether the user may simply retry the action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetError::NotFound(_)
                | NetError::Transport(_)
                | NetError::StaleRead(_)
                | NetError::Store(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_reason_surfaced_verbatim() {
        let err = NetError::PolicyBlocked {
            reason: "Only the net owner can close this net".to_string(),
        };
        assert_eq!(err.user_message(), "Only the net owner can close this net");
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = NetError::Store(CommonError::Store(
            "write rejected by replica at 10.0.3.7".to_string(),
        ));
        assert!(!err.user_message().contains("10.0.3.7"));
        assert_eq!(err.user_message(), "An internal error occurred");
    }

    #[test]
    fn test_transport_failure_carries_provider_message() {
        let err = NetError::Transport("mint rejected: quota exceeded".to_string());
        assert!(err.user_message().contains("quota exceeded"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(NetError::NotFound("net-1".to_string()).is_retryable());
        assert!(NetError::Transport("x".to_string()).is_retryable());
        assert!(!NetError::JoinInFlight.is_retryable());
        assert!(!NetError::PolicyBlocked {
            reason: "no".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            NetError::InvalidIdentity("empty net code".to_string()).to_string(),
            "Invalid room identity: empty net code"
        );
        assert_eq!(
            NetError::JoinInFlight.to_string(),
            "Join already in flight"
        );
    }
}
