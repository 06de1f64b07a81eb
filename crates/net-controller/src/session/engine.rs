//! Per-session connection state machine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use super::mode::{CachedModeSource, FixedModeSource, ModeSource};
use super::{ConnectionMode, ConnectionQuality, MintedToken, Participant, SessionState, TokenMinter};
use crate::config::Config;
use crate::errors::NetError;
use crate::presence::{ConnectionHealth, HealthReport};

/// Participant id the engine assigns to the local caller in `Sim` mode.
pub const SIM_LOCAL_PARTICIPANT_ID: &str = "local";

/// Callsigns used for synthetic participants.
const SIM_CALLSIGNS: &[&str] = &[
    "Dispatch",
    "Rover",
    "Lookout",
    "Relay",
    "Medic",
    "Scout",
    "Quartermaster",
    "Runner",
    "Warden",
    "Signal",
];

/// Connection lifecycle engine for one `(room, actor)` session.
///
/// Driven from a single caller timeline: methods take `&mut self`, so
/// overlapping join/leave calls cannot be expressed. A generation counter
/// additionally fences out transport results that arrive after a `leave()`
/// (the stale-result guard): every suspension is followed by a generation
/// check, and the live-mode handoff acknowledgement carries the generation
/// of the join that started it.
pub struct SessionEngine {
    room_name: String,
    identity: String,
    display_name: String,
    minter: Arc<dyn TokenMinter>,
    mode: CachedModeSource,
    sim_participants_min: u8,
    sim_participants_max: u8,
    sim_activity_variance: f32,
    state: SessionState,
    token: Option<MintedToken>,
    participants: Vec<Participant>,
    last_error: Option<String>,
    generation: u64,
    pending_join: Option<u64>,
    health: ConnectionHealth,
}

impl SessionEngine {
    /// Create an engine resolving mode through `mode_source`.
    #[must_use]
    pub fn new(
        room_name: impl Into<String>,
        identity: impl Into<String>,
        display_name: impl Into<String>,
        minter: Arc<dyn TokenMinter>,
        mode_source: Arc<dyn ModeSource>,
        config: &Config,
    ) -> Self {
        Self {
            room_name: room_name.into(),
            identity: identity.into(),
            display_name: display_name.into(),
            minter,
            mode: CachedModeSource::new(mode_source, config.mode_cache_ttl, config.mode),
            sim_participants_min: config.sim_participants_min,
            sim_participants_max: config.sim_participants_max,
            sim_activity_variance: config.sim_activity_variance,
            state: SessionState::Disconnected,
            token: None,
            participants: Vec::new(),
            last_error: None,
            generation: 0,
            pending_join: None,
            health: ConnectionHealth::new(config.latency_degraded),
        }
    }

    /// Create an engine whose mode is pinned to the configured value.
    #[must_use]
    pub fn with_config_mode(
        room_name: impl Into<String>,
        identity: impl Into<String>,
        display_name: impl Into<String>,
        minter: Arc<dyn TokenMinter>,
        config: &Config,
    ) -> Self {
        Self::new(
            room_name,
            identity,
            display_name,
            minter,
            Arc::new(FixedModeSource(config.mode)),
            config,
        )
    }

    /// Join the room.
    ///
    /// In `Sim` mode this synthesizes a roster and lands in `Connected`.
    /// In `Live` mode this mints a transport token and stays `Connecting`
    /// until the media collaborator acknowledges the handoff via
    /// [`transport_established`](Self::transport_established). Returns the
    /// resulting state.
    ///
    /// # Errors
    ///
    /// - `JoinInFlight` if a join is already in progress (caller contract:
    ///   at most one outstanding join per session)
    /// - `Transport` if token minting fails; the session lands in `Error`
    /// - `JoinSuperseded` if a `leave()` fenced this attempt out
    #[instrument(skip_all, name = "net.session.join", fields(room = %self.room_name))]
    pub async fn join(&mut self) -> Result<SessionState, NetError> {
        match self.state {
            SessionState::Connecting => return Err(NetError::JoinInFlight),
            SessionState::Connected => {
                return Err(NetError::Internal(
                    "already connected; leave before rejoining".to_string(),
                ))
            }
            SessionState::Disconnected | SessionState::Error => {}
        }

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        self.state = SessionState::Connecting;
        self.last_error = None;

        let mode = self.mode.resolve().await;
        if self.generation != generation {
            return Err(NetError::JoinSuperseded);
        }

        match mode {
            ConnectionMode::Sim => {
                self.participants = self.synthesize_roster();
                self.token = None;
                self.state = SessionState::Connected;
                self.health.on_connected();
                info!(
                    target: "net.session",
                    room = %self.room_name,
                    participants = self.participants.len(),
                    "Joined in sim mode"
                );
                Ok(SessionState::Connected)
            }
            ConnectionMode::Live => {
                match self.minter.mint(&self.room_name, &self.identity).await {
                    Ok(token) => {
                        if self.generation != generation {
                            // A leave raced the mint; the token must not
                            // be applied
                            debug!(
                                target: "net.session",
                                room = %self.room_name,
                                "Discarding mint result from superseded join"
                            );
                            return Err(NetError::JoinSuperseded);
                        }
                        self.token = Some(token);
                        self.pending_join = Some(generation);
                        info!(
                            target: "net.session",
                            room = %self.room_name,
                            "Token minted, awaiting transport handoff"
                        );
                        Ok(SessionState::Connecting)
                    }
                    Err(e) => {
                        if self.generation != generation {
                            return Err(NetError::JoinSuperseded);
                        }
                        self.state = SessionState::Error;
                        self.last_error = Some(e.0.clone());
                        warn!(
                            target: "net.session",
                            room = %self.room_name,
                            error = %e,
                            "Token mint failed"
                        );
                        Err(NetError::Transport(e.0))
                    }
                }
            }
        }
    }

    /// Acknowledge the external media transport handoff for the join that
    /// minted the current token.
    ///
    /// # Errors
    ///
    /// `JoinSuperseded` if no join is pending or a `leave()` fenced the
    /// pending one out; the session state is not touched in that case.
    pub fn transport_established(&mut self) -> Result<SessionState, NetError> {
        match self.pending_join {
            Some(generation)
                if generation == self.generation && self.state == SessionState::Connecting =>
            {
                self.pending_join = None;
                self.state = SessionState::Connected;
                self.health.on_connected();
                info!(
                    target: "net.session",
                    room = %self.room_name,
                    "Transport established"
                );
                Ok(SessionState::Connected)
            }
            _ => Err(NetError::JoinSuperseded),
        }
    }

    /// Report a transport failure (failed handoff or mid-call drop). The
    /// session lands in `Error` and stays re-joinable.
    pub fn transport_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if matches!(
            self.state,
            SessionState::Connecting | SessionState::Connected
        ) {
            warn!(
                target: "net.session",
                room = %self.room_name,
                reason = %reason,
                "Transport failed"
            );
            self.pending_join = None;
            self.state = SessionState::Error;
            self.last_error = Some(reason);
        }
    }

    /// Mirror the media service's reported roster (live mode). Ignored while
    /// disconnected.
    pub fn set_reported_roster(&mut self, participants: Vec<Participant>) {
        if self.state != SessionState::Disconnected {
            self.participants = participants;
        }
    }

    /// Record a latency sample reported by the transport.
    pub fn record_latency(&mut self, latency: Duration) {
        self.health.record_latency(latency);
    }

    /// Leave the room. Legal from any state and idempotent: resets to
    /// `Disconnected`, clears token and roster, and fences out any result
    /// still in flight.
    pub fn leave(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending_join = None;
        self.state = SessionState::Disconnected;
        self.token = None;
        self.participants.clear();
        self.last_error = None;
        debug!(target: "net.session", room = %self.room_name, "Left room");
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    #[must_use]
    pub fn token(&self) -> Option<&MintedToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Completed reconnects; the initial connect does not count.
    #[must_use]
    pub fn reconnect_count(&self) -> u32 {
        self.health.reconnect_count()
    }

    #[must_use]
    pub fn last_connected_at(&self) -> Option<DateTime<Utc>> {
        self.health.last_connected_at()
    }

    /// Summarized health for UI consumers.
    #[must_use]
    pub fn health_report(&self) -> HealthReport {
        self.health.report(self.state)
    }

    /// Synthesize a sim roster: total size uniform within the configured
    /// range, the local caller first and flagged, random activity levels.
    fn synthesize_roster(&self) -> Vec<Participant> {
        let mut rng = rand::thread_rng();
        let size = usize::from(
            rng.gen_range(self.sim_participants_min..=self.sim_participants_max),
        );

        let mut roster = Vec::with_capacity(size);
        roster.push(Participant {
            id: SIM_LOCAL_PARTICIPANT_ID.to_string(),
            name: self.display_name.clone(),
            is_local: true,
            audio_level: 0.0,
            connection_quality: ConnectionQuality::Excellent,
            is_transmitting: false,
        });

        for i in 1..size {
            let callsign = SIM_CALLSIGNS
                .get((i - 1) % SIM_CALLSIGNS.len())
                .copied()
                .unwrap_or("Station");
            let cycle = (i - 1) / SIM_CALLSIGNS.len();
            let name = if cycle == 0 {
                callsign.to_string()
            } else {
                format!("{callsign} {}", cycle + 1)
            };

            roster.push(Participant {
                id: format!("sim-{i}"),
                name,
                is_local: false,
                audio_level: rng.gen::<f32>() * self.sim_activity_variance,
                connection_quality: match rng.gen_range(0..10u8) {
                    0..=1 => ConnectionQuality::Poor,
                    2..=5 => ConnectionQuality::Good,
                    _ => ConnectionQuality::Excellent,
                },
                is_transmitting: false,
            });
        }

        roster
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::session::{MintError, UnavailableMinter};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct OkMinter;

    #[async_trait]
    impl TokenMinter for OkMinter {
        async fn mint(&self, room_name: &str, identity: &str) -> Result<MintedToken, MintError> {
            Ok(MintedToken {
                value: format!("token:{room_name}:{identity}"),
            })
        }
    }

    struct FailingMinter;

    #[async_trait]
    impl TokenMinter for FailingMinter {
        async fn mint(&self, _room: &str, _identity: &str) -> Result<MintedToken, MintError> {
            Err(MintError("issuer rejected the request".to_string()))
        }
    }

    fn sim_config() -> Config {
        Config::default()
    }

    fn live_config() -> Config {
        let vars = HashMap::from([("NET_MODE".to_string(), "live".to_string())]);
        Config::from_vars(&vars).unwrap()
    }

    fn sim_engine() -> SessionEngine {
        SessionEngine::with_config_mode(
            "op-abc123-command",
            "member-1",
            "Jamie",
            Arc::new(UnavailableMinter),
            &sim_config(),
        )
    }

    #[tokio::test]
    async fn test_sim_join_roster_within_range_with_one_local() {
        // Property: sim roster size in [min,max], exactly one local
        let config = sim_config();
        for _ in 0..20 {
            let mut engine = sim_engine();
            assert_eq!(engine.join().await.unwrap(), SessionState::Connected);

            let count = engine.participants().len();
            assert!(count >= usize::from(config.sim_participants_min));
            assert!(count <= usize::from(config.sim_participants_max));

            let locals = engine.participants().iter().filter(|p| p.is_local).count();
            assert_eq!(locals, 1);

            let first = engine.participants().first().unwrap();
            assert!(first.is_local);
            assert_eq!(first.name, "Jamie");
        }
    }

    #[tokio::test]
    async fn test_sim_join_has_no_token() {
        let mut engine = sim_engine();
        engine.join().await.unwrap();
        assert!(engine.token().is_none());
    }

    #[tokio::test]
    async fn test_live_mint_failure_lands_in_error_never_connected() {
        let mut engine = SessionEngine::with_config_mode(
            "org-command",
            "member-1",
            "Jamie",
            Arc::new(FailingMinter),
            &live_config(),
        );

        let err = engine.join().await.unwrap_err();
        assert!(matches!(err, NetError::Transport(_)));
        assert_eq!(engine.state(), SessionState::Error);
        assert_eq!(engine.last_error(), Some("issuer rejected the request"));
        assert!(engine.token().is_none());
        assert_eq!(engine.health_report(), HealthReport::Error);
    }

    #[tokio::test]
    async fn test_live_join_connects_after_handoff() {
        let mut engine = SessionEngine::with_config_mode(
            "org-command",
            "member-1",
            "Jamie",
            Arc::new(OkMinter),
            &live_config(),
        );

        assert_eq!(engine.join().await.unwrap(), SessionState::Connecting);
        assert_eq!(
            engine.token().map(|t| t.value.as_str()),
            Some("token:org-command:member-1")
        );

        assert_eq!(
            engine.transport_established().unwrap(),
            SessionState::Connected
        );
        assert_eq!(engine.health_report(), HealthReport::Ok);
    }

    #[tokio::test]
    async fn test_join_while_connecting_is_rejected() {
        let mut engine = SessionEngine::with_config_mode(
            "org-command",
            "member-1",
            "Jamie",
            Arc::new(OkMinter),
            &live_config(),
        );

        engine.join().await.unwrap();
        assert_eq!(engine.state(), SessionState::Connecting);

        let err = engine.join().await.unwrap_err();
        assert!(matches!(err, NetError::JoinInFlight));
    }

    #[tokio::test]
    async fn test_leave_fences_out_stale_handoff() {
        let mut engine = SessionEngine::with_config_mode(
            "org-command",
            "member-1",
            "Jamie",
            Arc::new(OkMinter),
            &live_config(),
        );

        engine.join().await.unwrap();
        engine.leave();

        // The handoff acknowledgement for the fenced-out join is discarded
        let err = engine.transport_established().unwrap_err();
        assert!(matches!(err, NetError::JoinSuperseded));
        assert_eq!(engine.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_leave_is_idempotent_and_always_legal() {
        let mut engine = sim_engine();

        engine.leave();
        assert_eq!(engine.state(), SessionState::Disconnected);

        engine.join().await.unwrap();
        engine.leave();
        engine.leave();
        assert_eq!(engine.state(), SessionState::Disconnected);
        assert!(engine.participants().is_empty());
        assert!(engine.token().is_none());
        assert!(engine.last_error().is_none());
    }

    #[tokio::test]
    async fn test_reconnect_count_skips_initial_connect() {
        // Property: reconnects increment only on a second connected
        // transition
        let mut engine = sim_engine();

        engine.join().await.unwrap();
        assert_eq!(engine.reconnect_count(), 0);

        engine.leave();
        engine.join().await.unwrap();
        assert_eq!(engine.reconnect_count(), 1);

        engine.leave();
        engine.join().await.unwrap();
        assert_eq!(engine.reconnect_count(), 2);
    }

    #[tokio::test]
    async fn test_rejoin_after_error_is_legal() {
        let mut engine = SessionEngine::with_config_mode(
            "org-command",
            "member-1",
            "Jamie",
            Arc::new(FailingMinter),
            &live_config(),
        );

        assert!(engine.join().await.is_err());
        assert_eq!(engine.state(), SessionState::Error);

        // Error is a re-joinable state
        assert!(engine.join().await.is_err());
        assert_eq!(engine.state(), SessionState::Error);
    }

    #[tokio::test]
    async fn test_transport_failure_mid_call() {
        let mut engine = sim_engine();
        engine.join().await.unwrap();

        engine.transport_failed("media path dropped");
        assert_eq!(engine.state(), SessionState::Error);
        assert_eq!(engine.last_error(), Some("media path dropped"));
        assert_eq!(engine.health_report(), HealthReport::Error);
    }

    #[tokio::test]
    async fn test_latency_degrades_health_while_joined() {
        let mut engine = sim_engine();
        engine.join().await.unwrap();

        engine.record_latency(Duration::from_millis(100));
        assert_eq!(engine.health_report(), HealthReport::Ok);

        engine.record_latency(Duration::from_millis(500));
        assert_eq!(engine.health_report(), HealthReport::Degraded);
    }

    #[tokio::test]
    async fn test_reported_roster_ignored_when_disconnected() {
        let mut engine = sim_engine();
        engine.set_reported_roster(vec![Participant {
            id: "p1".to_string(),
            name: "Remote".to_string(),
            is_local: false,
            audio_level: 0.0,
            connection_quality: ConnectionQuality::Good,
            is_transmitting: false,
        }]);
        assert!(engine.participants().is_empty());
    }
}
