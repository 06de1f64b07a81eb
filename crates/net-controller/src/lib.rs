//! Cairn voice-net session and access-policy layer.
//!
//! The presentation glue of the platform (dashboards, forms, report panels)
//! calls into this library for everything voice-net shaped:
//!
//! - Canonical room naming (build/parse) for every coordination channel
//! - Net discipline derivation (push-to-talk vs. open mic)
//! - Per-session connection lifecycle in simulated or live transport mode
//! - Policy-gated create/update/close/transfer of voice nets
//! - Operation-stage permission derivation (the single lifecycle authority)
//! - Presence heartbeats with visibility-aware pause/resume and staleness
//!   cleanup, plus reconnect/latency health accounting
//!
//! # Collaborators
//!
//! Persistent entities live in an external store behind [`store::EntityStore`];
//! live-mode transport tokens come from an external issuer behind
//! [`session::TokenMinter`]; the media path itself is opaque to this layer.
//!
//! # Concurrency model
//!
//! One actor-local timeline per session. [`session::SessionEngine`] takes
//! `&mut self` so overlapping join/leave calls cannot be expressed, and a
//! generation counter fences out token mints that resolve after a leave.
//! Background work (heartbeat, presence cleanup) runs as
//! `CancellationToken`-scoped tokio tasks with guaranteed teardown.
//!
//! # Modules
//!
//! - [`identity`] - Room identity codec (canonical names)
//! - [`discipline`] - Net discipline resolver
//! - [`session`] - Connection lifecycle engine
//! - [`governance`] - Voice-net governance service
//! - [`policy`] - Operation stage policy table
//! - [`presence`] - Presence heartbeat, cleanup and connection health
//! - [`store`] - Entity store collaborator trait
//! - [`config`] - Configuration from environment
//! - [`errors`] - Error taxonomy

pub mod config;
pub mod discipline;
pub mod errors;
pub mod governance;
pub mod identity;
pub mod policy;
pub mod presence;
pub mod session;
pub mod store;
