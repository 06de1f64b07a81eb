//! Entity store collaborator trait.
//!
//! Persistent entities (voice nets, presence records) live in an external
//! managed store. This layer treats it as a black box with eventual external
//! consistency: per-call atomicity only, no transactions across entities.
//!
//! `query_nets` is the governance read path (filtered and sorted server-side);
//! `scan_nets` is the raw read the degraded list path falls back to when the
//! governance path is unreachable.

use async_trait::async_trait;
use common::error::Result;
use common::types::{ClientId, MemberId, NetId};

use crate::governance::VoiceNet;
use crate::presence::PresenceRecord;

/// External entity store, one call per entity operation.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one net by id.
    async fn fetch_net(&self, id: &NetId) -> Result<Option<VoiceNet>>;

    /// Governance read path: nets filtered by linked scope, sorted by
    /// priority then code.
    async fn query_nets(&self, scope_id: Option<&str>) -> Result<Vec<VoiceNet>>;

    /// Raw best-effort read of the same records, used only when the
    /// governance path degrades.
    async fn scan_nets(&self, scope_id: Option<&str>) -> Result<Vec<VoiceNet>>;

    /// Insert a new net record.
    async fn insert_net(&self, net: VoiceNet) -> Result<VoiceNet>;

    /// Replace an existing net record.
    async fn update_net(&self, net: VoiceNet) -> Result<VoiceNet>;

    /// Upsert the presence record for `(actor, client)`.
    async fn write_presence(&self, record: PresenceRecord) -> Result<()>;

    /// Remove the presence record for `(actor, client)`. Absent records are
    /// not an error.
    async fn delete_presence(&self, actor_id: &MemberId, client_id: &ClientId) -> Result<()>;

    /// All presence records currently stored.
    async fn list_presence(&self) -> Result<Vec<PresenceRecord>>;
}
