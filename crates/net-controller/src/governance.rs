//! Voice-net governance service.
//!
//! Nets are created, edited, closed and transferred only through this
//! service. Every action is policy-checked, atomic from the caller's
//! perspective, and answers over a stable envelope so callers never branch on
//! raw store shapes. Reads degrade to a best-effort direct scan (bounded
//! wait) when the governance path is unreachable, surfacing stale data as a
//! warning rather than an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use common::types::{MemberId, NetId};

use crate::config::Config;
use crate::discipline::NetDiscipline;
use crate::errors::NetError;
use crate::identity::{RoomIdentity, RoomScope};
use crate::store::EntityStore;

/// Priority assigned when a net is created without one. Lower sorts first.
pub const DEFAULT_NET_PRIORITY: i32 = 100;

/// Net code used when provisioning a squad's default net.
pub const DEFAULT_SQUAD_NET_CODE: &str = "tac";

/// Lifecycle status of a net. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetStatus {
    Active,
    Closed,
}

/// A voice coordination channel.
///
/// Mutated exclusively through [`GovernanceService`] actions; UI state holds
/// copies, never the record of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceNet {
    pub id: NetId,
    /// Short net code, lowercase after normalization (e.g. `tac1`).
    pub code: String,
    /// Human-facing label.
    pub label: String,
    pub lifecycle_scope: RoomScope,
    pub owner_member_id: Option<MemberId>,
    pub status: NetStatus,
    /// Per-net discipline override; `None` derives from the operation type.
    pub discipline: Option<NetDiscipline>,
    pub priority: i32,
    /// Id of the operation or squad this net is linked to, if any.
    pub linked_scope_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VoiceNet {
    /// Canonical room identity of this net, derived from its scope, linked
    /// scope id and code. Two active nets must never share it.
    pub fn canonical_identity(&self) -> Result<String, NetError> {
        let identity = RoomIdentity {
            scope: self.lifecycle_scope,
            net: self.code.clone(),
            op_id: match self.lifecycle_scope {
                RoomScope::Op => self.linked_scope_id.clone(),
                _ => None,
            },
            squad_slug: match self.lifecycle_scope {
                RoomScope::Squad => self.linked_scope_id.clone(),
                _ => None,
            },
        };
        identity.canonical_name()
    }
}

/// Organizational rank of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRank {
    Founder,
    Steward,
    Member,
}

/// The actor context governance actions evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceActor {
    pub member_id: MemberId,
    pub rank: MemberRank,
    pub is_admin: bool,
}

impl GovernanceActor {
    /// Founder rank or administrator: may change a net's discipline.
    #[must_use]
    pub fn can_override_discipline(&self) -> bool {
        self.is_admin || self.rank == MemberRank::Founder
    }

    /// Whether this actor may create a net at the given scope.
    /// Organization-wide nets are limited to founders and administrators.
    #[must_use]
    pub fn can_create_scope(&self, scope: RoomScope) -> bool {
        match scope {
            RoomScope::Org => self.is_admin || self.rank == MemberRank::Founder,
            RoomScope::Squad | RoomScope::Op => true,
        }
    }

    /// Whether this actor may mutate the given net: its owner or an
    /// administrator.
    #[must_use]
    pub fn can_mutate(&self, net: &VoiceNet) -> bool {
        self.is_admin || net.owner_member_id.as_ref() == Some(&self.member_id)
    }
}

/// Input for creating a net.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNetInput {
    pub code: String,
    pub label: String,
    pub lifecycle_scope: RoomScope,
    #[serde(default)]
    pub discipline: Option<NetDiscipline>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub linked_scope_id: Option<String>,
    /// Defaults to the creating actor.
    #[serde(default)]
    pub owner_member_id: Option<MemberId>,
}

/// Partial update for a net. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNetInput {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    /// Set the discipline override.
    #[serde(default)]
    pub discipline: Option<NetDiscipline>,
    /// Clear the override so discipline derives from the operation type
    /// again. Wins over `discipline` if both are set.
    #[serde(default)]
    pub clear_discipline: bool,
}

impl UpdateNetInput {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.label.is_some()
            || self.priority.is_some()
            || self.discipline.is_some()
            || self.clear_discipline
    }

    #[must_use]
    fn touches_discipline(&self) -> bool {
        self.discipline.is_some() || self.clear_discipline
    }
}

/// Stable envelope for single-net governance actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<VoiceNet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

impl NetActionOutcome {
    #[must_use]
    pub fn ok(net: VoiceNet) -> Self {
        Self {
            success: true,
            net: Some(net),
            error: None,
            blocked_reason: None,
        }
    }

    #[must_use]
    fn from_error(err: &NetError) -> Self {
        let blocked_reason = match err {
            NetError::PolicyBlocked { reason } => Some(reason.clone()),
            _ => None,
        };
        Self {
            success: false,
            net: None,
            error: Some(err.user_message()),
            blocked_reason,
        }
    }
}

impl From<Result<VoiceNet, NetError>> for NetActionOutcome {
    fn from(result: Result<VoiceNet, NetError>) -> Self {
        match result {
            Ok(net) => Self::ok(net),
            Err(err) => Self::from_error(&err),
        }
    }
}

/// Stable envelope for net listings. `success: false` with non-empty `nets`
/// means a stale best-effort read, not a hard failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetListOutcome {
    pub success: bool,
    pub nets: Vec<VoiceNet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Mediates every net mutation against policy.
pub struct GovernanceService<S: EntityStore> {
    store: Arc<S>,
    fallback_timeout: Duration,
}

impl<S: EntityStore> GovernanceService<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: &Config) -> Self {
        Self {
            store,
            fallback_timeout: config.governance_fallback_timeout,
        }
    }

    /// List nets, optionally scoped to one event/operation.
    ///
    /// Never fails hard: if the governance path is unreachable this degrades
    /// to a direct scan under a bounded wait and flags the result as stale.
    #[instrument(skip_all, name = "net.governance.list", fields(scope = ?scope_id))]
    pub async fn list_nets(&self, scope_id: Option<&str>) -> NetListOutcome {
        match self.store.query_nets(scope_id).await {
            Ok(nets) => NetListOutcome {
                success: true,
                nets: nets.into_iter().map(normalize_net).collect(),
                error: None,
            },
            Err(query_err) => {
                warn!(
                    target: "net.governance",
                    error = %query_err,
                    "Governance list path failed, degrading to direct scan"
                );

                match tokio::time::timeout(self.fallback_timeout, self.store.scan_nets(scope_id))
                    .await
                {
                    Ok(Ok(nets)) => {
                        let stale = NetError::StaleRead(query_err.to_string());
                        NetListOutcome {
                            success: false,
                            nets: nets.into_iter().map(normalize_net).collect(),
                            error: Some(stale.user_message()),
                        }
                    }
                    Ok(Err(scan_err)) => {
                        warn!(
                            target: "net.governance",
                            error = %scan_err,
                            "Direct scan fallback failed"
                        );
                        NetListOutcome {
                            success: false,
                            nets: Vec::new(),
                            error: Some(NetError::Store(scan_err).user_message()),
                        }
                    }
                    Err(_) => {
                        warn!(
                            target: "net.governance",
                            timeout_ms = self.fallback_timeout.as_millis() as u64,
                            "Direct scan fallback timed out, skipping"
                        );
                        NetListOutcome {
                            success: false,
                            nets: Vec::new(),
                            error: Some("Net directory is temporarily unavailable".to_string()),
                        }
                    }
                }
            }
        }
    }

    /// Create a net, idempotently on canonical identity: if an active net
    /// with the same identity exists it is returned unchanged.
    #[instrument(skip_all, name = "net.governance.create", fields(actor = %actor.member_id))]
    pub async fn create_net(
        &self,
        actor: &GovernanceActor,
        input: CreateNetInput,
    ) -> NetActionOutcome {
        self.do_create(actor, input).await.into()
    }

    async fn do_create(
        &self,
        actor: &GovernanceActor,
        input: CreateNetInput,
    ) -> Result<VoiceNet, NetError> {
        if !actor.can_create_scope(input.lifecycle_scope) {
            return Err(NetError::PolicyBlocked {
                reason: "Only founders or administrators can create organization-wide nets"
                    .to_string(),
            });
        }

        let candidate = normalize_net(VoiceNet {
            id: NetId::new(),
            code: input.code,
            label: input.label,
            lifecycle_scope: input.lifecycle_scope,
            owner_member_id: input
                .owner_member_id
                .or_else(|| Some(actor.member_id.clone())),
            status: NetStatus::Active,
            discipline: input.discipline,
            priority: input.priority.unwrap_or(DEFAULT_NET_PRIORITY),
            linked_scope_id: input.linked_scope_id,
            created_at: Utc::now(),
        });

        let identity = candidate.canonical_identity()?;

        // Idempotency: an existing active net with the same canonical
        // identity is the result, not a conflict. Closed nets do not match,
        // which is how an administrator recreates one.
        let existing = self
            .store
            .query_nets(candidate.linked_scope_id.as_deref())
            .await?;
        for net in existing {
            if net.status == NetStatus::Active && net.canonical_identity()? == identity {
                info!(
                    target: "net.governance",
                    net_id = %net.id,
                    identity = %identity,
                    "Create matched existing active net, returning it"
                );
                return Ok(normalize_net(net));
            }
        }

        let created = self.store.insert_net(candidate).await?;
        info!(
            target: "net.governance",
            net_id = %created.id,
            identity = %identity,
            actor = %actor.member_id,
            "Net created"
        );
        Ok(normalize_net(created))
    }

    /// Update a net's label, priority or discipline override.
    #[instrument(skip_all, name = "net.governance.update", fields(net_id = %id, actor = %actor.member_id))]
    pub async fn update_net(
        &self,
        actor: &GovernanceActor,
        id: &NetId,
        input: UpdateNetInput,
    ) -> NetActionOutcome {
        self.do_update(actor, id, input).await.into()
    }

    async fn do_update(
        &self,
        actor: &GovernanceActor,
        id: &NetId,
        input: UpdateNetInput,
    ) -> Result<VoiceNet, NetError> {
        if !input.has_changes() {
            return Err(NetError::Internal("no changes provided".to_string()));
        }

        let mut net = self.fetch_required(id).await?;
        self.require_mutable(actor, &net)?;

        if input.touches_discipline() && !actor.can_override_discipline() {
            return Err(NetError::PolicyBlocked {
                reason: "Only founders or administrators can change net discipline".to_string(),
            });
        }

        if let Some(label) = input.label {
            net.label = label;
        }
        if let Some(priority) = input.priority {
            net.priority = priority;
        }
        if input.clear_discipline {
            net.discipline = None;
        } else if let Some(discipline) = input.discipline {
            net.discipline = Some(discipline);
        }

        let updated = self.store.update_net(normalize_net(net)).await?;
        info!(target: "net.governance", net_id = %updated.id, "Net updated");
        Ok(normalize_net(updated))
    }

    /// Close a net. Terminal: a closed net accepts no further mutation.
    /// Closing an already-closed net is a no-op success.
    #[instrument(skip_all, name = "net.governance.close", fields(net_id = %id, actor = %actor.member_id))]
    pub async fn close_net(&self, actor: &GovernanceActor, id: &NetId) -> NetActionOutcome {
        self.do_close(actor, id).await.into()
    }

    async fn do_close(&self, actor: &GovernanceActor, id: &NetId) -> Result<VoiceNet, NetError> {
        let mut net = self.fetch_required(id).await?;

        if net.status == NetStatus::Closed {
            return Ok(normalize_net(net));
        }

        if !actor.can_mutate(&net) {
            return Err(NetError::PolicyBlocked {
                reason: "Only the net owner or an administrator can close this net".to_string(),
            });
        }

        net.status = NetStatus::Closed;
        let closed = self.store.update_net(normalize_net(net)).await?;
        info!(target: "net.governance", net_id = %closed.id, "Net closed");
        Ok(normalize_net(closed))
    }

    /// Transfer ownership of a net.
    #[instrument(skip_all, name = "net.governance.transfer", fields(net_id = %id, actor = %actor.member_id))]
    pub async fn transfer_owner(
        &self,
        actor: &GovernanceActor,
        id: &NetId,
        new_owner: MemberId,
    ) -> NetActionOutcome {
        self.do_transfer(actor, id, new_owner).await.into()
    }

    async fn do_transfer(
        &self,
        actor: &GovernanceActor,
        id: &NetId,
        new_owner: MemberId,
    ) -> Result<VoiceNet, NetError> {
        let mut net = self.fetch_required(id).await?;
        self.require_mutable(actor, &net)?;

        net.owner_member_id = Some(new_owner.clone());
        let updated = self.store.update_net(normalize_net(net)).await?;
        info!(
            target: "net.governance",
            net_id = %updated.id,
            new_owner = %new_owner,
            "Net ownership transferred"
        );
        Ok(normalize_net(updated))
    }

    /// Best-effort provisioning of a squad's default tactical net.
    ///
    /// Used when a squad is set up: nice to have, never worth blocking the
    /// caller for. The whole attempt runs under the bounded wait and
    /// degrades to skip (`None`) on timeout, policy block or store failure.
    /// Idempotent like any create.
    #[instrument(skip_all, name = "net.governance.provision_squad", fields(squad = %squad_slug))]
    pub async fn provision_squad_net(
        &self,
        actor: &GovernanceActor,
        squad_slug: &str,
    ) -> Option<VoiceNet> {
        let input = CreateNetInput {
            code: DEFAULT_SQUAD_NET_CODE.to_string(),
            label: format!("{squad_slug} tactical"),
            lifecycle_scope: RoomScope::Squad,
            discipline: None,
            priority: None,
            linked_scope_id: Some(squad_slug.to_string()),
            owner_member_id: None,
        };

        match tokio::time::timeout(self.fallback_timeout, self.create_net(actor, input)).await {
            Ok(outcome) if outcome.success => outcome.net,
            Ok(outcome) => {
                warn!(
                    target: "net.governance",
                    squad = %squad_slug,
                    error = ?outcome.error,
                    "Squad net provisioning skipped"
                );
                None
            }
            Err(_) => {
                warn!(
                    target: "net.governance",
                    squad = %squad_slug,
                    timeout_ms = self.fallback_timeout.as_millis() as u64,
                    "Squad net provisioning timed out, skipping"
                );
                None
            }
        }
    }

    async fn fetch_required(&self, id: &NetId) -> Result<VoiceNet, NetError> {
        self.store
            .fetch_net(id)
            .await?
            .ok_or_else(|| NetError::NotFound(format!("net {id}")))
    }

    fn require_mutable(&self, actor: &GovernanceActor, net: &VoiceNet) -> Result<(), NetError> {
        if net.status == NetStatus::Closed {
            return Err(NetError::PolicyBlocked {
                reason: "This net is closed; recreate it to reopen".to_string(),
            });
        }
        if !actor.can_mutate(net) {
            return Err(NetError::PolicyBlocked {
                reason: "Only the net owner or an administrator can modify this net".to_string(),
            });
        }
        Ok(())
    }
}

/// The single trim/lowercase/default-fill routine every returned net passes
/// through. Callers never see raw store shapes.
#[must_use]
pub fn normalize_net(mut net: VoiceNet) -> VoiceNet {
    net.code = net.code.trim().to_lowercase();
    net.label = net.label.trim().to_string();
    if net.label.is_empty() {
        net.label = net.code.to_uppercase();
    }
    if net.priority < 0 {
        net.priority = DEFAULT_NET_PRIORITY;
    }
    if let Some(linked) = net.linked_scope_id.take() {
        let trimmed = linked.trim().to_string();
        if !trimmed.is_empty() {
            net.linked_scope_id = Some(trimmed);
        }
    }
    net
}
