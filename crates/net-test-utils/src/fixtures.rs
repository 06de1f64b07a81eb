//! Ready-made entities for voice-net tests.

use chrono::Utc;
use common::types::{ClientId, MemberId, NetId};
use net_controller::governance::{
    GovernanceActor, MemberRank, NetStatus, VoiceNet,
};
use net_controller::identity::RoomScope;
use net_controller::policy::{Operation, OperationPermissions, OperationStatus};
use net_controller::presence::{PresenceRecord, PresenceStatus};

/// An operation with the usual command structure: created by `creator`,
/// owned by `owner`, commanded by `commander`.
#[must_use]
pub fn operation(status: OperationStatus) -> Operation {
    Operation {
        id: "op-abc123".into(),
        status,
        operation_type: "general".to_string(),
        created_by: "creator".into(),
        permissions: OperationPermissions {
            owner_ids: vec![MemberId::from("owner")],
            commander_ids: vec![MemberId::from("commander")],
        },
    }
}

/// A focused operation (push-to-talk nets).
#[must_use]
pub fn focused_operation(status: OperationStatus) -> Operation {
    let mut op = operation(status);
    op.operation_type = "focused".to_string();
    op
}

/// A plain member actor.
#[must_use]
pub fn member(id: &str) -> GovernanceActor {
    GovernanceActor {
        member_id: MemberId::from(id),
        rank: MemberRank::Member,
        is_admin: false,
    }
}

/// A founder-rank actor.
#[must_use]
pub fn founder(id: &str) -> GovernanceActor {
    GovernanceActor {
        member_id: MemberId::from(id),
        rank: MemberRank::Founder,
        is_admin: false,
    }
}

/// An administrator.
#[must_use]
pub fn admin(id: &str) -> GovernanceActor {
    GovernanceActor {
        member_id: MemberId::from(id),
        rank: MemberRank::Member,
        is_admin: true,
    }
}

/// An active op-scoped net owned by `owner`.
#[must_use]
pub fn active_net(code: &str, linked_scope_id: Option<&str>) -> VoiceNet {
    VoiceNet {
        id: NetId::new(),
        code: code.to_string(),
        label: format!("{} net", code.to_uppercase()),
        lifecycle_scope: RoomScope::Op,
        owner_member_id: Some(MemberId::from("owner")),
        status: NetStatus::Active,
        discipline: None,
        priority: 100,
        linked_scope_id: linked_scope_id.map(str::to_string),
        created_at: Utc::now(),
    }
}

/// A presence record whose activity timestamp is `age_secs` in the past.
#[must_use]
pub fn presence_record(actor: &str, client: &str, age_secs: i64) -> PresenceRecord {
    PresenceRecord {
        actor_id: MemberId::from(actor),
        client_id: ClientId::from(client),
        route: "/dashboard".to_string(),
        status: PresenceStatus::Online,
        last_activity_at: Utc::now() - chrono::Duration::seconds(age_secs),
    }
}
