//! Operation stage policy.
//!
//! The single authority for what an actor may do to an operation at each
//! lifecycle stage. Every caller queries this table; no other module
//! re-derives rank comparisons or special-cases lifecycle gating.
//!
//! | Status   | plan    | requirements | roster  | comms | lifecycle |
//! |----------|---------|--------------|---------|-------|-----------|
//! | Planning | all     | all          | all     | all   | command   |
//! | Active   | command | command      | all     | all   | command   |
//! | Wrapping | command | command      | command | all   | command   |
//! | Archived | none    | none         | none    | none  | none      |

use common::types::{MemberId, OperationId};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Planning,
    Active,
    Wrapping,
    Archived,
}

/// Explicit command grants on an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPermissions {
    #[serde(default)]
    pub owner_ids: Vec<MemberId>,
    #[serde(default)]
    pub commander_ids: Vec<MemberId>,
}

/// The slice of a stored operation this layer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub status: OperationStatus,
    /// Free-form operation type; `focused` implies push-to-talk nets.
    pub operation_type: String,
    pub created_by: MemberId,
    #[serde(default)]
    pub permissions: OperationPermissions,
}

impl Operation {
    /// Whether `actor_id` holds command authority on this operation:
    /// the creator, an owner, or a commander.
    #[must_use]
    pub fn is_command_role(&self, actor_id: &MemberId) -> bool {
        self.created_by == *actor_id
            || self.permissions.owner_ids.contains(actor_id)
            || self.permissions.commander_ids.contains(actor_id)
    }
}

/// Derived permission set for one `(operation, actor)` pair.
///
/// Recomputed on every query; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePolicy {
    pub is_command_role: bool,
    pub can_change_lifecycle: bool,
    pub can_edit_plan: bool,
    pub can_edit_requirements: bool,
    pub can_manage_roster: bool,
    pub can_post_comms: bool,
    /// Explains the restriction to actors the current stage limits.
    pub banner_text: Option<String>,
}

/// Derive the stage policy for an actor on an operation.
#[must_use]
pub fn stage_policy(operation: &Operation, actor_id: &MemberId) -> StagePolicy {
    let command = operation.is_command_role(actor_id);

    match operation.status {
        OperationStatus::Planning => StagePolicy {
            is_command_role: command,
            can_change_lifecycle: command,
            can_edit_plan: true,
            can_edit_requirements: true,
            can_manage_roster: true,
            can_post_comms: true,
            banner_text: None,
        },
        OperationStatus::Active => StagePolicy {
            is_command_role: command,
            can_change_lifecycle: command,
            can_edit_plan: command,
            can_edit_requirements: command,
            can_manage_roster: true,
            can_post_comms: true,
            banner_text: if command {
                None
            } else {
                Some(
                    "This operation is active. Plan and requirements can only be \
                     edited by command staff."
                        .to_string(),
                )
            },
        },
        OperationStatus::Wrapping => StagePolicy {
            is_command_role: command,
            can_change_lifecycle: command,
            can_edit_plan: command,
            can_edit_requirements: command,
            can_manage_roster: command,
            can_post_comms: true,
            banner_text: if command {
                None
            } else {
                Some(
                    "This operation is wrapping up. Only comms remain open; \
                     everything else is limited to command staff."
                        .to_string(),
                )
            },
        },
        OperationStatus::Archived => StagePolicy {
            is_command_role: command,
            can_change_lifecycle: false,
            can_edit_plan: false,
            can_edit_requirements: false,
            can_manage_roster: false,
            can_post_comms: false,
            banner_text: Some("This operation is archived and read-only.".to_string()),
        },
    }
}
