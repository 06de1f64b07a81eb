//! Net discipline resolver.
//!
//! Whether a net runs push-to-talk or open mic is derived from the operation
//! type, with a per-net override that only governance may write (founder rank
//! or administrator, enforced by the governance update action). There is no
//! hidden state here: discipline is recomputed on every query from the net's
//! stored override if set, else from the operation type.

use serde::{Deserialize, Serialize};

/// Operation type that demands strict floor control.
pub const FOCUSED_OPERATION_TYPE: &str = "focused";

/// Transmission discipline of a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetDiscipline {
    /// Push-to-talk: a speaker must explicitly acquire the floor.
    Ptt,
    /// Open mic: any participant may transmit.
    OpenMic,
}

/// Derive the discipline for an operation type.
///
/// `focused` operations get push-to-talk; every other type gets open mic.
#[must_use]
pub fn derive_discipline(operation_type: &str) -> NetDiscipline {
    if operation_type.trim().eq_ignore_ascii_case(FOCUSED_OPERATION_TYPE) {
        NetDiscipline::Ptt
    } else {
        NetDiscipline::OpenMic
    }
}

/// Resolve the discipline a net actually runs under: the stored per-net
/// override when set, else the derivation from the operation type.
#[must_use]
pub fn effective_discipline(
    stored: Option<NetDiscipline>,
    operation_type: &str,
) -> NetDiscipline {
    stored.unwrap_or_else(|| derive_discipline(operation_type))
}
