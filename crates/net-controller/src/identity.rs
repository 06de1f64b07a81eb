//! Room identity codec.
//!
//! Every coordination channel gets a canonical, parseable room name of the
//! form `scope-[opId-][squadSlug-]net`, lowercase and hyphen-joined. Building
//! is pure and total; parsing is a best-effort inverse - the hyphen delimiter
//! is ambiguous when qualifier values themselves contain hyphens, so only
//! `scope` and `net` are guaranteed to round-trip.

use crate::errors::NetError;
use serde::{Deserialize, Serialize};

/// Scope a room is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomScope {
    /// Organization-wide room.
    Org,
    /// Squad room.
    Squad,
    /// Operation room.
    Op,
}

impl RoomScope {
    /// Canonical lowercase token used in room names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoomScope::Org => "org",
            RoomScope::Squad => "squad",
            RoomScope::Op => "op",
        }
    }

    /// Parse a scope token case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "org" => Some(RoomScope::Org),
            "squad" => Some(RoomScope::Squad),
            "op" => Some(RoomScope::Op),
            _ => None,
        }
    }
}

/// Structured identity of a communications room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomIdentity {
    pub scope: RoomScope,
    /// Net code. Uppercase after a parse, any case on input to a build.
    pub net: String,
    /// Operation qualifier, present for `Op`-scoped rooms.
    pub op_id: Option<String>,
    /// Squad qualifier, present for `Squad`-scoped rooms and optionally on
    /// `Op`-scoped rooms.
    pub squad_slug: Option<String>,
}

impl RoomIdentity {
    /// An organization-wide room identity.
    #[must_use]
    pub fn org(net: impl Into<String>) -> Self {
        Self {
            scope: RoomScope::Org,
            net: net.into(),
            op_id: None,
            squad_slug: None,
        }
    }

    /// A squad room identity.
    #[must_use]
    pub fn squad(net: impl Into<String>, squad_slug: impl Into<String>) -> Self {
        Self {
            scope: RoomScope::Squad,
            net: net.into(),
            op_id: None,
            squad_slug: Some(squad_slug.into()),
        }
    }

    /// An operation room identity.
    #[must_use]
    pub fn op(net: impl Into<String>, op_id: impl Into<String>) -> Self {
        Self {
            scope: RoomScope::Op,
            net: net.into(),
            op_id: Some(op_id.into()),
            squad_slug: None,
        }
    }

    /// Narrow an operation room to one squad.
    #[must_use]
    pub fn with_squad(mut self, squad_slug: impl Into<String>) -> Self {
        self.squad_slug = Some(squad_slug.into());
        self
    }

    /// Build the canonical room name: `scope-[opId-][squadSlug-]net`,
    /// every component lowercased.
    ///
    /// # Errors
    ///
    /// `InvalidIdentity` if the net code is empty or whitespace-only.
    pub fn canonical_name(&self) -> Result<String, NetError> {
        let net = self.net.trim().to_lowercase();
        if net.is_empty() {
            return Err(NetError::InvalidIdentity(
                "net code must not be empty".to_string(),
            ));
        }

        let mut parts = vec![self.scope.as_str().to_string()];
        if let Some(op_id) = normalized(self.op_id.as_deref()) {
            parts.push(op_id);
        }
        if let Some(squad_slug) = normalized(self.squad_slug.as_deref()) {
            parts.push(squad_slug);
        }
        parts.push(net);

        Ok(parts.join("-"))
    }

    /// Best-effort inverse of [`canonical_name`](Self::canonical_name).
    ///
    /// Returns `None` for fewer than two hyphen-separated tokens or an
    /// unknown scope token. The first token is the scope and the last the
    /// net (reported uppercase); qualifier recovery misattributes tokens
    /// when the original values contained hyphens.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let tokens: Vec<&str> = name.split('-').collect();
        if tokens.len() < 2 {
            return None;
        }

        let scope = RoomScope::from_token(tokens.first()?)?;
        let net = tokens.last()?.to_uppercase();
        if net.is_empty() {
            return None;
        }

        let (op_id, squad_slug) = match scope {
            RoomScope::Org => (None, None),
            RoomScope::Squad => {
                let slug = if tokens.len() >= 3 {
                    normalized(tokens.get(1).copied())
                } else {
                    None
                };
                (None, slug)
            }
            RoomScope::Op => {
                let op_id = if tokens.len() >= 3 {
                    normalized(tokens.get(1).copied())
                } else {
                    None
                };
                let slug = if tokens.len() >= 4 {
                    normalized(tokens.get(2).copied())
                } else {
                    None
                };
                (op_id, slug)
            }
        };

        Some(Self {
            scope,
            net,
            op_id,
            squad_slug,
        })
    }
}

/// Lowercase-trim an optional component, collapsing empty values to `None`.
fn normalized(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim().to_lowercase();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_org_room() {
        let name = RoomIdentity::org("Command").canonical_name().unwrap();
        assert_eq!(name, "org-command");
    }

    #[test]
    fn test_build_op_room_with_squad() {
        let name = RoomIdentity::op("LOGISTICS", "abc123")
            .with_squad("Alpha")
            .canonical_name()
            .unwrap();
        assert_eq!(name, "op-abc123-alpha-logistics");
    }

    #[test]
    fn test_build_rejects_empty_net() {
        let err = RoomIdentity::org("   ").canonical_name().unwrap_err();
        assert!(matches!(err, NetError::InvalidIdentity(_)));
    }

    #[test]
    fn test_build_skips_empty_qualifiers() {
        let mut identity = RoomIdentity::op("command", "  ");
        identity.squad_slug = Some(String::new());
        assert_eq!(identity.canonical_name().unwrap(), "op-command");
    }

    #[test]
    fn test_parse_recovers_scope_and_net() {
        // Property: parse(build(x)) recovers scope exactly and net uppercased
        for (identity, expected_scope) in [
            (RoomIdentity::org("command"), RoomScope::Org),
            (RoomIdentity::squad("tac1", "alpha"), RoomScope::Squad),
            (RoomIdentity::op("command", "abc123"), RoomScope::Op),
        ] {
            let name = identity.canonical_name().unwrap();
            let parsed = RoomIdentity::parse(&name).unwrap();
            assert_eq!(parsed.scope, expected_scope);
            assert_eq!(parsed.net, identity.net.to_uppercase());
        }
    }

    #[test]
    fn test_parse_op_scenario() {
        let name = RoomIdentity::op("COMMAND", "abc123")
            .canonical_name()
            .unwrap();
        assert_eq!(name, "op-abc123-command");

        let parsed = RoomIdentity::parse("op-abc123-command").unwrap();
        assert_eq!(parsed.scope, RoomScope::Op);
        assert_eq!(parsed.net, "COMMAND");
        assert_eq!(parsed.op_id.as_deref(), Some("abc123"));
        assert_eq!(parsed.squad_slug, None);
    }

    #[test]
    fn test_parse_op_with_squad() {
        let parsed = RoomIdentity::parse("op-abc123-alpha-logistics").unwrap();
        assert_eq!(parsed.op_id.as_deref(), Some("abc123"));
        assert_eq!(parsed.squad_slug.as_deref(), Some("alpha"));
        assert_eq!(parsed.net, "LOGISTICS");
    }

    #[test]
    fn test_parse_squad_room() {
        let parsed = RoomIdentity::parse("squad-alpha-tac1").unwrap();
        assert_eq!(parsed.scope, RoomScope::Squad);
        assert_eq!(parsed.squad_slug.as_deref(), Some("alpha"));
        assert_eq!(parsed.net, "TAC1");
    }

    #[test]
    fn test_parse_rejects_single_token() {
        assert_eq!(RoomIdentity::parse("command"), None);
    }

    #[test]
    fn test_parse_rejects_unknown_scope() {
        assert_eq!(RoomIdentity::parse("fleet-command"), None);
    }

    #[test]
    fn test_parse_rejects_empty_net_token() {
        assert_eq!(RoomIdentity::parse("org-"), None);
    }

    #[test]
    fn test_hyphenated_values_misattribute_but_keep_scope_and_net() {
        // Known ambiguity: an op id containing a hyphen bleeds into the
        // squad slot. Scope and net still round-trip.
        let name = RoomIdentity::op("command", "north-ridge")
            .canonical_name()
            .unwrap();
        assert_eq!(name, "op-north-ridge-command");

        let parsed = RoomIdentity::parse(&name).unwrap();
        assert_eq!(parsed.scope, RoomScope::Op);
        assert_eq!(parsed.net, "COMMAND");
        assert_eq!(parsed.op_id.as_deref(), Some("north"));
        assert_eq!(parsed.squad_slug.as_deref(), Some("ridge"));
    }

    #[test]
    fn test_build_is_side_effect_free_and_repeatable() {
        let identity = RoomIdentity::squad("TAC2", "bravo");
        assert_eq!(
            identity.canonical_name().unwrap(),
            identity.canonical_name().unwrap()
        );
    }
}
