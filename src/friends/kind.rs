//! Entity kinds and references
//!
//! `EntityKind` is the role discriminator for both accounts and the two ends
//! of a friend request. Connection lists are stored per counterparty kind,
//! so "which list to touch" is always a single dispatch on the *other*
//! side's kind rather than a branch over every (sender, receiver) pairing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::friends::FriendError;

/// Role discriminator: farmer or firm (buyer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Farmer,
    Firm,
}

impl EntityKind {
    /// Wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Firm => "firm",
        }
    }

    /// Collection holding entities of this kind
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Farmer => crate::db::schemas::FARMER_COLLECTION,
            Self::Firm => crate::db::schemas::FIRM_COLLECTION,
        }
    }

    /// Field naming the connection list that holds entities of this kind.
    /// An entity's connections to farmers live in `farmer_friends`, to firms
    /// in `firm_friends`, regardless of the entity's own kind.
    pub fn connection_field(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer_friends",
            Self::Firm => "firm_friends",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = FriendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farmer" => Ok(Self::Farmer),
            "firm" => Ok(Self::Firm),
            other => Err(FriendError::InvalidKind(other.to_string())),
        }
    }
}

/// An entity identity paired with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub kind: EntityKind,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("farmer".parse::<EntityKind>().unwrap(), EntityKind::Farmer);
        assert_eq!("firm".parse::<EntityKind>().unwrap(), EntityKind::Firm);
        assert!(matches!(
            "vendor".parse::<EntityKind>(),
            Err(FriendError::InvalidKind(_))
        ));
        // Case-sensitive, matching the wire contract
        assert!("Farmer".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_connection_field_follows_target_kind() {
        assert_eq!(EntityKind::Farmer.connection_field(), "farmer_friends");
        assert_eq!(EntityKind::Firm.connection_field(), "firm_friends");
    }
}
