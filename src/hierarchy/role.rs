//! Partner role taxonomy
//!
//! Four ranked tiers, each owning exactly one tier below it:
//!
//! ```text
//! universe fund (0) → franchise (1) → sub-franchise (2) → channel-partner (3)
//! ```
//!
//! Roles travel over the wire as their canonical names, which are also the
//! `userType` values stored in the `users` collection.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Which attribute of a record identifies it to its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageField {
    UniverseFundId,
    UniqueId,
}

impl LinkageField {
    /// Attribute name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniverseFundId => "universeFundId",
            Self::UniqueId => "uniqueId",
        }
    }
}

/// A tier in the ownership hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    UniverseFund,
    Franchise,
    SubFranchise,
    ChannelPartner,
}

impl Role {
    /// All roles, ordered root first
    pub const ALL: [Role; 4] = [
        Role::UniverseFund,
        Role::Franchise,
        Role::SubFranchise,
        Role::ChannelPartner,
    ];

    /// Depth of this tier (universe fund = 0)
    pub fn rank(&self) -> u8 {
        match self {
            Self::UniverseFund => 0,
            Self::Franchise => 1,
            Self::SubFranchise => 2,
            Self::ChannelPartner => 3,
        }
    }

    /// Immediate child tier, or `None` for the terminal tier
    pub fn child_role(&self) -> Option<Role> {
        match self {
            Self::UniverseFund => Some(Self::Franchise),
            Self::Franchise => Some(Self::SubFranchise),
            Self::SubFranchise => Some(Self::ChannelPartner),
            Self::ChannelPartner => None,
        }
    }

    /// Immediate owning tier, or `None` for the root tier
    pub fn parent_role(&self) -> Option<Role> {
        match self {
            Self::UniverseFund => None,
            Self::Franchise => Some(Self::UniverseFund),
            Self::SubFranchise => Some(Self::Franchise),
            Self::ChannelPartner => Some(Self::SubFranchise),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.child_role().is_none()
    }

    /// Self-identifying attribute for records of this role
    pub fn linkage_field(&self) -> LinkageField {
        match self {
            Self::UniverseFund => LinkageField::UniverseFundId,
            _ => LinkageField::UniqueId,
        }
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniverseFund => "universe fund",
            Self::Franchise => "franchise",
            Self::SubFranchise => "sub-franchise",
            Self::ChannelPartner => "channel-partner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parses the canonical names, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_chain_reaches_terminal_in_three_hops() {
        let mut role = Role::UniverseFund;
        let mut hops = 0;
        while let Some(child) = role.child_role() {
            assert_eq!(child.rank(), role.rank() + 1);
            role = child;
            hops += 1;
        }
        assert_eq!(hops, 3);
        assert_eq!(role, Role::ChannelPartner);
        assert!(role.is_terminal());
    }

    #[test]
    fn test_parent_is_inverse_of_child() {
        for role in Role::ALL {
            if let Some(child) = role.child_role() {
                assert_eq!(child.parent_role(), Some(role));
            }
        }
        assert_eq!(Role::UniverseFund.parent_role(), None);
    }

    #[test]
    fn test_linkage_field() {
        assert_eq!(Role::UniverseFund.linkage_field(), LinkageField::UniverseFundId);
        assert_eq!(Role::Franchise.linkage_field(), LinkageField::UniqueId);
        assert_eq!(Role::ChannelPartner.linkage_field().as_str(), "uniqueId");
    }

    #[test]
    fn test_parse_is_case_insensitive_on_canonical_names() {
        assert_eq!("universe fund".parse::<Role>().unwrap(), Role::UniverseFund);
        assert_eq!(" Sub-Franchise ".parse::<Role>().unwrap(), Role::SubFranchise);
        assert_eq!("CHANNEL-PARTNER".parse::<Role>().unwrap(), Role::ChannelPartner);
    }

    #[test]
    fn test_parse_rejects_near_misses() {
        assert!("universe-fund".parse::<Role>().is_err());
        assert!("sub franchise".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Role::SubFranchise).unwrap();
        assert_eq!(json, "\"sub-franchise\"");

        let role: Role = serde_json::from_str("\"universe fund\"").unwrap();
        assert_eq!(role, Role::UniverseFund);

        assert!(serde_json::from_str::<Role>("\"customer\"").is_err());
    }

    #[test]
    fn test_ordering_follows_rank() {
        let mut roles = vec![Role::ChannelPartner, Role::UniverseFund, Role::SubFranchise];
        roles.sort();
        assert_eq!(
            roles,
            vec![Role::UniverseFund, Role::SubFranchise, Role::ChannelPartner]
        );
    }
}
