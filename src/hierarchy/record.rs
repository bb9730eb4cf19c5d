//! Flat partner records as returned by the record store

use super::role::{LinkageField, Role};

/// Reference from a record to its owner one tier up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Owner's linkage key (`universeFundId` or `uniqueId`)
    pub id: String,
    /// Owner's declared role; `None` when the stored value is missing or unknown
    pub role: Option<Role>,
}

/// One partner as stored, stripped of credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerRecord {
    /// Store-assigned identifier
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
    /// Value of the role's linkage field; children reference it as `parentId`
    pub linkage_key: String,
    /// `None` for universe funds
    pub parent: Option<ParentRef>,
}

impl PartnerRecord {
    /// Build a universe fund record
    pub fn universe_fund(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        universe_fund_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            role: Role::UniverseFund,
            linkage_key: universe_fund_id.into(),
            parent: None,
        }
    }

    /// Build a record below the root tier, owned by `parent_id` of the
    /// role's parent tier
    pub fn member(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        role: Role,
        unique_id: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            role,
            linkage_key: unique_id.into(),
            parent: Some(ParentRef {
                id: parent_id.into(),
                role: role.parent_role(),
            }),
        }
    }

    pub fn linkage_field(&self) -> LinkageField {
        self.role.linkage_field()
    }

    /// Whether this record declares `parent_key` of `parent_role` as its owner.
    ///
    /// A missing declared parent role is accepted; a declared role that
    /// disagrees is not.
    pub fn is_owned_by(&self, parent_role: Role, parent_key: &str) -> bool {
        match &self.parent {
            Some(parent) => {
                parent.id == parent_key && parent.role.map_or(true, |r| r == parent_role)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_declares_parent_role_from_taxonomy() {
        let record = PartnerRecord::member("1", "Ana", "555", Role::SubFranchise, "S1", "F1");
        let parent = record.parent.as_ref().unwrap();
        assert_eq!(parent.role, Some(Role::Franchise));
        assert!(record.is_owned_by(Role::Franchise, "F1"));
        assert!(!record.is_owned_by(Role::Franchise, "F2"));
        assert!(!record.is_owned_by(Role::UniverseFund, "F1"));
    }

    #[test]
    fn test_universe_fund_has_no_owner() {
        let record = PartnerRecord::universe_fund("1", "Fund", "555", "UF1");
        assert_eq!(record.linkage_field(), LinkageField::UniverseFundId);
        assert!(!record.is_owned_by(Role::UniverseFund, "UF1"));
    }

    #[test]
    fn test_missing_parent_role_is_accepted() {
        let mut record = PartnerRecord::member("1", "Ana", "555", Role::Franchise, "F1", "UF1");
        if let Some(parent) = record.parent.as_mut() {
            parent.role = None;
        }
        assert!(record.is_owned_by(Role::UniverseFund, "UF1"));
    }
}
