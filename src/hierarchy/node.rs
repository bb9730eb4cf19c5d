//! In-memory hierarchy tree
//!
//! Nodes own their children outright and keep no reference to their parent.
//! Serialized shape (what the dashboard renders):
//!
//! ```json
//! { "id": "...", "name": "...", "phone": "...", "userType": "franchise",
//!   "uniqueId": "F1", "children": [ ... ] }
//! ```
//!
//! Universe funds carry `universeFundId` in place of `uniqueId`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::record::PartnerRecord;
use super::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    /// Store-assigned identifier
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
    pub linkage_key: String,
    /// In store return order
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Wrap a record as a childless node
    pub fn from_record(record: PartnerRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            phone: record.phone,
            role: record.role,
            linkage_key: record.linkage_key,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, self included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::node_count).sum::<usize>()
    }

    /// Pre-order walk over this subtree
    pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Find a node in this subtree by linkage key
    pub fn find(&self, linkage_key: &str) -> Option<&HierarchyNode> {
        self.iter().find(|node| node.linkage_key == linkage_key)
    }
}

impl Serialize for HierarchyNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("phone", &self.phone)?;
        map.serialize_entry("userType", &self.role)?;
        map.serialize_entry(self.role.linkage_field().as_str(), &self.linkage_key)?;
        map.serialize_entry("children", &self.children)?;
        map.end()
    }
}
