//! Hierarchy resolution and insights
//!
//! - [`role`]: the four-tier role taxonomy
//! - [`builder`]: rebuilds a partner's subtree from the record store
//! - [`insights`]: counts, distribution and depth over a built tree

pub mod builder;
pub mod insights;
pub mod node;
pub mod record;
pub mod role;

pub use builder::{BuilderConfig, HierarchyBuilder};
pub use insights::{compute_insights, count_by_role, hierarchy_depth, InsightsReport, RoleShare};
pub use node::HierarchyNode;
pub use record::{ParentRef, PartnerRecord};
pub use role::{LinkageField, Role, UnknownRole};

use crate::store::StoreError;

/// Errors from building or summarizing a hierarchy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// The root id does not name a partner of the requested role
    #[error("partner not found: {0}")]
    NotFound(String),

    /// A store call failed or timed out; the build was abandoned
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("insights requested over an empty tree")]
    EmptyTree,
}

impl From<StoreError> for HierarchyError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
