//! Partner record store adapters
//!
//! The hierarchy engine only reads through [`PartnerStore`]. Registration and
//! login additionally need [`AccountStore`]. Two backends are provided:
//!
//! - [`memory::InMemoryPartnerStore`] - insertion-ordered, for dev mode and tests
//! - [`mongo::MongoPartnerStore`] - the `users` collection in MongoDB

pub mod memory;
pub mod mongo;

use crate::hierarchy::{ParentRef, PartnerRecord, Role};

pub use memory::InMemoryPartnerStore;
pub use mongo::MongoPartnerStore;

/// Errors raised by a store backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0}ms")]
    Timeout(u64),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Read-only access to partner records
#[async_trait::async_trait]
pub trait PartnerStore: Send + Sync {
    /// Look up a record by store id; `Ok(None)` when absent
    async fn find_by_id(&self, id: &str) -> Result<Option<PartnerRecord>, StoreError>;

    /// All records of `role` whose `parentId` is `parent_key`.
    ///
    /// Order is whatever the backend returns; may be empty.
    async fn find_by_parent(
        &self,
        role: Role,
        parent_key: &str,
    ) -> Result<Vec<PartnerRecord>, StoreError>;
}

/// Partner record plus credentials, as needed by login
#[derive(Debug, Clone)]
pub struct PartnerAccount {
    pub record: PartnerRecord,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

impl PartnerAccount {
    /// `parentId` as reported at login: the owner's key, or the fund's own id
    pub fn login_parent_id(&self) -> &str {
        match &self.record.parent {
            Some(parent) => &parent.id,
            None => &self.record.linkage_key,
        }
    }
}

/// A partner to be registered
#[derive(Debug, Clone)]
pub struct NewPartner {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub linkage_key: String,
    pub parent: Option<ParentRef>,
}

/// Registration and credential lookup
#[async_trait::async_trait]
pub trait AccountStore: PartnerStore {
    /// Look up an account by role and linkage key
    async fn find_account(
        &self,
        role: Role,
        linkage_key: &str,
    ) -> Result<Option<PartnerAccount>, StoreError>;

    /// Persist a new partner and return its store id.
    ///
    /// Fails with [`StoreError::Conflict`] when the linkage key is already
    /// taken within the role.
    async fn insert(&self, partner: NewPartner) -> Result<String, StoreError>;

    /// Backend name for health reporting
    fn backend(&self) -> &'static str;
}
