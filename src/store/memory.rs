//! In-memory partner store
//!
//! Keeps records in insertion order so `find_by_parent` returns siblings in
//! the order they were registered. Used in dev mode when MongoDB is not
//! reachable, and as the store double in tests.

use tokio::sync::RwLock;

use super::{AccountStore, NewPartner, PartnerAccount, PartnerStore, StoreError};
use crate::hierarchy::{PartnerRecord, Role};

struct StoredPartner {
    record: PartnerRecord,
    email: String,
    password_hash: String,
}

/// Simple in-memory partner store
pub struct InMemoryPartnerStore {
    partners: RwLock<Vec<StoredPartner>>,
}

impl InMemoryPartnerStore {
    pub fn new() -> Self {
        Self {
            partners: RwLock::new(Vec::new()),
        }
    }

    /// Seed a store with credential-less records, kept in the given order
    pub fn with_records(records: impl IntoIterator<Item = PartnerRecord>) -> Self {
        let partners = records
            .into_iter()
            .map(|record| StoredPartner {
                record,
                email: String::new(),
                password_hash: String::new(),
            })
            .collect();
        Self {
            partners: RwLock::new(partners),
        }
    }

    /// Append a credential-less record
    pub async fn push(&self, record: PartnerRecord) {
        self.partners.write().await.push(StoredPartner {
            record,
            email: String::new(),
            password_hash: String::new(),
        });
    }

    pub async fn len(&self) -> usize {
        self.partners.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.partners.read().await.is_empty()
    }
}

impl Default for InMemoryPartnerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PartnerStore for InMemoryPartnerStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<PartnerRecord>, StoreError> {
        Ok(self
            .partners
            .read()
            .await
            .iter()
            .find(|p| p.record.id == id)
            .map(|p| p.record.clone()))
    }

    async fn find_by_parent(
        &self,
        role: Role,
        parent_key: &str,
    ) -> Result<Vec<PartnerRecord>, StoreError> {
        Ok(self
            .partners
            .read()
            .await
            .iter()
            .filter(|p| {
                p.record.role == role
                    && p.record.parent.as_ref().is_some_and(|parent| parent.id == parent_key)
            })
            .map(|p| p.record.clone())
            .collect())
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryPartnerStore {
    async fn find_account(
        &self,
        role: Role,
        linkage_key: &str,
    ) -> Result<Option<PartnerAccount>, StoreError> {
        Ok(self
            .partners
            .read()
            .await
            .iter()
            .find(|p| p.record.role == role && p.record.linkage_key == linkage_key)
            .map(|p| PartnerAccount {
                record: p.record.clone(),
                email: p.email.clone(),
                password_hash: p.password_hash.clone(),
            }))
    }

    async fn insert(&self, partner: NewPartner) -> Result<String, StoreError> {
        let mut partners = self.partners.write().await;

        let taken = partners
            .iter()
            .any(|p| p.record.role == partner.role && p.record.linkage_key == partner.linkage_key);
        if taken {
            return Err(StoreError::Conflict(format!(
                "{} {} already registered",
                partner.role, partner.linkage_key
            )));
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        partners.push(StoredPartner {
            record: PartnerRecord {
                id: id.clone(),
                name: partner.name,
                phone: partner.phone,
                role: partner.role,
                linkage_key: partner.linkage_key,
                parent: partner.parent,
            },
            email: partner.email,
            password_hash: partner.password_hash,
        });

        Ok(id)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
