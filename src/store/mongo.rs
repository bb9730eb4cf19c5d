//! MongoDB-backed partner store

use bson::{doc, oid::ObjectId};
use tracing::{info, warn};

use super::{AccountStore, NewPartner, PartnerAccount, PartnerStore, StoreError};
use crate::db::schemas::{PartnerDoc, PARTNER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::hierarchy::{PartnerRecord, Role};

pub struct MongoPartnerStore {
    collection: MongoCollection<PartnerDoc>,
}

impl MongoPartnerStore {
    /// Open the partner collection, creating its indexes
    pub async fn new(client: &MongoClient) -> Result<Self, StoreError> {
        let collection = client.collection::<PartnerDoc>(PARTNER_COLLECTION).await?;
        info!(
            db = client.db_name(),
            collection = PARTNER_COLLECTION,
            "Partner collection ready"
        );
        Ok(Self { collection })
    }

    fn linkage_filter(role: Role, linkage_key: &str) -> bson::Document {
        let mut filter = doc! { "userType": role.as_str() };
        filter.insert(role.linkage_field().as_str(), linkage_key);
        filter
    }
}

#[async_trait::async_trait]
impl PartnerStore for MongoPartnerStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<PartnerRecord>, StoreError> {
        // Anything that is not an ObjectId cannot name a stored document
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        match self.collection.find_one(doc! { "_id": oid }).await? {
            Some(doc) => match doc.to_record() {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    warn!(id = %id, error = %e, "Stored partner is malformed");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn find_by_parent(
        &self,
        role: Role,
        parent_key: &str,
    ) -> Result<Vec<PartnerRecord>, StoreError> {
        let docs = self
            .collection
            .find_many(doc! { "userType": role.as_str(), "parentId": parent_key })
            .await?;

        Ok(docs
            .iter()
            .filter_map(|doc| match doc.to_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(role = %role, parent = %parent_key, error = %e, "Skipping malformed partner");
                    None
                }
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl AccountStore for MongoPartnerStore {
    async fn find_account(
        &self,
        role: Role,
        linkage_key: &str,
    ) -> Result<Option<PartnerAccount>, StoreError> {
        self.collection
            .find_one(Self::linkage_filter(role, linkage_key))
            .await?
            .map(|doc| doc.to_account())
            .transpose()
    }

    async fn insert(&self, partner: NewPartner) -> Result<String, StoreError> {
        if self.find_account(partner.role, &partner.linkage_key).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "{} {} already registered",
                partner.role, partner.linkage_key
            )));
        }

        let oid = self.collection.insert_one(PartnerDoc::new(partner)).await?;
        Ok(oid.to_hex())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
