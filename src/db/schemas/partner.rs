//! Partner document schema
//!
//! One document per partner in the `users` collection. Field names follow the
//! collection's existing camelCase layout (`userType`, `parentId`, ...).

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::hierarchy::{ParentRef, PartnerRecord, Role};
use crate::store::{NewPartner, PartnerAccount, StoreError};

/// Collection name for partners
pub const PARTNER_COLLECTION: &str = "users";

/// Partner document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    pub phone: String,

    #[serde(default)]
    pub email: String,

    /// Argon2 password hash
    pub password: String,

    /// Canonical role name
    pub user_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<String>,

    /// Linkage key for universe funds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_fund_id: Option<String>,

    /// Linkage key for every other role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
}

impl PartnerDoc {
    /// Create a document for a new partner
    pub fn new(partner: NewPartner) -> Self {
        let (universe_fund_id, unique_id) = match partner.role {
            Role::UniverseFund => (Some(partner.linkage_key), None),
            _ => (None, Some(partner.linkage_key)),
        };
        let (parent_id, parent_type) = match partner.parent {
            Some(parent) => (Some(parent.id), parent.role.map(|r| r.as_str().to_string())),
            None => (None, None),
        };

        Self {
            id: None,
            metadata: Metadata::new(),
            name: partner.name,
            phone: partner.phone,
            email: partner.email,
            password: partner.password_hash,
            user_type: partner.role.as_str().to_string(),
            parent_id,
            parent_type,
            universe_fund_id,
            unique_id,
        }
    }

    /// Convert to a domain record.
    ///
    /// Fails when the stored `userType` is unknown or the role's linkage key
    /// is missing.
    pub fn to_record(&self) -> Result<PartnerRecord, StoreError> {
        let id = self
            .id
            .map(|oid| oid.to_hex())
            .ok_or_else(|| StoreError::Invalid("document has no _id".into()))?;
        let role: Role = self
            .user_type
            .parse()
            .map_err(|e| StoreError::Invalid(format!("document {id}: {e}")))?;

        let linkage_key = match role {
            Role::UniverseFund => self.universe_fund_id.clone(),
            _ => self.unique_id.clone(),
        }
        .ok_or_else(|| {
            StoreError::Invalid(format!(
                "document {id}: missing {}",
                role.linkage_field().as_str()
            ))
        })?;

        let parent = match role {
            Role::UniverseFund => None,
            _ => self.parent_id.clone().map(|parent_id| ParentRef {
                id: parent_id,
                role: self.parent_type.as_deref().and_then(|t| t.parse().ok()),
            }),
        };

        Ok(PartnerRecord {
            id,
            name: self.name.clone(),
            phone: self.phone.clone(),
            role,
            linkage_key,
            parent,
        })
    }

    pub fn to_account(&self) -> Result<PartnerAccount, StoreError> {
        Ok(PartnerAccount {
            record: self.to_record()?,
            email: self.email.clone(),
            password_hash: self.password.clone(),
        })
    }
}

impl IntoIndexes for PartnerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Child lookups: find_by_parent
            (
                doc! { "userType": 1, "parentId": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_type_parent_index".to_string())
                        .build(),
                ),
            ),
            // Linkage keys are unique within a role
            (
                doc! { "userType": 1, "uniqueId": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "uniqueId": { "$exists": true } })
                        .name("user_type_unique_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "universeFundId": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "universeFundId": { "$exists": true } })
                        .name("universe_fund_id_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for PartnerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
