//! Database schemas
//!
//! Defines MongoDB document structures for partners.

mod metadata;
mod partner;

pub use metadata::Metadata;
pub use partner::{PartnerDoc, PARTNER_COLLECTION};
