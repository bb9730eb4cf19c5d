//! Shared types for the CRM service

mod error;

pub use error::{CrmError, Result};
