//! Partner CRM - ownership hierarchy service
//!
//! Partners form a strict four-tier ownership hierarchy:
//! universe fund → franchise → sub-franchise → channel-partner.
//!
//! ## Services
//!
//! - **Hierarchy**: rebuilds the subtree below any partner from flat store records
//! - **Insights**: member counts, role distribution and depth over a subtree
//! - **Accounts**: registration and login backed by MongoDB (or memory in dev mode)
//! - **Dashboard**: HTTP surface for the above

pub mod auth;
pub mod config;
pub mod db;
pub mod hierarchy;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use hierarchy::{
    compute_insights, BuilderConfig, HierarchyBuilder, HierarchyError, HierarchyNode,
    InsightsReport, Role,
};
pub use server::{run, AppState};
pub use types::{CrmError, Result};
