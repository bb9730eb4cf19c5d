//! Health and version endpoints
//!
//! - /health, /healthz - liveness, with the store backend in use
//! - /version          - build information for deployment verification

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// "mongodb" or "memory"
    pub store: &'static str,
    /// Seconds since the server state was created
    pub uptime: u64,
    pub mode: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.backend(),
        uptime: state.started_at.elapsed().as_secs(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// GET /health
pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}

/// GET /version
pub fn version_info() -> Response<BoxBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "partner-crm",
    };

    json_response(StatusCode::OK, &response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use clap::Parser;

    #[test]
    fn test_health_reports_memory_store() {
        let args = Args::parse_from(["partner-crm", "--dev-mode"]);
        let state = AppState::in_memory(args).unwrap();

        let health = build_health_response(&state);
        assert!(health.healthy);
        assert_eq!(health.store, "memory");
        assert_eq!(health.mode, "development");
    }
}
