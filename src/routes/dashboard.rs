//! Dashboard endpoints
//!
//! - GET /dashboard/{userType}/{id}            - hierarchy below a partner
//! - GET /dashboard/{userType}/{id}?insights=1 - hierarchy plus insights
//! - GET /dashboard/{userType}/{id}/insights   - insights only
//!
//! `userType` is a role name, percent-encoded ("universe%20fund"); `id` is the
//! partner's store id.

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use super::response::{crm_error_response, error_response, json_response, BoxBody};
use crate::hierarchy::{compute_insights, HierarchyError, HierarchyNode, InsightsReport, Role};
use crate::server::AppState;
use crate::types::CrmError;

/// Hierarchy tree with optional insights alongside the root's fields
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub hierarchy: HierarchyNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<InsightsReport>,
}

/// What a dashboard path asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub role: Role,
    pub id: String,
    pub view: DashboardView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Tree,
    TreeWithInsights,
    InsightsOnly,
}

/// Parse `/dashboard/{userType}/{id}[/insights]` and its query string
pub fn parse_dashboard_path(path: &str, query: Option<&str>) -> Result<DashboardRequest, CrmError> {
    let rest = path
        .strip_prefix("/dashboard/")
        .ok_or_else(|| CrmError::BadRequest("Not a dashboard path".into()))?;
    let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();

    let (user_type, id, insights_only) = match segments.as_slice() {
        [user_type, id] => (*user_type, *id, false),
        [user_type, id, "insights"] => (*user_type, *id, true),
        _ => {
            return Err(CrmError::BadRequest(
                "Expected /dashboard/{userType}/{id}".into(),
            ))
        }
    };

    let user_type = urlencoding::decode(user_type)
        .map_err(|e| CrmError::BadRequest(format!("Invalid userType encoding: {e}")))?;
    let role: Role = user_type
        .parse()
        .map_err(|e| CrmError::BadRequest(format!("{e}")))?;

    let id = urlencoding::decode(id)
        .map_err(|e| CrmError::BadRequest(format!("Invalid id encoding: {e}")))?
        .into_owned();
    if id.is_empty() {
        return Err(CrmError::BadRequest("Missing partner id".into()));
    }

    let view = if insights_only {
        DashboardView::InsightsOnly
    } else if wants_insights(query) {
        DashboardView::TreeWithInsights
    } else {
        DashboardView::Tree
    };

    Ok(DashboardRequest { role, id, view })
}

fn wants_insights(query: Option<&str>) -> bool {
    query
        .unwrap_or("")
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == "insights" && matches!(value, "true" | "1"))
}

/// Build the hierarchy and, if asked, its insights
pub async fn build_dashboard(
    state: &AppState,
    request: &DashboardRequest,
) -> Result<DashboardResponse, HierarchyError> {
    let hierarchy = state.builder.build(request.role, &request.id).await?;

    let insights = match request.view {
        DashboardView::Tree => None,
        DashboardView::TreeWithInsights | DashboardView::InsightsOnly => {
            Some(compute_insights(&hierarchy)?)
        }
    };

    Ok(DashboardResponse {
        hierarchy,
        insights,
    })
}

/// GET /dashboard/...
pub async fn handle_dashboard_request(
    state: Arc<AppState>,
    path: &str,
    query: Option<&str>,
) -> Response<BoxBody> {
    let request = match parse_dashboard_path(path, query) {
        Ok(r) => r,
        Err(e) => return crm_error_response(e),
    };

    match build_dashboard(&state, &request).await {
        Ok(DashboardResponse {
            insights: Some(insights),
            ..
        }) if request.view == DashboardView::InsightsOnly => json_response(StatusCode::OK, &insights),
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(HierarchyError::EmptyTree) => {
            error!(
                role = %request.role,
                id = %request.id,
                "Insights invariant violated: built tree counted no members"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
        Err(e) => crm_error_response(e.into()),
    }
}
