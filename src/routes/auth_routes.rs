//! HTTP routes for partner accounts
//!
//! - POST /register - create a partner account
//! - POST /login    - authenticate and get a session token
//! - GET  /me       - describe the partner behind a session token

use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::response::{crm_error_response, json_response, parse_json_body, BoxBody};
use crate::auth::{
    extract_token_from_header, hash_password, verify_password, TokenInput, MIN_PASSWORD_LEN,
};
use crate::hierarchy::{ParentRef, Role};
use crate::server::AppState;
use crate::store::NewPartner;
use crate::types::CrmError;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Role name; `userType` is accepted when `role` is absent
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub universe_fund_id: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub universe_fund_id: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub password: String,
    pub user_type: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub name: String,
    pub user_type: Role,
    /// Owner's key, or the fund's own `universeFundId`
    pub parent_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: LoginUser,
    pub token: String,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub user_type: Role,
    pub linkage_key: String,
    pub expires_at: u64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// =============================================================================
// Operations
// =============================================================================

/// Validate a registration and turn it into a new partner (password unhashed)
fn validate_registration(body: RegisterRequest) -> Result<(NewPartner, String), CrmError> {
    if body.name.trim().is_empty() {
        return Err(CrmError::BadRequest("Name is required".into()));
    }
    if body.email.trim().is_empty() {
        return Err(CrmError::BadRequest("Email is required".into()));
    }
    if body.phone.trim().is_empty() {
        return Err(CrmError::BadRequest("Phone is required".into()));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(CrmError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let role_name = non_empty(body.role.or(body.user_type))
        .ok_or_else(|| CrmError::BadRequest("Role is required".into()))?;
    let role: Role = role_name
        .parse()
        .map_err(|e| CrmError::BadRequest(format!("{e}")))?;

    let (linkage_key, parent) = match role.parent_role() {
        None => {
            let universe_fund_id = non_empty(body.universe_fund_id)
                .ok_or_else(|| CrmError::BadRequest("Universe Fund ID is required".into()))?;
            (universe_fund_id, None)
        }
        Some(expected_parent) => {
            let (Some(unique_id), Some(parent_id), Some(parent_type)) = (
                non_empty(body.unique_id),
                non_empty(body.parent_id),
                non_empty(body.parent_type),
            ) else {
                return Err(CrmError::BadRequest(
                    "Unique ID, Parent ID, and Parent Type are required".into(),
                ));
            };

            let parent_role: Role = parent_type
                .parse()
                .map_err(|e| CrmError::BadRequest(format!("Parent Type: {e}")))?;
            if parent_role != expected_parent {
                return Err(CrmError::BadRequest(format!(
                    "A {role} must report to a {expected_parent}, not a {parent_role}"
                )));
            }

            (
                unique_id,
                Some(ParentRef {
                    id: parent_id,
                    role: Some(parent_role),
                }),
            )
        }
    };

    let partner = NewPartner {
        name: body.name.trim().to_string(),
        phone: body.phone.trim().to_string(),
        email: body.email.trim().to_string(),
        password_hash: String::new(),
        role,
        linkage_key,
        parent,
    };

    Ok((partner, body.password))
}

/// Register a partner; returns its store id
pub async fn register(state: &AppState, body: RegisterRequest) -> Result<String, CrmError> {
    let (mut partner, password) = validate_registration(body)?;
    partner.password_hash = hash_password(&password)?;

    let role = partner.role;
    let key = partner.linkage_key.clone();
    let id = state.store.insert(partner).await?;

    info!(role = %role, key = %key, id = %id, "Partner registered");
    Ok(id)
}

/// Check credentials and issue a session token
pub async fn login(state: &AppState, body: LoginRequest) -> Result<LoginResponse, CrmError> {
    let role: Role = body
        .user_type
        .parse()
        .map_err(|e| CrmError::BadRequest(format!("{e}")))?;

    let key = match role {
        Role::UniverseFund => non_empty(body.universe_fund_id),
        _ => non_empty(body.unique_id),
    }
    .ok_or_else(|| {
        CrmError::BadRequest(format!("{} is required", role.linkage_field().as_str()))
    })?;

    if body.password.is_empty() {
        return Err(CrmError::BadRequest("Password is required".into()));
    }

    let invalid = || CrmError::Unauthorized("Invalid credentials".into());

    let Some(account) = state.store.find_account(role, &key).await? else {
        warn!(role = %role, key = %key, "Login failed - account not found");
        return Err(invalid());
    };

    let password_valid = verify_password(&body.password, &account.password_hash).map_err(|e| {
        warn!(role = %role, key = %key, error = %e, "Password verification error");
        CrmError::Internal("Authentication error".into())
    })?;
    if !password_valid {
        warn!(role = %role, key = %key, "Login failed - invalid password");
        return Err(invalid());
    }

    let (token, expires_at) = state.jwt.generate_token(TokenInput {
        partner_id: account.record.id.clone(),
        role,
        linkage_key: key.clone(),
    })?;

    info!(role = %role, key = %key, "Login successful");

    Ok(LoginResponse {
        message: "Login successful".into(),
        user: LoginUser {
            id: account.record.id.clone(),
            name: account.record.name.clone(),
            user_type: role,
            parent_id: account.login_parent_id().to_string(),
        },
        token,
        expires_at,
    })
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /register
pub async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return crm_error_response(e),
    };

    match register(&state, body).await {
        Ok(_) => json_response(
            StatusCode::CREATED,
            &MessageResponse {
                message: "User registered successfully".into(),
            },
        ),
        Err(e) => crm_error_response(e),
    }
}

/// POST /login
pub async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return crm_error_response(e),
    };

    match login(&state, body).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => crm_error_response(e),
    }
}

/// GET /me
pub fn handle_me(auth_header: Option<&str>, state: &AppState) -> Response<BoxBody> {
    let Some(token) = extract_token_from_header(auth_header) else {
        return crm_error_response(CrmError::Unauthorized("Missing bearer token".into()));
    };

    match state.jwt.verify_token(token) {
        Ok(claims) => json_response(
            StatusCode::OK,
            &MeResponse {
                id: claims.sub,
                user_type: claims.role,
                linkage_key: claims.linkage_key,
                expires_at: claims.exp,
            },
        ),
        Err(e) => crm_error_response(e),
    }
}
