//! Integration tests for registration, login and the dashboard
//!
//! Runs the route operations against an in-memory application state.

use clap::Parser;
use partner_crm::routes::{
    build_dashboard, login, parse_dashboard_path, register, DashboardView, LoginRequest,
    RegisterRequest,
};
use partner_crm::{AppState, Args, CrmError, Role};
use tokio_test::{assert_err, assert_ok};

fn dev_state() -> AppState {
    let args = Args::parse_from(["partner-crm", "--dev-mode"]);
    AppState::in_memory(args).unwrap()
}

fn registration(role: &str, key: &str, parent: Option<(&str, &str)>) -> RegisterRequest {
    let (parent_id, parent_type) = match parent {
        Some((id, role)) => (Some(id.to_string()), Some(role.to_string())),
        None => (None, None),
    };
    let is_fund = parent.is_none();

    RegisterRequest {
        name: format!("Partner {key}"),
        phone: "555-0199".into(),
        email: format!("{}@example.com", key.to_lowercase()),
        password: format!("pw-{key}"),
        role: Some(role.into()),
        universe_fund_id: is_fund.then(|| key.to_string()),
        unique_id: (!is_fund).then(|| key.to_string()),
        parent_id,
        parent_type,
        ..Default::default()
    }
}

async fn seed_chain(state: &AppState) -> String {
    let fund_id = register(state, registration("universe fund", "UF1", None))
        .await
        .unwrap();
    register(
        state,
        registration("franchise", "F1", Some(("UF1", "universe fund"))),
    )
    .await
    .unwrap();
    register(
        state,
        registration("sub-franchise", "S1", Some(("F1", "franchise"))),
    )
    .await
    .unwrap();
    register(
        state,
        registration("channel-partner", "C1", Some(("S1", "sub-franchise"))),
    )
    .await
    .unwrap();
    fund_id
}

#[tokio::test]
async fn test_register_then_login() {
    let state = dev_state();
    seed_chain(&state).await;

    let response = assert_ok!(
        login(
            &state,
            LoginRequest {
                unique_id: Some("S1".into()),
                password: "pw-S1".into(),
                user_type: "sub-franchise".into(),
                ..Default::default()
            },
        )
        .await
    );

    assert_eq!(response.user.user_type, Role::SubFranchise);
    assert_eq!(response.user.parent_id, "F1");

    let claims = state.jwt.verify_token(&response.token).unwrap();
    assert_eq!(claims.sub, response.user.id);
    assert_eq!(claims.linkage_key, "S1");
    assert_eq!(claims.exp, response.expires_at);
}

#[tokio::test]
async fn test_universe_fund_login_reports_own_id() {
    let state = dev_state();
    seed_chain(&state).await;

    let response = login(
        &state,
        LoginRequest {
            universe_fund_id: Some("UF1".into()),
            password: "pw-UF1".into(),
            user_type: "universe fund".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.user.parent_id, "UF1");
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let state = dev_state();
    seed_chain(&state).await;

    let wrong_password = login(
        &state,
        LoginRequest {
            unique_id: Some("F1".into()),
            password: "not-it".into(),
            user_type: "franchise".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(CrmError::Unauthorized(_))));

    // Right key, wrong role
    let wrong_role = login(
        &state,
        LoginRequest {
            unique_id: Some("F1".into()),
            password: "pw-F1".into(),
            user_type: "sub-franchise".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(wrong_role, Err(CrmError::Unauthorized(_))));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let state = dev_state();
    seed_chain(&state).await;

    let again = register(
        &state,
        registration("franchise", "F1", Some(("UF1", "universe fund"))),
    )
    .await;
    assert!(matches!(again, Err(CrmError::Conflict(_))));

    // The same key under another role is a different partner
    assert_ok!(
        register(
            &state,
            registration("sub-franchise", "F1", Some(("F1", "franchise"))),
        )
        .await
    );
}

#[tokio::test]
async fn test_wrong_parent_tier_is_rejected() {
    let state = dev_state();

    let result = register(
        &state,
        registration("channel-partner", "C1", Some(("F1", "franchise"))),
    )
    .await;
    assert_err!(&result);
    assert_eq!(result.unwrap_err().status_code(), 400);
}

#[tokio::test]
async fn test_dashboard_for_registered_network() {
    let state = dev_state();
    let fund_id = seed_chain(&state).await;

    let path = format!("/dashboard/universe%20fund/{fund_id}");
    let request = parse_dashboard_path(&path, Some("insights=true")).unwrap();
    assert_eq!(request.view, DashboardView::TreeWithInsights);

    let dashboard = build_dashboard(&state, &request).await.unwrap();
    let json = serde_json::to_value(&dashboard).unwrap();

    assert_eq!(json["universeFundId"], "UF1");
    assert_eq!(json["children"][0]["uniqueId"], "F1");
    assert_eq!(json["insights"]["totalMembers"], 4);
    assert_eq!(json["insights"]["hierarchyDepth"], 3);
    assert_eq!(json["insights"]["hierarchyLevels"], 4);
    assert_eq!(json["insights"]["distribution"][3]["role"], "channel-partner");
}

#[tokio::test]
async fn test_dashboard_role_mismatch_is_not_found() {
    let state = dev_state();
    let fund_id = seed_chain(&state).await;

    let path = format!("/dashboard/franchise/{fund_id}");
    let request = parse_dashboard_path(&path, None).unwrap();

    let err: CrmError = build_dashboard(&state, &request).await.unwrap_err().into();
    assert_eq!(err.status_code(), 404);
}
