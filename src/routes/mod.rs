//! HTTP route handlers

pub mod auth_routes;
pub mod dashboard;
pub mod health;
pub mod response;

pub use auth_routes::{
    handle_login, handle_me, handle_register, login, register, LoginRequest, LoginResponse,
    RegisterRequest,
};
pub use dashboard::{
    build_dashboard, handle_dashboard_request, parse_dashboard_path, DashboardRequest,
    DashboardResponse, DashboardView,
};
pub use health::{health_check, version_info};
pub use response::{
    crm_error_response, empty_body, error_response, json_response, method_not_allowed,
    not_found_response, BoxBody,
};
