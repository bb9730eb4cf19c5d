//! Response helpers shared by the route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::types::CrmError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted JSON request body
const MAX_BODY_BYTES: usize = 10240;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-store")
        .body(full_body(json))
        .unwrap()
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: message.into(),
        },
    )
}

/// Map a service error to its HTTP response
pub fn crm_error_response(err: CrmError) -> Response<BoxBody> {
    let (status, message) = err.into_status_code_and_body();
    error_response(status, message)
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    error_response(StatusCode::NOT_FOUND, format!("No route for {path}"))
}

pub fn method_not_allowed() -> Response<BoxBody> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Read and decode a JSON body, refusing to buffer more than `MAX_BODY_BYTES`
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, CrmError>
where
    T: for<'de> Deserialize<'de>,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                CrmError::Http("Request body too large".into())
            } else {
                CrmError::Http(format!("Failed to read body: {}", e))
            }
        })?;

    serde_json::from_slice(&body.to_bytes())
        .map_err(|e| CrmError::Http(format!("Invalid JSON: {}", e)))
}
