//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per
//! connection; a request's handler future is dropped if the client goes away,
//! which abandons any hierarchy fetches still in flight.

use hyper::body::Incoming;
use hyper::header::{HeaderValue, VARY};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::hierarchy::HierarchyBuilder;
use crate::routes::{self, empty_body, BoxBody};
use crate::store::{AccountStore, InMemoryPartnerStore};
use crate::types::CrmError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Partner records and credentials
    pub store: Arc<dyn AccountStore>,
    /// Hierarchy builder over `store`
    pub builder: HierarchyBuilder<dyn AccountStore>,
    pub jwt: JwtValidator,
    pub started_at: Instant,
}

impl AppState {
    /// Create state over an existing store
    pub fn new(args: Args, store: Arc<dyn AccountStore>) -> Result<Self, CrmError> {
        let jwt = match &args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), args.jwt_expiry_seconds)?,
            None if args.dev_mode => {
                warn!("No JWT_SECRET set - using development secret");
                JwtValidator::new_dev()
            }
            None => {
                return Err(CrmError::Config(
                    "JWT_SECRET is required in production mode".into(),
                ))
            }
        };

        let builder = HierarchyBuilder::new(Arc::clone(&store), args.builder_config());

        Ok(Self {
            args,
            store,
            builder,
            jwt,
            started_at: Instant::now(),
        })
    }

    /// Create state over an empty in-memory store
    pub fn in_memory(args: Args) -> Result<Self, CrmError> {
        Self::new(args, Arc::new(InMemoryPartnerStore::new()))
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), CrmError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Partner CRM listening on {} (store: {})",
        state.args.listen,
        state.store.backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let origin = header_value(&req, "origin");

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => preflight_response(),

        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        (Method::GET, "/version") => routes::version_info(),

        (Method::POST, "/register") => routes::handle_register(req, Arc::clone(&state)).await,

        (Method::POST, "/login") => routes::handle_login(req, Arc::clone(&state)).await,

        (Method::GET, "/me") => {
            let auth = header_value(&req, "authorization");
            routes::handle_me(auth.as_deref(), &state)
        }

        (Method::GET, p) if p.starts_with("/dashboard/") => {
            routes::handle_dashboard_request(Arc::clone(&state), p, query.as_deref()).await
        }

        (_, "/register") | (_, "/login") | (_, "/me") | (_, "/health") | (_, "/version") => {
            routes::method_not_allowed()
        }

        (_, p) if p.starts_with("/dashboard/") => routes::method_not_allowed(),

        _ => routes::not_found_response(&path),
    };

    Ok(with_cors(response, &state.args, origin.as_deref()))
}

fn header_value(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// CORS preflight response
fn preflight_response() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Max-Age", "600")
        .body(empty_body())
        .unwrap()
}

/// Echo the caller's origin when it is configured as allowed
fn with_cors(mut response: Response<BoxBody>, args: &Args, origin: Option<&str>) -> Response<BoxBody> {
    let Some(allowed) = args.allowed_origin(origin) else {
        return response;
    };
    let Ok(value) = HeaderValue::from_str(&allowed) else {
        return response;
    };

    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", value);
    if allowed != "*" {
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    response
}
