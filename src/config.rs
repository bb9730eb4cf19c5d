//! Configuration for the CRM service
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::hierarchy::BuilderConfig;

/// Partner CRM - ownership hierarchy and dashboard service
#[derive(Parser, Debug, Clone)]
#[command(name = "partner-crm")]
#[command(about = "Partner hierarchy, insights and account service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "crm")]
    pub mongodb_db: String,

    /// Enable development mode (in-memory store fallback, dev JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for session tokens (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Timeout for a single record store call, in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "5000")]
    pub store_timeout_ms: u64,

    /// Store calls in flight at once during one hierarchy build
    #[arg(long, env = "MAX_CONCURRENT_FETCHES", default_value = "8")]
    pub max_concurrent_fetches: usize,

    /// Comma-separated list of allowed CORS origins ("*" allows any)
    #[arg(long, env = "CORS_ORIGINS", default_value = "http://localhost:3000")]
    pub cors_origins: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Hierarchy builder settings derived from the arguments
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            fetch_timeout: Duration::from_millis(self.store_timeout_ms),
            max_concurrent_fetches: self.max_concurrent_fetches,
        }
    }

    /// Allowed CORS origins
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Value for `Access-Control-Allow-Origin`, if `origin` may call us
    pub fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        let origins = self.cors_origin_list();
        if origins.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        let origin = origin?;
        origins.into_iter().find(|o| o == origin)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if let Some(secret) = &self.jwt_secret {
            if secret.len() < 32 {
                return Err("JWT_SECRET must be at least 32 characters".to_string());
            }
        }

        if self.max_concurrent_fetches == 0 {
            return Err("MAX_CONCURRENT_FETCHES must be at least 1".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be at least 1".to_string());
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(format!("LOG_FORMAT must be text or json, got {}", self.log_format));
        }

        Ok(())
    }
}
