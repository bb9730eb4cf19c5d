//! Partner CRM - hierarchy dashboard and account service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partner_crm::{
    config::Args,
    db::MongoClient,
    server::{self, AppState},
    store::{AccountStore, InMemoryPartnerStore, MongoPartnerStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    let json_logs = args.log_format == "json";
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("partner_crm={},info", log_level).into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Partner CRM");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
    info!(
        "Hierarchy fetches: {} concurrent, {}ms timeout",
        args.max_concurrent_fetches, args.store_timeout_ms
    );
    info!("CORS origins: {}", args.cors_origins);
    info!("======================================");

    // MongoDB is optional in dev mode
    let mongo_store = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => MongoPartnerStore::new(&client).await,
        Err(e) => Err(e),
    };

    let store: Arc<dyn AccountStore> = match mongo_store {
        Ok(store) => {
            info!("MongoDB connected successfully");
            Arc::new(store)
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB unavailable (dev mode, using in-memory store): {}", e);
            Arc::new(InMemoryPartnerStore::new())
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(args, store)?);

    tokio::select! {
        result = server::run(state) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
